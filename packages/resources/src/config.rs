use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::StorageConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL. Default: "sqlite://./data/resources.db?mode=rwc".
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Connection pool size. Default: 5.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite://./data/resources.db?mode=rwc".into()
}
fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Defaults, then `config/config.*` (or `$RESOURCES_CONFIG`), then
    /// `RESOURCES__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("RESOURCES_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("storage.root", "./data/resources")?
            .set_default("database.url", default_database_url())?
            .set_default("database.max_connections", 5_i64)?
            .add_source(File::with_name(config_path).required(false))
            // Override from environment (e.g., RESOURCES__STORAGE__ROOT)
            .add_source(Environment::with_prefix("RESOURCES").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let config = AppConfig::load_from("definitely/not/here").unwrap();
        assert_eq!(config.storage.root, PathBuf::from("./data/resources"));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("resources.toml");
        std::fs::write(
            &file,
            "[storage]\nroot = \"/var/lib/resources\"\n\n[database]\nurl = \"sqlite::memory:\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(file.to_str().unwrap()).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/var/lib/resources"));
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 5);
    }
}
