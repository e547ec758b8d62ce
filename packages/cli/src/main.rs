use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use common::storage::FilesystemBlobStore;
use resources::config::AppConfig;
use resources::database::init_db;
use resources::persistence::SeaOrmPersistence;
use resources::{Owner, PendingUpload, Resource, ResourceStore};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resources", version, about = "Manage files attached to owner entities")]
struct Cli {
    /// Config file, without extension. Defaults to $RESOURCES_CONFIG or config/config.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override `storage.root`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Override `database.url`.
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct OwnerArgs {
    /// Owner type name, e.g. "User".
    #[arg(long)]
    model: String,
    #[arg(long)]
    owner_id: i32,
    /// Owner slot, e.g. "avatar".
    #[arg(long)]
    attribute: String,
}

impl From<OwnerArgs> for Owner {
    fn from(args: OwnerArgs) -> Self {
        Owner::new(args.model, args.owner_id, args.attribute)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Store a file as a new resource.
    Add {
        #[command(flatten)]
        owner: OwnerArgs,
        /// Resource name. Defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Guessed from the name when omitted.
        #[arg(long)]
        mime_type: Option<String>,
        /// Id of the uploading user.
        #[arg(long)]
        user: Option<i32>,
        /// Move the file into storage instead of copying it.
        #[arg(long = "move")]
        move_file: bool,
        file: PathBuf,
    },
    /// Print a resource's metadata.
    Show { id: i32 },
    /// Write a resource's content to stdout.
    Cat { id: i32 },
    /// List the resources attached to one owner slot.
    List {
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Delete a resource and its file.
    Rm { id: i32 },
}

/// JSON view of a resource.
#[derive(Serialize)]
struct ResourceView<'a> {
    id: Option<i32>,
    owner_model: &'a str,
    owner_id: i32,
    owner_attribute: &'a str,
    name: &'a str,
    description: Option<&'a str>,
    path: Option<&'a str>,
    mime_type: &'a str,
    size: Option<i64>,
    user_id: Option<i32>,
    time_added: Option<i64>,
}

impl<'a> From<&'a Resource> for ResourceView<'a> {
    fn from(res: &'a Resource) -> Self {
        Self {
            id: res.id(),
            owner_model: &res.owner.model,
            owner_id: res.owner.id,
            owner_attribute: &res.owner.attribute,
            name: &res.name,
            description: res.description.as_deref(),
            path: res.path(),
            mime_type: &res.mime_type,
            size: res.size,
            user_id: res.user_id,
            time_added: res.time_added(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("Failed to load config")?;
    if let Some(root) = cli.root {
        config.storage.root = root;
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let store = open_store(&config).await?;
    run(cli.command, &store).await
}

async fn open_store(config: &AppConfig) -> Result<ResourceStore> {
    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    let blobs = FilesystemBlobStore::new(config.storage.root.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to open storage root {}",
                config.storage.root.display()
            )
        })?;

    info!(root = %config.storage.root.display(), "Storage ready");
    Ok(ResourceStore::new(
        Arc::new(SeaOrmPersistence::new(db)),
        Arc::new(blobs),
    ))
}

async fn run(command: Command, store: &ResourceStore) -> Result<()> {
    match command {
        Command::Add {
            owner,
            name,
            description,
            mime_type,
            user,
            move_file,
            file,
        } => {
            let name = match name {
                Some(name) => name,
                None => file_name(&file)?,
            };

            let mut res = if move_file {
                let upload = PendingUpload::from_path(&file, name)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                Resource::from_pending_upload(upload)
            } else {
                let bytes = tokio::fs::read(&file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let mut res = Resource::new();
                res.name = name;
                res.set_content(bytes);
                res
            };
            res.owner = owner.into();
            res.description = description;
            if let Some(mime_type) = mime_type {
                res.mime_type = mime_type;
            }

            let outcome = store.save(&mut res, &user).await?;
            if !outcome.content_saved() {
                warn!(id = outcome.id, "Metadata saved but file content was not written");
            }
            print_json(&ResourceView::from(&res))
        }
        Command::Show { id } => {
            let res = find(store, id).await?;
            print_json(&ResourceView::from(&res))
        }
        Command::Cat { id } => {
            let mut res = find(store, id).await?;
            let bytes = store.read_content(&mut res).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(bytes).await?;
            stdout.flush().await?;
            Ok(())
        }
        Command::List { owner } => {
            let found = store.find_by_owner(&owner.into()).await?;
            let views: Vec<ResourceView> = found.iter().map(ResourceView::from).collect();
            print_json(&views)
        }
        Command::Rm { id } => {
            let removed_file = store.delete_by_id(id).await?;
            info!(id, removed_file, "Resource removed");
            Ok(())
        }
    }
}

async fn find(store: &ResourceStore, id: i32) -> Result<Resource> {
    match store.find(id).await? {
        Some(res) => Ok(res),
        None => bail!("Resource {id} not found"),
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .with_context(|| format!("Cannot take a resource name from {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
