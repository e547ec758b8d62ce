pub mod config;
pub mod context;
pub mod database;
pub mod entity;
pub mod error;
pub mod path;
pub mod persistence;
pub mod resource;
pub mod store;
pub mod upload;

pub use context::{Clock, CurrentActor, FixedClock, Guest, SystemClock};
pub use error::{PersistenceError, ResourceError};
pub use resource::{Content, ContentValue, Owner, Resource};
pub use store::{ContentWrite, ResourceStore, SaveOutcome};
pub use upload::PendingUpload;
