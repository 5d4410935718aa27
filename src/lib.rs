//! Per-directory environment variable storage.
//!
//! A directory reference is first turned into a [`CanonicalPath`]; that
//! identity keys a record in an [`EnvStore`]. Records can be written back out
//! as `.env` files through [`pull`].

pub mod canon;
pub mod dotenv;
pub mod error;
pub mod logging;
pub mod paths;
pub mod pull;
pub mod store;

pub type Result<T> = anyhow::Result<T>;

pub use canon::{CanonicalPath, canonicalize, canonicalize_in};
pub use dotenv::Quoting;
pub use error::{PathError, StoreError, Unavailable};
pub use pull::{AssumeYes, Confirm, Prompt, PullOutcome};
pub use store::{DirectorySummary, EnvStore, EnvVars, MemoryStore, SqliteStore};
