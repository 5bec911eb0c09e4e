//! Local subject/classification store for the gaze classification suite
//!
//! Keeps a working set of classifiable subjects ("items"), their cached
//! image files and their finished classifications in one SQLite database,
//! addressed through typed resource references with public field names.
//! Background synchronization, HTTP and image downloads are external
//! collaborators reached through the traits in [`client`] and the
//! fire-and-forget sync-request channel.

pub mod classification;
pub mod client;
pub mod columns;
pub mod config;
pub mod error;
pub mod item;
pub mod resolver;
pub mod resource;
pub mod schema;
pub mod sqlite_store;
pub mod store;

pub use classification::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use item::*;
pub use resolver::*;
pub use resource::*;
pub use sqlite_store::{SubjectStore, SyncRequest};
pub use store::*;
