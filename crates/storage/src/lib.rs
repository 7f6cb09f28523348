//! Content-addressed blob storage.
//!
//! Uploaded payloads (pack logos, mod files) are hashed and written once under
//! `<category>/<md5>` relative to a storage root. The root itself lives behind
//! a [`StorageBackend`] so tests can swap the filesystem for memory.

pub mod artifact;
pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::artifact::{Artifact, ArtifactStore, Category};
pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
