//! HTTP API for solder.
//!
//! Two audiences share one router:
//! - curators manage packs, builds, mods, versions and their links;
//! - launchers read pack and build manifests under `/modpacks` and download
//!   blobs under `/storage`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod upload;

pub use crate::error::{ApiError, ApiResult};
pub use crate::routes::create_router;
pub use crate::state::AppState;
