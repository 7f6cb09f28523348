//! Application state shared across handlers.

use solder_storage::ArtifactStore;
use solder_store::{ManifestSynthesizer, Store};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
    pub manifests: ManifestSynthesizer,
    pub artifacts: ArtifactStore,
}
impl AppState {
    /// `download_url` is the public base URL of the `/storage` routes.
    pub fn new(store: Store, artifacts: ArtifactStore, download_url: impl Into<String>) -> Self {
        Self {
            manifests: ManifestSynthesizer::new(store.clone(), download_url),
            store,
            artifacts,
        }
    }
}
