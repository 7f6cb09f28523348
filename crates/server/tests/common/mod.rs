//! Common test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use solder_server::{AppState, create_router};
use solder_storage::ArtifactStore;
use solder_storage::backend::LocalBackend;
use solder_store::{Database, Store};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const DOWNLOAD_URL: &str = "http://localhost/storage";

/// A router over an in-memory database and a temporary storage root.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _db: Database,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let backend = LocalBackend::new("test", temp_dir.path().join("storage")).expect("Failed to create storage backend");
        let artifacts = ArtifactStore::new(Arc::new(backend));
        let db = Database::connect_in_memory().await.expect("Failed to open database");
        let store = Store::new(&db, artifacts.clone());
        let state = AppState::new(store, artifacts, DOWNLOAD_URL);
        Self { router: create_router(state.clone()), state, _db: db, _temp_dir: temp_dir }
    }

    /// Send a request with an optional JSON body and decode the JSON answer.
    pub async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(v) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&v).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, _, bytes) = self.send(request).await;
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }

    /// Send a raw request, returning status, content type and body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, bytes.to_vec())
    }

    pub async fn get_raw(&self, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    /// Sync a Minecraft release, create a pack with one build on it, a mod
    /// and one version carrying `file`.
    pub async fn seed(&self, file: &[u8]) {
        let (status, _) = self
            .json("PUT", "/minecraft", Some(serde_json::json!({"id": "1.12.2", "type": "release"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = self.json("POST", "/packs", Some(serde_json::json!({"name": "Tech Pack"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = self
            .json("POST", "/packs/tech-pack/builds", Some(serde_json::json!({"name": "b1", "minecraft": "1.12.2"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = self.json("POST", "/mods", Some(serde_json::json!({"name": "jei"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = self
            .json(
                "POST",
                "/mods/jei/versions",
                Some(serde_json::json!({"name": "4.7", "upload": data_url("application/java-archive", file)})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

/// RFC 2397 data URL for a payload.
#[allow(dead_code)]
pub fn data_url(media_type: &str, content: &[u8]) -> String {
    use base64::Engine;
    format!("data:{media_type};base64,{}", base64::engine::general_purpose::STANDARD.encode(content))
}
