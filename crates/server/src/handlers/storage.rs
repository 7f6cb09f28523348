//! Blob downloads and the health check.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;
use solder_storage::Category;
use solder_storage::error::ErrorKind as StorageErrorKind;

/// Blobs are stored without their content type.
const BLOB_CONTENT_TYPE: &str = "application/octet-stream";

/// Serve a blob by category and md5, the URLs put into manifests.
pub async fn get_blob(
    State(state): State<AppState>,
    Path((category, hash)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let category: Category = category.parse().map_err(|_| ApiError::not_found(format!("no such category `{category}`")))?;
    let content = state.artifacts.get(category, &hash).await.map_err(|err| match &*err {
        StorageErrorKind::NotFound(_) | StorageErrorKind::InvalidPath(_) | StorageErrorKind::Validation(_) => ApiError::not_found("no such blob"),
        _ => {
            tracing::error!(error = ?err, "failed to read blob");
            ApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        },
    })?;
    Ok(([(header::CONTENT_TYPE, BLOB_CONTENT_TYPE)], content))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}
