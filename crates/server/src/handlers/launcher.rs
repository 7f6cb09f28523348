//! Manifests read by launcher clients.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use solder_store::{BuildManifest, PackManifest};

pub async fn list_modpacks(State(state): State<AppState>) -> ApiResult<Json<Vec<PackManifest>>> {
    Ok(Json(state.manifests.packs().await?))
}

pub async fn get_modpack(State(state): State<AppState>, Path(pack): Path<String>) -> ApiResult<Json<PackManifest>> {
    Ok(Json(state.manifests.pack(&pack).await?))
}

pub async fn get_modpack_build(
    State(state): State<AppState>,
    Path((pack, build)): Path<(String, String)>,
) -> ApiResult<Json<BuildManifest>> {
    Ok(Json(state.manifests.build(&pack, &build).await?))
}
