//! Versions of a mod, their uploaded file and the builds shipping them.

use super::{link, unlink};
use crate::error::{ApiResult, StatusResponse};
use crate::state::AppState;
use crate::upload;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Deserialize;
use solder_store::models::{Build, Version};
use solder_store::repo::VersionInput;

#[derive(Debug, Deserialize)]
pub struct VersionPayload {
    #[serde(flatten)]
    pub input: VersionInput,
    /// Mod file as a base64 data URL.
    pub upload: Option<String>,
}
impl VersionPayload {
    fn into_input(self) -> ApiResult<VersionInput> {
        let mut input = self.input;
        input.file = upload::decode_field(self.upload.as_deref())?;
        Ok(input)
    }
}

async fn resolve(state: &AppState, r#mod: &str, version: &str) -> ApiResult<Version> {
    let r#mod = state.store.mods.get(r#mod).await?;
    Ok(state.store.versions.get(r#mod.id, version).await?)
}

pub async fn list_versions(
    State(state): State<AppState>,
    Path(r#mod): Path<String>,
) -> ApiResult<Json<Vec<Version>>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    Ok(Json(state.store.versions.list(r#mod.id).await?))
}

pub async fn create_version(
    State(state): State<AppState>,
    Path(r#mod): Path<String>,
    payload: Result<Json<VersionPayload>, JsonRejection>,
) -> ApiResult<Json<Version>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    let Json(payload) = payload?;
    Ok(Json(state.store.versions.create(r#mod.id, payload.into_input()?).await?))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path((r#mod, version)): Path<(String, String)>,
) -> ApiResult<Json<Version>> {
    Ok(Json(resolve(&state, &r#mod, &version).await?))
}

pub async fn update_version(
    State(state): State<AppState>,
    Path((r#mod, version)): Path<(String, String)>,
    payload: Result<Json<VersionPayload>, JsonRejection>,
) -> ApiResult<Json<Version>> {
    let version = resolve(&state, &r#mod, &version).await?;
    let Json(payload) = payload?;
    Ok(Json(state.store.versions.update(version.id, payload.into_input()?).await?))
}

pub async fn delete_version(
    State(state): State<AppState>,
    Path((r#mod, version)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let version = resolve(&state, &r#mod, &version).await?;
    state.store.versions.delete(version.id).await?;
    Ok(StatusResponse::ok("Successfully deleted version"))
}

pub async fn list_version_builds(
    State(state): State<AppState>,
    Path((r#mod, version)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Build>>> {
    let version = resolve(&state, &r#mod, &version).await?;
    Ok(Json(state.store.versions.builds().list_by_b(version.id).await?))
}

pub async fn link_version_build(
    State(state): State<AppState>,
    Path((r#mod, version, pack, build)): Path<(String, String, String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let version = resolve(&state, &r#mod, &version).await?;
    let pack = state.store.packs.get(&pack).await?;
    let build = state.store.builds.get(pack.id, &build).await?;
    link(state.store.versions.builds(), build.id, version.id, None, "Successfully appended build").await
}

pub async fn unlink_version_build(
    State(state): State<AppState>,
    Path((r#mod, version, pack, build)): Path<(String, String, String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let version = resolve(&state, &r#mod, &version).await?;
    let pack = state.store.packs.get(&pack).await?;
    let build = state.store.builds.get(pack.id, &build).await?;
    unlink(state.store.versions.builds(), build.id, version.id, "Successfully unlinked build").await
}
