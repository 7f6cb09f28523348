//! Builds of a pack and the mod versions they ship.

use super::{link, unlink};
use crate::error::{ApiError, ApiResult, StatusResponse};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use solder_store::models::{Build, Version};
use solder_store::repo::BuildInput;

async fn resolve(state: &AppState, pack: &str, build: &str) -> ApiResult<Build> {
    let pack = state.store.packs.get(pack).await?;
    Ok(state.store.builds.get(pack.id, build).await?)
}

pub async fn list_builds(State(state): State<AppState>, Path(pack): Path<String>) -> ApiResult<Json<Vec<Build>>> {
    let pack = state.store.packs.get(&pack).await?;
    Ok(Json(state.store.builds.list(pack.id).await?))
}

pub async fn create_build(
    State(state): State<AppState>,
    Path(pack): Path<String>,
    payload: Result<Json<BuildInput>, JsonRejection>,
) -> ApiResult<Json<Build>> {
    let pack = state.store.packs.get(&pack).await?;
    let Json(input) = payload?;
    Ok(Json(state.store.builds.create(pack.id, input).await?))
}

pub async fn get_build(
    State(state): State<AppState>,
    Path((pack, build)): Path<(String, String)>,
) -> ApiResult<Json<Build>> {
    Ok(Json(resolve(&state, &pack, &build).await?))
}

pub async fn update_build(
    State(state): State<AppState>,
    Path((pack, build)): Path<(String, String)>,
    payload: Result<Json<BuildInput>, JsonRejection>,
) -> ApiResult<Json<Build>> {
    let build = resolve(&state, &pack, &build).await?;
    let Json(input) = payload?;
    Ok(Json(state.store.builds.update(build.id, input).await?))
}

pub async fn delete_build(
    State(state): State<AppState>,
    Path((pack, build)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let build = resolve(&state, &pack, &build).await?;
    state.store.builds.delete(build.id).await?;
    Ok(StatusResponse::ok("Successfully deleted build"))
}

pub async fn list_build_versions(
    State(state): State<AppState>,
    Path((pack, build)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Version>>> {
    let build = resolve(&state, &pack, &build).await?;
    Ok(Json(state.store.builds.versions().list_by_a(build.id).await?))
}

async fn resolve_version(state: &AppState, r#mod: &str, version: &str) -> ApiResult<Version> {
    let r#mod = state.store.mods.get(r#mod).await?;
    Ok(state.store.versions.get(r#mod.id, version).await?)
}

pub async fn link_build_version(
    State(state): State<AppState>,
    Path((pack, build, r#mod, version)): Path<(String, String, String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let build = resolve(&state, &pack, &build).await?;
    let version = resolve_version(&state, &r#mod, &version).await?;
    link(state.store.builds.versions(), build.id, version.id, None, "Successfully appended version").await
}

pub async fn unlink_build_version(
    State(state): State<AppState>,
    Path((pack, build, r#mod, version)): Path<(String, String, String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let build = resolve(&state, &pack, &build).await?;
    let version = resolve_version(&state, &r#mod, &version).await?;
    unlink(state.store.builds.versions(), build.id, version.id, "Successfully unlinked version").await
}

/// Download the file of a version shipped in the build.
///
/// The version is looked up among the build's versions by id, then by slug.
pub async fn get_build_version_file(
    State(state): State<AppState>,
    Path((pack, build, version)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let build = resolve(&state, &pack, &build).await?;
    let versions = state.store.builds.versions().list_by_a(build.id).await?;
    let id: Option<i64> = version.parse().ok();
    let found = versions
        .iter()
        .find(|candidate| Some(candidate.id) == id)
        .or_else(|| versions.iter().find(|candidate| candidate.slug == version));
    let Some(found) = found else {
        return Err(ApiError::not_found(format!("version `{version}` is not part of this build")));
    };
    if found.file.is_none() {
        return Err(ApiError::not_found("No file content available"));
    }
    let (content, file) = state.store.versions.file(found).await.map_err(ApiError::internal)?;
    Ok(([(header::CONTENT_TYPE, file.content_type)], content))
}
