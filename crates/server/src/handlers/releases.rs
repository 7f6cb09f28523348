//! Minecraft and Forge releases.
//!
//! Releases are never created by hand: `PUT` syncs one upstream record.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Serialize;
use solder_store::models::{Build, Forge, ForgeRelease, Minecraft, MinecraftRelease};
use solder_store::repo::{Release, Releases, SyncOutcome};

#[derive(Debug, Serialize)]
pub struct SyncResponse<E> {
    pub outcome: SyncOutcome,
    pub release: E,
}

async fn sync<E: Release>(releases: &Releases<E>, record: &E::Record) -> ApiResult<Json<SyncResponse<E>>> {
    let (release, outcome) = releases.sync(record).await?;
    Ok(Json(SyncResponse { outcome, release }))
}

async fn builds<E: Release>(releases: &Releases<E>, key: &str) -> ApiResult<Json<Vec<Build>>> {
    let release = releases.get(key).await?;
    Ok(Json(releases.builds().list_by_a(release.id()).await?))
}

pub async fn list_minecraft(State(state): State<AppState>) -> ApiResult<Json<Vec<Minecraft>>> {
    Ok(Json(state.store.minecrafts.list().await?))
}

pub async fn sync_minecraft(
    State(state): State<AppState>,
    payload: Result<Json<MinecraftRelease>, JsonRejection>,
) -> ApiResult<Json<SyncResponse<Minecraft>>> {
    let Json(record) = payload?;
    sync(&state.store.minecrafts, &record).await
}

pub async fn list_minecraft_builds(
    State(state): State<AppState>,
    Path(minecraft): Path<String>,
) -> ApiResult<Json<Vec<Build>>> {
    builds(&state.store.minecrafts, &minecraft).await
}

pub async fn list_forge(State(state): State<AppState>) -> ApiResult<Json<Vec<Forge>>> {
    Ok(Json(state.store.forges.list().await?))
}

pub async fn sync_forge(
    State(state): State<AppState>,
    payload: Result<Json<ForgeRelease>, JsonRejection>,
) -> ApiResult<Json<SyncResponse<Forge>>> {
    let Json(record) = payload?;
    sync(&state.store.forges, &record).await
}

pub async fn list_forge_builds(
    State(state): State<AppState>,
    Path(forge): Path<String>,
) -> ApiResult<Json<Vec<Build>>> {
    builds(&state.store.forges, &forge).await
}
