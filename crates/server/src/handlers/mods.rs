//! Mods and their user/team links.

use super::{link, perm, unlink};
use crate::error::{ApiResult, StatusResponse};
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use solder_store::association::Link;
use solder_store::models::{Mod, Team, User};
use solder_store::repo::ModInput;

pub async fn list_mods(State(state): State<AppState>) -> ApiResult<Json<Vec<Mod>>> {
    Ok(Json(state.store.mods.list().await?))
}

pub async fn create_mod(
    State(state): State<AppState>,
    payload: Result<Json<ModInput>, JsonRejection>,
) -> ApiResult<Json<Mod>> {
    let Json(input) = payload?;
    Ok(Json(state.store.mods.create(input).await?))
}

pub async fn get_mod(State(state): State<AppState>, Path(r#mod): Path<String>) -> ApiResult<Json<Mod>> {
    Ok(Json(state.store.mods.get(&r#mod).await?))
}

pub async fn update_mod(
    State(state): State<AppState>,
    Path(r#mod): Path<String>,
    payload: Result<Json<ModInput>, JsonRejection>,
) -> ApiResult<Json<Mod>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    let Json(input) = payload?;
    Ok(Json(state.store.mods.update(r#mod.id, input).await?))
}

pub async fn delete_mod(
    State(state): State<AppState>,
    Path(r#mod): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    state.store.mods.delete(r#mod.id).await?;
    Ok(StatusResponse::ok("Successfully deleted mod"))
}

pub async fn list_mod_users(
    State(state): State<AppState>,
    Path(r#mod): Path<String>,
) -> ApiResult<Json<Vec<Link<User>>>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    Ok(Json(state.store.mods.users().links_by_a(r#mod.id).await?))
}

pub async fn link_mod_user(
    State(state): State<AppState>,
    Path((r#mod, user)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<StatusResponse>> {
    let perm = perm(&body)?;
    let r#mod = state.store.mods.get(&r#mod).await?;
    let user = state.store.users.get(&user).await?;
    link(state.store.mods.users(), r#mod.id, user.id, perm.as_deref(), "Successfully appended user").await
}

pub async fn unlink_mod_user(
    State(state): State<AppState>,
    Path((r#mod, user)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    let user = state.store.users.get(&user).await?;
    unlink(state.store.mods.users(), r#mod.id, user.id, "Successfully unlinked user").await
}

pub async fn list_mod_teams(
    State(state): State<AppState>,
    Path(r#mod): Path<String>,
) -> ApiResult<Json<Vec<Link<Team>>>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    Ok(Json(state.store.mods.teams().links_by_a(r#mod.id).await?))
}

pub async fn link_mod_team(
    State(state): State<AppState>,
    Path((r#mod, team)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<StatusResponse>> {
    let perm = perm(&body)?;
    let r#mod = state.store.mods.get(&r#mod).await?;
    let team = state.store.teams.get(&team).await?;
    link(state.store.mods.teams(), r#mod.id, team.id, perm.as_deref(), "Successfully appended team").await
}

pub async fn unlink_mod_team(
    State(state): State<AppState>,
    Path((r#mod, team)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let r#mod = state.store.mods.get(&r#mod).await?;
    let team = state.store.teams.get(&team).await?;
    unlink(state.store.mods.teams(), r#mod.id, team.id, "Successfully unlinked team").await
}
