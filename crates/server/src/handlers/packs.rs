//! Packs, their logo and their client/user/team links.

use super::{link, perm, unlink};
use crate::error::{ApiError, ApiResult, StatusResponse};
use crate::state::AppState;
use crate::upload;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;
use solder_store::association::Link;
use solder_store::models::{Client, Pack, Team, User};
use solder_store::repo::PackInput;

#[derive(Debug, Deserialize)]
pub struct PackPayload {
    #[serde(flatten)]
    pub input: PackInput,
    /// Logo as a base64 data URL.
    pub upload: Option<String>,
}
impl PackPayload {
    fn into_input(self) -> ApiResult<PackInput> {
        let mut input = self.input;
        input.logo = upload::decode_field(self.upload.as_deref())?;
        Ok(input)
    }
}

pub async fn list_packs(State(state): State<AppState>) -> ApiResult<Json<Vec<Pack>>> {
    Ok(Json(state.store.packs.list().await?))
}

pub async fn create_pack(
    State(state): State<AppState>,
    payload: Result<Json<PackPayload>, JsonRejection>,
) -> ApiResult<Json<Pack>> {
    let Json(payload) = payload?;
    let pack = state.store.packs.create(payload.into_input()?).await?;
    Ok(Json(pack))
}

pub async fn get_pack(State(state): State<AppState>, Path(pack): Path<String>) -> ApiResult<Json<Pack>> {
    Ok(Json(state.store.packs.get(&pack).await?))
}

pub async fn update_pack(
    State(state): State<AppState>,
    Path(pack): Path<String>,
    payload: Result<Json<PackPayload>, JsonRejection>,
) -> ApiResult<Json<Pack>> {
    let pack = state.store.packs.get(&pack).await?;
    let Json(payload) = payload?;
    let pack = state.store.packs.update(pack.id, payload.into_input()?).await?;
    Ok(Json(pack))
}

pub async fn delete_pack(
    State(state): State<AppState>,
    Path(pack): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let pack = state.store.packs.get(&pack).await?;
    state.store.packs.delete(pack.id).await?;
    Ok(StatusResponse::ok("Successfully deleted pack"))
}

pub async fn get_pack_logo(
    State(state): State<AppState>,
    Path(pack): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let pack = state.store.packs.get(&pack).await?;
    if pack.logo.is_none() {
        return Err(ApiError::not_found("pack has no logo"));
    }
    let (content, logo) = state.store.packs.logo(&pack).await.map_err(ApiError::internal)?;
    Ok(([(header::CONTENT_TYPE, logo.content_type)], content))
}

pub async fn list_pack_clients(
    State(state): State<AppState>,
    Path(pack): Path<String>,
) -> ApiResult<Json<Vec<Client>>> {
    let pack = state.store.packs.get(&pack).await?;
    Ok(Json(state.store.packs.clients().list_by_a(pack.id).await?))
}

pub async fn link_pack_client(
    State(state): State<AppState>,
    Path((pack, client)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let pack = state.store.packs.get(&pack).await?;
    let client = state.store.clients.get(&client).await?;
    link(state.store.packs.clients(), pack.id, client.id, None, "Successfully appended client").await
}

pub async fn unlink_pack_client(
    State(state): State<AppState>,
    Path((pack, client)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let pack = state.store.packs.get(&pack).await?;
    let client = state.store.clients.get(&client).await?;
    unlink(state.store.packs.clients(), pack.id, client.id, "Successfully unlinked client").await
}

pub async fn list_pack_users(
    State(state): State<AppState>,
    Path(pack): Path<String>,
) -> ApiResult<Json<Vec<Link<User>>>> {
    let pack = state.store.packs.get(&pack).await?;
    Ok(Json(state.store.packs.users().links_by_a(pack.id).await?))
}

pub async fn link_pack_user(
    State(state): State<AppState>,
    Path((pack, user)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<StatusResponse>> {
    let perm = perm(&body)?;
    let pack = state.store.packs.get(&pack).await?;
    let user = state.store.users.get(&user).await?;
    link(state.store.packs.users(), pack.id, user.id, perm.as_deref(), "Successfully appended user").await
}

pub async fn unlink_pack_user(
    State(state): State<AppState>,
    Path((pack, user)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let pack = state.store.packs.get(&pack).await?;
    let user = state.store.users.get(&user).await?;
    unlink(state.store.packs.users(), pack.id, user.id, "Successfully unlinked user").await
}

pub async fn list_pack_teams(
    State(state): State<AppState>,
    Path(pack): Path<String>,
) -> ApiResult<Json<Vec<Link<Team>>>> {
    let pack = state.store.packs.get(&pack).await?;
    Ok(Json(state.store.packs.teams().links_by_a(pack.id).await?))
}

pub async fn link_pack_team(
    State(state): State<AppState>,
    Path((pack, team)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<StatusResponse>> {
    let perm = perm(&body)?;
    let pack = state.store.packs.get(&pack).await?;
    let team = state.store.teams.get(&team).await?;
    link(state.store.packs.teams(), pack.id, team.id, perm.as_deref(), "Successfully appended team").await
}

pub async fn unlink_pack_team(
    State(state): State<AppState>,
    Path((pack, team)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let pack = state.store.packs.get(&pack).await?;
    let team = state.store.teams.get(&team).await?;
    unlink(state.store.packs.teams(), pack.id, team.id, "Successfully unlinked team").await
}
