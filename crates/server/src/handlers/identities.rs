//! Users, teams and clients, and team membership.

use super::{link, perm, unlink};
use crate::error::{ApiResult, StatusResponse};
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use solder_store::Store;
use solder_store::association::Link;
use solder_store::models::{Clients, Identity, IdentityKind, Teams, User, Users};
use solder_store::repo::{Identities, IdentityInput};

/// Picks the repository of an identity kind out of the store, so one set of
/// generic handlers serves `/users`, `/teams` and `/clients`.
pub trait Directory: IdentityKind + Sized {
    fn repository(store: &Store) -> &Identities<Self>;
}
impl Directory for Users {
    fn repository(store: &Store) -> &Identities<Self> {
        &store.users
    }
}
impl Directory for Teams {
    fn repository(store: &Store) -> &Identities<Self> {
        &store.teams
    }
}
impl Directory for Clients {
    fn repository(store: &Store) -> &Identities<Self> {
        &store.clients
    }
}

pub async fn list<K: Directory>(State(state): State<AppState>) -> ApiResult<Json<Vec<Identity<K>>>> {
    Ok(Json(K::repository(&state.store).list().await?))
}

pub async fn create<K: Directory>(
    State(state): State<AppState>,
    payload: Result<Json<IdentityInput>, JsonRejection>,
) -> ApiResult<Json<Identity<K>>> {
    let Json(input) = payload?;
    Ok(Json(K::repository(&state.store).create(input).await?))
}

pub async fn get<K: Directory>(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<Json<Identity<K>>> {
    Ok(Json(K::repository(&state.store).get(&key).await?))
}

pub async fn delete<K: Directory>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let repository = K::repository(&state.store);
    let identity = repository.get(&key).await?;
    repository.delete(identity.id).await?;
    Ok(StatusResponse::ok(format!("Successfully deleted {}", K::KIND)))
}

pub async fn list_team_users(
    State(state): State<AppState>,
    Path(team): Path<String>,
) -> ApiResult<Json<Vec<Link<User>>>> {
    let team = state.store.teams.get(&team).await?;
    Ok(Json(state.store.teams.users().links_by_a(team.id).await?))
}

pub async fn link_team_user(
    State(state): State<AppState>,
    Path((team, user)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<StatusResponse>> {
    let perm = perm(&body)?;
    let team = state.store.teams.get(&team).await?;
    let user = state.store.users.get(&user).await?;
    link(&state.store.teams.users(), team.id, user.id, perm.as_deref(), "Successfully appended user").await
}

pub async fn unlink_team_user(
    State(state): State<AppState>,
    Path((team, user)): Path<(String, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let team = state.store.teams.get(&team).await?;
    let user = state.store.users.get(&user).await?;
    unlink(&state.store.teams.users(), team.id, user.id, "Successfully unlinked user").await
}
