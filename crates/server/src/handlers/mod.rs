//! HTTP request handlers.

pub mod builds;
pub mod identities;
pub mod launcher;
pub mod mods;
pub mod packs;
pub mod releases;
pub mod storage;
pub mod versions;

use crate::error::{ApiError, ApiResult, StatusResponse};
use axum::Json;
use axum::body::Bytes;
use serde::Deserialize;
use solder_store::models::Id;
use solder_store::{AssociationTable, Relation};

/// Optional body of link requests on permission-carrying relations.
#[derive(Debug, Default, Deserialize)]
struct LinkPayload {
    perm: Option<String>,
}

/// Parse an optional `{"perm": "..."}` body; an empty body means no perm.
fn perm(body: &Bytes) -> ApiResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let payload: LinkPayload = serde_json::from_slice(body).map_err(|err| {
        ApiError::new(axum::http::StatusCode::PRECONDITION_FAILED, format!("failed to bind link data: {err}"))
    })?;
    Ok(payload.perm.filter(|perm| !perm.trim().is_empty()))
}

async fn link<R: Relation>(
    table: &AssociationTable<R>,
    a: Id,
    b: Id,
    perm: Option<&str>,
    message: &str,
) -> ApiResult<Json<StatusResponse>> {
    table.link(a, b, perm).await.map_err(ApiError::link)?;
    Ok(StatusResponse::ok(message))
}

async fn unlink<R: Relation>(
    table: &AssociationTable<R>,
    a: Id,
    b: Id,
    message: &str,
) -> ApiResult<Json<StatusResponse>> {
    table.unlink(a, b).await.map_err(ApiError::link)?;
    Ok(StatusResponse::ok(message))
}
