//! API error type and its mapping from store errors.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::Display;
use serde::Serialize;
use solder_store::error::{Error as StoreError, ErrorKind};

/// Body of every error response, and of plain acknowledgements.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: u16,
    pub message: String,
}
impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self { status: StatusCode::OK.as_u16(), message: message.into() })
    }
}

#[derive(Debug, Display)]
#[display("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Outcome of a link or unlink request. "Already linked" and "not
    /// linked" are routine answers and both become `412 Precondition Failed`.
    pub fn link(err: StoreError) -> Self {
        match &*err {
            ErrorKind::Conflict(message) | ErrorKind::NotFound(message) => {
                tracing::debug!(%message, "link precondition failed");
                Self::new(StatusCode::PRECONDITION_FAILED, message.clone())
            },
            _ => Self::from(err),
        }
    }

    /// Anything that is not the caller's fault. The full error tree is
    /// logged; the response only carries the outermost message.
    pub fn internal(err: StoreError) -> Self {
        tracing::error!(error = ?err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &*err {
            ErrorKind::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict(_) => StatusCode::CONFLICT,
            ErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            _ => return Self::internal(err),
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection, "failed to bind request body");
        Self::new(StatusCode::PRECONDITION_FAILED, format!("failed to bind request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = StatusResponse { status: self.status.as_u16(), message: self.message };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
