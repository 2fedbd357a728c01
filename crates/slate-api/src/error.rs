use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

use slate_types::api::{Envelope, FieldError};

/// Error taxonomy for the HTTP surface. Every variant maps to exactly one
/// status code and renders as the standard envelope, so handlers never build
/// failure responses by hand.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, data) = match self {
            ApiError::Validation(fields) => {
                warn!("Validation failed on {} field(s)", fields.len());
                (
                    StatusCode::BAD_REQUEST,
                    "Validation failed".to_string(),
                    json!(fields),
                )
            }
            ApiError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg, Value::Null)
            }
            ApiError::Unauthorized(msg) => {
                warn!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, msg, Value::Null)
            }
            ApiError::Forbidden(msg) => {
                warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg, Value::Null)
            }
            ApiError::NotFound(msg) => {
                info!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg, Value::Null)
            }
            ApiError::Conflict(msg) => {
                info!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg, Value::Null)
            }
            ApiError::Internal(err) => {
                // Log the cause, never send it to the client
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Value::Null,
                )
            }
        };

        let body = Json(Envelope {
            success: false,
            status_code: status.as_u16(),
            message,
            data,
        });
        (status, body).into_response()
    }
}

/// Malformed or unparseable request bodies surface as 400s in the envelope
/// instead of the framework's plain-text rejection.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Success envelope with the matching HTTP status.
pub fn ok_envelope<T: Serialize>(
    status: StatusCode,
    message: &str,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            success: true,
            status_code: status.as_u16(),
            message: message.to_string(),
            data,
        }),
    )
}

/// Run rusqlite and argon2 work off the async runtime. A join error means
/// the closure panicked.
pub async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
}
