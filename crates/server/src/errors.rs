use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::invite::InviteError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Invite(#[from] InviteError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg })),
            ApiError::Invite(InviteError::MissingFields) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": self.to_string() }))
            }
            ApiError::Invite(InviteError::NotConfigured) => {
                (StatusCode::NOT_IMPLEMENTED, serde_json::json!({ "message": self.to_string() }))
            }
            // provider detail stays in the logs
            ApiError::Invite(InviteError::Provider(detail)) => {
                error!(error = %detail, "send-invite error");
                (StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({ "error": "failed to send" }))
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage unavailable: {0}")]
    Storage(String),
}
