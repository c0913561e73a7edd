//! Global application error types and handlers.
//!
//! `AppError` is what HTTP handlers return. It wraps the layer-specific
//! errors and renders every failure as a JSON `{ "error": ... }` body with a
//! matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sign-in required")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Startup failed: {0}")]
    Startup(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::InvalidCredentials(_)) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::NoProfileFound { .. }) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::ResolutionRace { .. }) => StatusCode::CONFLICT,
            AppError::Auth(AuthError::CredentialStore(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Startup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Startup(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
