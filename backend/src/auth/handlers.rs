//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse the sign-in form, hand it to the session context and
//! shape the answers the login page expects: an inline message on refused
//! credentials, and a full-reload hint after sign-out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::models::LOGIN_PATH;
use super::session::SessionSnapshot;
use crate::errors::AppError;
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct LogoutResponse {
    /// Path the shell must load with a full navigation, dropping in-memory state.
    pub reload: &'static str,
}

pub async fn login(State(state): State<AppState>, Json(form): Json<LoginRequest>) -> Result<StatusCode, AppError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".to_string()));
    }
    state.session.sign_in(email, &form.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn logout(State(state): State<AppState>) -> Json<LogoutResponse> {
    state.session.sign_out().await;
    Json(LogoutResponse { reload: LOGIN_PATH })
}

pub async fn current_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}
