//! Custom error types specific to the `adapters` crate.
//!
//! Every failure talking to the hosted auth/database service surfaces as an
//! `AdapterError`. "Row not found" is not an error: lookups return `Ok(None)`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Email/password pair refused by the credential store.
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("No active session")]
    NoSession,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Rejected by the service with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AdapterError::Decode(err.to_string())
        } else {
            AdapterError::Transport(err.to_string())
        }
    }
}
