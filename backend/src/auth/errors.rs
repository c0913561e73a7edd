//! Custom error types specific to authentication failures.
//!
//! Only `InvalidCredentials` is ever shown to a person (inline on the sign-in
//! form). The other variants steer the session state and are logged.

use adapters::AdapterError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("No profile found for identity {identity_id}")]
    NoProfileFound { identity_id: String },
    #[error("Resolution for identity {identity_id} was superseded")]
    ResolutionRace { identity_id: String },
    #[error("Credential store unavailable: {0}")]
    CredentialStore(String),
}

impl AuthError {
    pub fn no_profile(identity_id: &str) -> Self {
        AuthError::NoProfileFound {
            identity_id: identity_id.to_string(),
        }
    }
}

impl From<AdapterError> for AuthError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::InvalidCredentials(message) => AuthError::InvalidCredentials(message),
            other => AuthError::CredentialStore(other.to_string()),
        }
    }
}
