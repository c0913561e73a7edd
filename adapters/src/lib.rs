//! Core `adapters` crate for abstracting the hosted auth/database service.
//!
//! This crate defines the `CredentialStore` and `ProfileDirectory` traits,
//! which outline what the access core needs from the hosted service, and
//! provides the concrete implementations (in-memory and hosted REST).

pub mod errors;
pub mod hosted;
pub mod memory;
pub mod models;

use async_trait::async_trait;
use tokio::sync::broadcast;

pub use errors::AdapterError;
pub use hosted::{HostedBackend, TableNames};
pub use memory::MemoryBackend;
pub use models::{BillingRecord, GuardianProfileRow, Identity, Session, SessionEvent, StaffProfileRow};

/// Authentication half of the hosted service.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the current session, or `None` when there is none or it expired.
    async fn get_session(&self) -> Result<Option<Session>, AdapterError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AdapterError>;

    /// Invalidates the current session. Signing out without a session succeeds.
    async fn sign_out(&self) -> Result<(), AdapterError>;

    /// Subscribes to session-change events emitted after this call.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Read-only view over the profile and billing tables.
///
/// All lookups return `Ok(None)` when no row matches.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn staff_profile(&self, identity_id: &str) -> Result<Option<StaffProfileRow>, AdapterError>;

    async fn guardian_profile(&self, identity_id: &str) -> Result<Option<GuardianProfileRow>, AdapterError>;

    async fn billing_record(&self, tenant_id: &str) -> Result<Option<BillingRecord>, AdapterError>;
}

/// Capacity of the session-change broadcast channels.
pub(crate) const EVENT_CAPACITY: usize = 32;
