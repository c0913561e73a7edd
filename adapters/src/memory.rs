//! In-process implementation of the credential store and profile directory.
//!
//! `MemoryBackend` keeps accounts, profile rows and billing records in plain
//! maps populated through builder methods. It behaves like the hosted service
//! from the caller's point of view (session events, expiry, "row not found"
//! as `Ok(None)`) and is what the backend's tests and local runs use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};

use crate::errors::AdapterError;
use crate::models::{BillingRecord, GuardianProfileRow, Identity, Session, SessionEvent, StaffProfileRow};
use crate::{CredentialStore, ProfileDirectory, EVENT_CAPACITY};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

struct Account {
    identity: Identity,
    password: String,
}

pub struct MemoryBackend {
    accounts: HashMap<String, Account>,
    staff: HashMap<String, StaffProfileRow>,
    guardians: HashMap<String, GuardianProfileRow>,
    billing: HashMap<String, BillingRecord>,
    lookup_delays: HashMap<String, Duration>,
    session_ttl: chrono::Duration,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
    issued: AtomicUsize,
    lookups: AtomicUsize,
    sign_outs: AtomicUsize,
    failing: AtomicBool,
    session_failing: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: HashMap::new(),
            staff: HashMap::new(),
            guardians: HashMap::new(),
            billing: HashMap::new(),
            lookup_delays: HashMap::new(),
            session_ttl: chrono::Duration::hours(1),
            session: Mutex::new(None),
            events,
            issued: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            session_failing: AtomicBool::new(false),
        }
    }

    pub fn with_account(mut self, identity: Identity, password: impl Into<String>) -> Self {
        self.accounts.insert(
            identity.email.to_lowercase(),
            Account {
                identity,
                password: password.into(),
            },
        );
        self
    }

    pub fn with_staff_profile(mut self, row: StaffProfileRow) -> Self {
        self.staff.insert(row.identity_id.clone(), row);
        self
    }

    pub fn with_guardian_profile(mut self, row: GuardianProfileRow) -> Self {
        self.guardians.insert(row.identity_id.clone(), row);
        self
    }

    pub fn with_billing(mut self, record: BillingRecord) -> Self {
        self.billing.insert(record.tenant_id.clone(), record);
        self
    }

    /// Delays every profile lookup for `identity_id`, to simulate a slow round-trip.
    pub fn with_lookup_delay(mut self, identity_id: impl Into<String>, delay: Duration) -> Self {
        self.lookup_delays.insert(identity_id.into(), delay);
        self
    }

    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Makes every subsequent table lookup fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every subsequent session read fail with a transport error.
    pub fn set_session_failing(&self, failing: bool) {
        self.session_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of table reads served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    /// Installs a session directly, as if it had been restored from storage.
    pub async fn restore_session(&self, email: &str) -> Result<Session, AdapterError> {
        let account = self
            .accounts
            .get(&email.to_lowercase())
            .ok_or_else(|| AdapterError::InvalidCredentials(INVALID_CREDENTIALS.to_string()))?;
        let session = self.issue(&account.identity);
        *self.session.lock().await = Some(session.clone());
        Ok(session)
    }

    fn issue(&self, identity: &Identity) -> Session {
        let serial = self.issued.fetch_add(1, Ordering::SeqCst);
        Session {
            identity: identity.clone(),
            access_token: format!("mem-{}-{}", identity.id, serial),
            refresh_token: None,
            expires_at: Utc::now() + self.session_ttl,
        }
    }

    fn emit(&self, event: SessionEvent) {
        log::debug!("memory store emitting {}", event.kind());
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }

    async fn before_lookup(&self, identity_id: &str) -> Result<(), AdapterError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delays.get(identity_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AdapterError::Transport("memory backend set to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>, AdapterError> {
        if self.session_failing.load(Ordering::SeqCst) {
            return Err(AdapterError::Transport("memory backend set to fail".to_string()));
        }
        let mut current = self.session.lock().await;
        if current.as_ref().is_some_and(Session::is_expired) {
            log::debug!("memory store dropping expired session");
            *current = None;
        }
        Ok(current.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AdapterError> {
        let account = self
            .accounts
            .get(&email.to_lowercase())
            .filter(|account| account.password == password)
            .ok_or_else(|| AdapterError::InvalidCredentials(INVALID_CREDENTIALS.to_string()))?;

        let session = self.issue(&account.identity);
        *self.session.lock().await = Some(session.clone());
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AdapterError> {
        self.session.lock().await.take();
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ProfileDirectory for MemoryBackend {
    async fn staff_profile(&self, identity_id: &str) -> Result<Option<StaffProfileRow>, AdapterError> {
        self.before_lookup(identity_id).await?;
        Ok(self.staff.get(identity_id).cloned())
    }

    async fn guardian_profile(&self, identity_id: &str) -> Result<Option<GuardianProfileRow>, AdapterError> {
        self.before_lookup(identity_id).await?;
        Ok(self.guardians.get(identity_id).cloned())
    }

    async fn billing_record(&self, tenant_id: &str) -> Result<Option<BillingRecord>, AdapterError> {
        self.before_lookup(tenant_id).await?;
        Ok(self.billing.get(tenant_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> MemoryBackend {
        MemoryBackend::new().with_account(Identity::new("u-1", "Ana@Escola.edu"), "secret")
    }

    #[tokio::test]
    async fn sign_in_is_case_insensitive_on_email() {
        let store = backend();
        let session = store.sign_in_with_password("ana@escola.edu", "secret").await.unwrap();
        assert_eq!(session.identity.id, "u-1");
        assert_eq!(store.get_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = backend();
        let err = store.sign_in_with_password("ana@escola.edu", "nope").await.unwrap_err();
        assert_eq!(err, AdapterError::InvalidCredentials(INVALID_CREDENTIALS.to_string()));
        assert_eq!(store.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_in_and_out_broadcast_events() {
        let store = backend();
        let mut events = store.subscribe();

        store.sign_in_with_password("ana@escola.edu", "secret").await.unwrap();
        store.sign_out().await.unwrap();

        assert_eq!(events.recv().await.unwrap().kind(), "SIGNED_IN");
        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut);
        assert_eq!(store.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_session_is_not_returned() {
        let store = backend().with_session_ttl(chrono::Duration::seconds(-1));
        store.restore_session("ana@escola.edu").await.unwrap();
        assert_eq!(store.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_rows_are_none_and_failures_are_errors() {
        let store = backend();
        assert_eq!(store.staff_profile("u-1").await.unwrap(), None);

        store.set_failing(true);
        assert!(matches!(
            store.guardian_profile("u-1").await,
            Err(AdapterError::Transport(_))
        ));
        assert_eq!(store.lookup_count(), 2);
    }

    #[tokio::test]
    async fn failing_session_reads_are_transport_errors() {
        let store = backend();
        store.restore_session("ana@escola.edu").await.unwrap();

        store.set_session_failing(true);
        assert!(matches!(store.get_session().await, Err(AdapterError::Transport(_))));
        store.set_session_failing(false);
        assert!(store.get_session().await.unwrap().is_some());
    }
}
