//! Process-wide session context.
//!
//! `SessionContext` holds the resolved user and the `loading` flag in a
//! `watch` channel, follows the credential store's session-change events and
//! exposes sign-in/sign-out. Every identity change bumps a generation counter;
//! a resolution only commits if the generation and identity it started with
//! are still current, so a late answer for a superseded identity is dropped.

use std::sync::Arc;

use adapters::{CredentialStore, Identity, SessionEvent};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::errors::AuthError;
use super::models::ResolvedUser;
use super::service::ProfileResolver;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub user: Option<ResolvedUser>,
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    target: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            loading: true,
            user: None,
            generation: 0,
            target: None,
        }
    }
}

impl SessionSnapshot {
    /// A finished snapshot holding `user`, as the context has it after start-up.
    pub fn settled(user: Option<ResolvedUser>) -> Self {
        Self {
            loading: false,
            target: user.as_ref().map(|user| user.identity_id().to_string()),
            user,
            generation: 0,
        }
    }

    fn is_current(&self, generation: u64, identity_id: &str) -> bool {
        self.generation == generation && self.target.as_deref() == Some(identity_id)
    }
}

pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
    resolver: ProfileResolver,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>, resolver: ProfileResolver) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Arc::new(Self { store, resolver, state })
    }

    /// Subscribes to session events, then restores any existing session.
    ///
    /// Returns the listener task; `loading` is false once this returns.
    pub async fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let listener = self.spawn_listener(self.store.subscribe());
        self.initialize().await;
        listener
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<ResolvedUser> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Resolves the session the store already holds, if any. Always clears `loading`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        match self.store.get_session().await {
            Ok(Some(session)) => {
                let generation = self.begin(&session.identity.id);
                let _ = self.resolve_and_commit(&session.identity, generation).await;
            }
            Ok(None) => debug!("no stored session"),
            Err(err) => warn!("reading stored session failed: {}", err),
        }
        self.state.send_modify(|state| state.loading = false);
    }

    pub async fn handle_event(&self, event: SessionEvent) {
        debug!(event = event.kind(), "session event");
        match event {
            SessionEvent::SignedIn(session) => {
                let generation = self.begin(&session.identity.id);
                let _ = self.resolve_and_commit(&session.identity, generation).await;
            }
            SessionEvent::TokenRefreshed(session) => {
                if self.state.borrow().target.as_deref() == Some(session.identity.id.as_str()) {
                    return;
                }
                let generation = self.begin(&session.identity.id);
                let _ = self.resolve_and_commit(&session.identity, generation).await;
            }
            SessionEvent::SignedOut => self.clear(),
        }
    }

    /// Signs in through the credential store.
    ///
    /// The resolved user arrives later through the `SignedIn` event; callers
    /// wait on [`SessionContext::subscribe`] rather than reading it right away.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.store
            .sign_in_with_password(email, password)
            .await
            .map(|_| ())
            .map_err(|err| {
                info!("sign-in refused: {}", err);
                AuthError::from(err)
            })
    }

    /// Clears the local user, then invalidates the store session. Never fails.
    pub async fn sign_out(&self) {
        self.clear();
        if let Err(err) = self.store.sign_out().await {
            warn!("credential store sign-out failed: {}", err);
        }
    }

    fn begin(&self, identity_id: &str) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.target = Some(identity_id.to_string());
            if state.user.as_ref().is_some_and(|user| user.identity_id() != identity_id) {
                state.user = None;
            }
            generation = state.generation;
        });
        generation
    }

    fn clear(&self) {
        self.state.send_modify(|state| {
            state.generation += 1;
            state.target = None;
            state.user = None;
        });
    }

    async fn resolve_and_commit(&self, identity: &Identity, generation: u64) -> Result<ResolvedUser, AuthError> {
        let race = || AuthError::ResolutionRace {
            identity_id: identity.id.clone(),
        };

        match self.resolver.resolve(identity).await {
            Ok(user) => {
                let committed = self.state.send_if_modified(|state| {
                    if !state.is_current(generation, &identity.id) {
                        return false;
                    }
                    state.user = Some(user.clone());
                    true
                });
                if !committed {
                    debug!(identity = %identity.id, "discarding superseded resolution");
                    return Err(race());
                }
                info!(
                    identity = %identity.id,
                    role = %user.role(),
                    tenant = %user.tenant(),
                    "session resolved"
                );
                Ok(user)
            }
            Err(err) => {
                let still_current = self.state.send_if_modified(|state| {
                    if !state.is_current(generation, &identity.id) {
                        return false;
                    }
                    state.generation += 1;
                    state.target = None;
                    state.user = None;
                    true
                });
                if !still_current {
                    debug!(identity = %identity.id, "discarding superseded failure");
                    return Err(race());
                }
                // A newer sign-in may already hold the store while its event is still queued.
                match self.store.get_session().await {
                    Ok(Some(session)) if session.identity.id != identity.id => {
                        debug!(identity = %identity.id, holder = %session.identity.id, "store moved on, keeping its session");
                        return Err(race());
                    }
                    Ok(None) => {
                        debug!(identity = %identity.id, "store session already gone");
                        return Err(err);
                    }
                    Ok(Some(_)) => {}
                    Err(store_err) => warn!("reading store session before sign-out failed: {}", store_err),
                }
                warn!(email = %identity.email, "{}; forcing sign-out", err);
                if let Err(store_err) = self.store.sign_out().await {
                    warn!("forced sign-out failed: {}", store_err);
                }
                Err(err)
            }
        }
    }

    fn spawn_listener(self: &Arc<Self>, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        let context = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => context.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session events lagged, re-reading the stored session");
                        context.resync().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn resync(&self) {
        match self.store.get_session().await {
            Ok(Some(session)) => self.handle_event(SessionEvent::SignedIn(session)).await,
            Ok(None) => self.clear(),
            Err(err) => warn!("re-reading stored session failed: {}", err),
        }
    }
}
