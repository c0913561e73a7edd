//! Fluxoo access core.
//!
//! Resolves who is signed in to the school platform, which school and role
//! they act under, and what the web shell may show them. The hosted auth and
//! database service is reached through the `adapters` crate.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod services;

use std::sync::Arc;

use adapters::{CredentialStore, ProfileDirectory};
use axum::Router;

use auth::{ProfileResolver, SessionContext};
use config::Config;
use services::subscription::{FeatureGate, SubscriptionService};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionContext>,
    pub subscription: Arc<SubscriptionService>,
}

impl AppState {
    /// Wires the session context and subscription service over one backend.
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>, directory: Arc<dyn ProfileDirectory>) -> Self {
        let resolver = ProfileResolver::new(directory.clone(), &config.super_admin_emails);
        let gate = FeatureGate::new(&config.manual_payment_methods);
        Self {
            session: SessionContext::new(store, resolver),
            subscription: Arc::new(SubscriptionService::new(directory, gate)),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .nest("/auth", auth::auth_router())
        .nest("/api", api::pages::routes::pages_router(state.clone()))
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "Welcome to Fluxoo!"
}
