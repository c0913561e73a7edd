//! Subscription lock derived from the tenant's billing record.
//!
//! A school paying by a manual method (pix, boleto) whose subscription is not
//! active gets every navigation group but the dashboard disabled until the
//! payment is confirmed. Card payments never lock, and neither does the
//! platform operator.

use std::sync::Arc;

use adapters::ProfileDirectory;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{ResolvedUser, Role};

pub const ACTIVE_STATUS: &str = "active";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGate {
    manual_payment_methods: Vec<String>,
}

impl FeatureGate {
    pub fn new<I, S>(manual_payment_methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            manual_payment_methods: manual_payment_methods
                .into_iter()
                .map(|method| method.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn is_blocked(&self, status: &str, payment_method: &str, loaded: bool) -> bool {
        if !loaded || status.trim().eq_ignore_ascii_case(ACTIVE_STATUS) {
            return false;
        }
        let method = payment_method.trim().to_lowercase();
        self.manual_payment_methods.iter().any(|manual| *manual == method)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LockState {
    pub blocked: bool,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl LockState {
    /// State for users the lock never applies to.
    pub fn unlocked() -> Self {
        Self {
            blocked: false,
            loaded: true,
            status: None,
            payment_method: None,
        }
    }

    fn not_loaded() -> Self {
        Self {
            blocked: false,
            loaded: false,
            status: None,
            payment_method: None,
        }
    }
}

pub struct SubscriptionService {
    directory: Arc<dyn ProfileDirectory>,
    gate: FeatureGate,
}

impl SubscriptionService {
    pub fn new(directory: Arc<dyn ProfileDirectory>, gate: FeatureGate) -> Self {
        Self { directory, gate }
    }

    pub fn gate(&self) -> &FeatureGate {
        &self.gate
    }

    /// Reads the billing record of the user's school and evaluates the gate.
    pub async fn lock_state(&self, user: &ResolvedUser) -> LockState {
        if user.role() == Role::SuperAdmin {
            return LockState::unlocked();
        }
        let Some(tenant_id) = user.tenant().school_id() else {
            return LockState::unlocked();
        };

        match self.directory.billing_record(tenant_id).await {
            Ok(Some(record)) => {
                let blocked = self.gate.is_blocked(&record.status, &record.payment_method, true);
                debug!(tenant = tenant_id, status = %record.status, blocked, "subscription evaluated");
                LockState {
                    blocked,
                    loaded: true,
                    status: Some(record.status),
                    payment_method: Some(record.payment_method),
                }
            }
            Ok(None) => {
                warn!(tenant = tenant_id, "no billing record for tenant");
                LockState::not_loaded()
            }
            Err(err) => {
                warn!(tenant = tenant_id, "billing lookup failed: {}", err);
                LockState::not_loaded()
            }
        }
    }
}
