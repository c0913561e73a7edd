//! Generic data models for the `adapters` crate.
//!
//! These models are the abstracted view of what the hosted auth/database
//! service hands back: identities, sessions, session-change events and the
//! profile/billing rows. Every adapter implementation produces these same
//! shapes so the backend never sees provider-specific payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated account as known by the credential store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    /// Display name taken from the account's profile metadata, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Session-change notifications broadcast by a credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SignedIn(_) => "SIGNED_IN",
            SessionEvent::SignedOut => "SIGNED_OUT",
            SessionEvent::TokenRefreshed(_) => "TOKEN_REFRESHED",
        }
    }
}

/// Row of the school staff profile table, keyed by the identity id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StaffProfileRow {
    #[serde(alias = "user_id")]
    pub identity_id: String,
    #[serde(alias = "escola_id")]
    pub tenant_id: String,
    /// Stored role attribute, expected to be `manager` or `staff`.
    #[serde(alias = "funcao")]
    pub role: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "ativo", default)]
    pub active: bool,
    #[serde(
        alias = "areas_acesso",
        alias = "areasAcesso",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub areas_of_access: Vec<String>,
}

/// Row of the guardian profile table, keyed by the identity id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GuardianProfileRow {
    #[serde(alias = "user_id")]
    pub identity_id: String,
    #[serde(alias = "escola_id")]
    pub tenant_id: String,
    #[serde(alias = "nome")]
    pub name: String,
}

/// Billing columns of a tenant row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BillingRecord {
    #[serde(alias = "id")]
    pub tenant_id: String,
    #[serde(alias = "status_assinatura", alias = "subscription_status")]
    pub status: String,
    #[serde(alias = "metodo_pagamento")]
    pub payment_method: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
