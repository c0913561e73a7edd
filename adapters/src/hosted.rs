//! Hosted implementation of the credential store and profile directory.
//!
//! This file contains the REST client for the hosted auth service
//! (`/auth/v1`) and its auto-generated table API (`/rest/v1`), including the
//! payload decoding specific to those endpoints. Row-level security on the
//! service side scopes every table read to the signed-in account, so reads
//! carry the session's access token when one is held.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use crate::errors::AdapterError;
use crate::models::{BillingRecord, GuardianProfileRow, Identity, Session, SessionEvent, StaffProfileRow};
use crate::{CredentialStore, ProfileDirectory, EVENT_CAPACITY};

const STAFF_ACTIVE_COLUMN: &str = "ativo";

/// Names of the tables the directory reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub staff: String,
    pub guardians: String,
    pub tenants: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            staff: "usuarios_sistema".to_string(),
            guardians: "responsaveis".to_string(),
            tenants: "escolas".to_string(),
        }
    }
}

pub struct HostedBackend {
    http: Client,
    base_url: String,
    api_key: String,
    tables: TableNames,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserPayload,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl HostedBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, tables: TableNames) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            tables,
            session: Mutex::new(None),
            events,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Equality filters are joined in order; the service returns at most one row.
    fn table_url(&self, table: &str, filters: &[(&str, &str)]) -> String {
        let query: String = filters
            .iter()
            .map(|(column, value)| format!("{}=eq.{}&", column, urlencoding::encode(value)))
            .collect();
        format!("{}/rest/v1/{}?{}select=*&limit=1", self.base_url, table, query)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.api_key)
    }

    fn emit(&self, event: SessionEvent) {
        log::debug!("hosted store emitting {}", event.kind());
        let _ = self.events.send(event);
    }

    async fn grant(&self, grant_type: &str, body: Value) -> Result<Session, AdapterError> {
        let url = format!("{}?grant_type={}", self.auth_url("token"), grant_type);
        let response = self.with_key(self.http.post(url)).json(&body).send().await?;

        if response.status() == StatusCode::BAD_REQUEST || response.status() == StatusCode::UNAUTHORIZED {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(AdapterError::InvalidCredentials(error_message(&body)));
        }
        let body: Value = ensure_success(response).await?.json().await?;
        decode_token_response(body)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AdapterError> {
        self.grant("refresh_token", serde_json::json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn fetch_first<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, &str)]) -> Result<Option<T>, AdapterError> {
        let bearer = match self.session.lock().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.api_key.clone(),
        };
        let response = self
            .with_key(self.http.get(self.table_url(table, filters)))
            .bearer_auth(bearer)
            .send()
            .await?;
        let rows: Vec<Value> = ensure_success(response).await?.json().await?;
        first_row(rows)
    }
}

#[async_trait]
impl CredentialStore for HostedBackend {
    async fn get_session(&self) -> Result<Option<Session>, AdapterError> {
        let mut current = self.session.lock().await;
        let Some(session) = current.clone() else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        let refreshed = match session.refresh_token.as_deref() {
            Some(token) => self.refresh(token).await,
            None => Err(AdapterError::NoSession),
        };
        match refreshed {
            Ok(fresh) => {
                *current = Some(fresh.clone());
                self.emit(SessionEvent::TokenRefreshed(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(err) => {
                log::warn!("dropping expired session for {}: {}", session.identity.email, err);
                *current = None;
                self.emit(SessionEvent::SignedOut);
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AdapterError> {
        let session = self
            .grant("password", serde_json::json!({ "email": email, "password": password }))
            .await?;
        *self.session.lock().await = Some(session.clone());
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AdapterError> {
        let previous = self.session.lock().await.take();
        if let Some(session) = previous {
            let result = self
                .with_key(self.http.post(self.auth_url("logout")))
                .bearer_auth(&session.access_token)
                .send()
                .await;
            // The local session is gone either way; a failed revoke only leaves
            // the token to expire on the service side.
            match result {
                Ok(response) if !response.status().is_success() => {
                    log::warn!("logout for {} answered {}", session.identity.email, response.status());
                }
                Err(err) => log::warn!("logout for {} failed: {}", session.identity.email, err),
                Ok(_) => {}
            }
        }
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ProfileDirectory for HostedBackend {
    async fn staff_profile(&self, identity_id: &str) -> Result<Option<StaffProfileRow>, AdapterError> {
        self.fetch_first(&self.tables.staff, &staff_filters(identity_id)).await
    }

    async fn guardian_profile(&self, identity_id: &str) -> Result<Option<GuardianProfileRow>, AdapterError> {
        self.fetch_first(&self.tables.guardians, &[("user_id", identity_id)]).await
    }

    async fn billing_record(&self, tenant_id: &str) -> Result<Option<BillingRecord>, AdapterError> {
        self.fetch_first(&self.tables.tenants, &[("id", tenant_id)]).await
    }
}

/// Only active staff rows count; an inactive row from another school must not
/// shadow an active one.
fn staff_filters(identity_id: &str) -> [(&str, &str); 2] {
    [("user_id", identity_id), (STAFF_ACTIVE_COLUMN, "true")]
}

async fn ensure_success(response: Response) -> Result<Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: Value = response.json().await.unwrap_or(Value::Null);
    Err(AdapterError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Picks the human-readable message out of an auth/rest error body.
fn error_message(body: &Value) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .unwrap_or("Request refused")
        .to_string()
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, AdapterError> {
    rows.into_iter()
        .next()
        .map(|row| serde_json::from_value(row).map_err(|err| AdapterError::Decode(err.to_string())))
        .transpose()
}

fn decode_token_response(body: Value) -> Result<Session, AdapterError> {
    let token: TokenResponse =
        serde_json::from_value(body).map_err(|err| AdapterError::Decode(err.to_string()))?;

    let expires_at = match (token.expires_at, token.expires_in) {
        (Some(at), _) => Utc
            .timestamp_opt(at, 0)
            .single()
            .ok_or_else(|| AdapterError::Decode(format!("invalid expires_at {}", at)))?,
        (None, Some(seconds)) => Utc::now() + chrono::Duration::seconds(seconds),
        (None, None) => return Err(AdapterError::Decode("token without expiry".to_string())),
    };

    let email = token
        .user
        .email
        .ok_or_else(|| AdapterError::Decode("user without email".to_string()))?;
    let display_name = ["name", "full_name", "nome"]
        .iter()
        .find_map(|key| token.user.user_metadata.get(*key).and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string);

    Ok(Session {
        identity: Identity {
            id: token.user.id,
            email,
            display_name,
        },
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_password_grant_payload() {
        let session = decode_token_response(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "refresh_token": "r1",
            "user": {
                "id": "8d7f",
                "email": "ana@escola.edu",
                "user_metadata": { "full_name": "Ana Souza" }
            }
        }))
        .unwrap();

        assert_eq!(session.identity.id, "8d7f");
        assert_eq!(session.identity.display_name.as_deref(), Some("Ana Souza"));
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert_eq!(session.expires_at.timestamp(), 1_900_000_000);
    }

    #[test]
    fn token_without_expiry_is_rejected() {
        let err = decode_token_response(json!({
            "access_token": "jwt",
            "user": { "id": "8d7f", "email": "ana@escola.edu" }
        }))
        .unwrap_err();
        assert!(matches!(err, AdapterError::Decode(_)));
    }

    #[test]
    fn error_message_prefers_description() {
        let body = json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" });
        assert_eq!(error_message(&body), "Invalid login credentials");
        assert_eq!(error_message(&json!({ "msg": "Email not confirmed" })), "Email not confirmed");
        assert_eq!(error_message(&Value::Null), "Request refused");
    }

    #[test]
    fn first_row_maps_empty_result_to_none() {
        let none: Option<GuardianProfileRow> = first_row(Vec::new()).unwrap();
        assert_eq!(none, None);

        let row: Option<GuardianProfileRow> = first_row(vec![json!({
            "user_id": "g-1",
            "escola_id": "T1",
            "nome": "Carla"
        })])
        .unwrap();
        assert_eq!(row.unwrap().tenant_id, "T1");
    }

    #[test]
    fn table_url_filters_on_encoded_value() {
        let backend = HostedBackend::new("https://db.example.com/", "anon", TableNames::default());
        assert_eq!(
            backend.table_url("escolas", &[("id", "a b")]),
            "https://db.example.com/rest/v1/escolas?id=eq.a%20b&select=*&limit=1"
        );
    }

    #[test]
    fn staff_lookup_only_asks_for_active_rows() {
        let backend = HostedBackend::new("https://db.example.com", "anon", TableNames::default());
        assert_eq!(
            backend.table_url("usuarios_sistema", &staff_filters("u-1")),
            "https://db.example.com/rest/v1/usuarios_sistema?user_id=eq.u-1&ativo=eq.true&select=*&limit=1"
        );
    }
}
