//! Central module for application-wide configuration settings.
//!
//! Settings come from `FLUXOO_*` environment variables: the listen address,
//! the hosted service endpoint and key, the super-admin emails, the payment
//! methods that lock an unpaid subscription, and the profile table names.

use std::net::SocketAddr;

use adapters::TableNames;
use thiserror::Error;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SUPER_ADMIN: &str = "admin@fluxoo.edu";
pub const DEFAULT_MANUAL_PAYMENT_METHODS: &[&str] = &["pix", "boleto"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid listen address {value:?} in {var}")]
    InvalidAddress { var: &'static str, value: String },
    #[error("{present} is set but {missing} is not")]
    MissingPair {
        present: &'static str,
        missing: &'static str,
    },
    #[error("{0} must list at least one value")]
    EmptyList(&'static str),
}

/// Where the hosted auth/database service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub http_addr: SocketAddr,
    /// `None` runs against an empty in-memory backend.
    pub store: Option<StoreConfig>,
    pub super_admin_emails: Vec<String>,
    pub manual_payment_methods: Vec<String>,
    pub tables: TableNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store: None,
            super_admin_emails: vec![DEFAULT_SUPER_ADMIN.to_string()],
            manual_payment_methods: DEFAULT_MANUAL_PAYMENT_METHODS.iter().map(|m| m.to_string()).collect(),
            tables: TableNames::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source; unset or blank values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let http_addr = match get("FLUXOO_HTTP_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidAddress {
                var: "FLUXOO_HTTP_ADDR",
                value,
            })?,
            None => defaults.http_addr,
        };

        let store = match (get("FLUXOO_STORE_URL"), get("FLUXOO_STORE_KEY")) {
            (Some(url), Some(api_key)) => Some(StoreConfig { url, api_key }),
            (Some(_), None) => {
                return Err(ConfigError::MissingPair {
                    present: "FLUXOO_STORE_URL",
                    missing: "FLUXOO_STORE_KEY",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingPair {
                    present: "FLUXOO_STORE_KEY",
                    missing: "FLUXOO_STORE_URL",
                })
            }
            (None, None) => None,
        };

        let super_admin_emails = match get("FLUXOO_SUPER_ADMIN_EMAILS") {
            Some(value) => split_list("FLUXOO_SUPER_ADMIN_EMAILS", &value)?,
            None => defaults.super_admin_emails,
        };
        let manual_payment_methods = match get("FLUXOO_MANUAL_PAYMENT_METHODS") {
            Some(value) => split_list("FLUXOO_MANUAL_PAYMENT_METHODS", &value)?,
            None => defaults.manual_payment_methods,
        };

        let tables = TableNames {
            staff: get("FLUXOO_STAFF_TABLE").unwrap_or(defaults.tables.staff),
            guardians: get("FLUXOO_GUARDIAN_TABLE").unwrap_or(defaults.tables.guardians),
            tenants: get("FLUXOO_TENANT_TABLE").unwrap_or(defaults.tables.tenants),
        };

        Ok(Config {
            http_addr,
            store,
            super_admin_emails,
            manual_payment_methods,
            tables,
        })
    }
}

fn split_list(var: &'static str, value: &str) -> Result<Vec<String>, ConfigError> {
    let items: Vec<String> = value
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return Err(ConfigError::EmptyList(var));
    }
    Ok(items)
}
