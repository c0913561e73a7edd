//! Data structures for authentication-related entities.
//!
//! This module defines the roles, the tenant scope and the resolved user the
//! rest of the backend routes on. A `ResolvedUser` can only be built through
//! role-specific constructors, so a super-admin always carries the platform
//! scope, every other role a concrete school, and only staff carry areas.

use std::collections::BTreeSet;
use std::fmt;

use adapters::Identity;
use serde::{Serialize, Serializer};

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_HOME: &str = "/admin/dashboard";
pub const PORTAL_HOME: &str = "/portal";
pub const STAFF_HOME: &str = "/dashboard";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Manager,
    Staff,
    Guardian,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Guardian => "guardian",
        }
    }

    /// Landing page a role is sent to when it reaches a zone it may not enter.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::SuperAdmin => ADMIN_HOME,
            Role::Guardian => PORTAL_HOME,
            Role::Manager | Role::Staff => STAFF_HOME,
        }
    }

    /// Parses the role column of a staff-profile row. Only school roles are valid there.
    pub fn from_staff_column(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tenant a user operates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Vendor operations across every school.
    Platform,
    School(String),
}

impl TenantScope {
    pub const PLATFORM_SENTINEL: &'static str = "super_admin";

    pub fn as_str(&self) -> &str {
        match self {
            TenantScope::Platform => Self::PLATFORM_SENTINEL,
            TenantScope::School(id) => id,
        }
    }

    pub fn school_id(&self) -> Option<&str> {
        match self {
            TenantScope::Platform => None,
            TenantScope::School(id) => Some(id),
        }
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TenantScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    identity: Identity,
    tenant_id: TenantScope,
    role: Role,
    display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    areas_of_access: Option<BTreeSet<String>>,
}

impl ResolvedUser {
    pub fn super_admin(identity: Identity, display_name: impl Into<String>) -> Self {
        Self {
            identity,
            tenant_id: TenantScope::Platform,
            role: Role::SuperAdmin,
            display_name: display_name.into(),
            areas_of_access: None,
        }
    }

    pub fn manager(identity: Identity, tenant_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity,
            tenant_id: TenantScope::School(tenant_id.into()),
            role: Role::Manager,
            display_name: display_name.into(),
            areas_of_access: None,
        }
    }

    pub fn staff<I, A>(identity: Identity, tenant_id: impl Into<String>, display_name: impl Into<String>, areas: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            identity,
            tenant_id: TenantScope::School(tenant_id.into()),
            role: Role::Staff,
            display_name: display_name.into(),
            areas_of_access: Some(areas.into_iter().map(Into::into).collect()),
        }
    }

    pub fn guardian(identity: Identity, tenant_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity,
            tenant_id: TenantScope::School(tenant_id.into()),
            role: Role::Guardian,
            display_name: display_name.into(),
            areas_of_access: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn identity_id(&self) -> &str {
        &self.identity.id
    }

    pub fn tenant(&self) -> &TenantScope {
        &self.tenant_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Areas a staff member may use. `None` for every other role.
    pub fn areas_of_access(&self) -> Option<&BTreeSet<String>> {
        self.areas_of_access.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_super_admin_gets_the_platform_sentinel() {
        let admin = ResolvedUser::super_admin(Identity::new("a", "admin@fluxoo.edu"), "admin");
        let manager = ResolvedUser::manager(Identity::new("m", "m@escola.edu"), "T1", "Marta");

        assert_eq!(admin.tenant().as_str(), "super_admin");
        assert_eq!(admin.tenant().school_id(), None);
        assert_eq!(manager.tenant().school_id(), Some("T1"));
    }

    #[test]
    fn staff_column_rejects_non_school_roles() {
        assert_eq!(Role::from_staff_column(" Manager "), Some(Role::Manager));
        assert_eq!(Role::from_staff_column("staff"), Some(Role::Staff));
        assert_eq!(Role::from_staff_column("super_admin"), None);
        assert_eq!(Role::from_staff_column("guardian"), None);
    }

    #[test]
    fn serializes_tenant_as_plain_string() {
        let user = ResolvedUser::staff(Identity::new("s", "s@escola.edu"), "T1", "Sofia", ["Financeiro"]);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["tenant_id"], "T1");
        assert_eq!(json["role"], "staff");
        assert_eq!(json["areas_of_access"], serde_json::json!(["Financeiro"]));
    }
}
