//! Core business logic for the authentication system.
//!
//! `ProfileResolver` maps an authenticated identity to its tenant and role by
//! probing, in a fixed order, the configured super-admin emails, the staff
//! profile table and the guardian profile table. The first match wins and any
//! failed read denies: an identity never gets a role that was not confirmed.

use std::sync::Arc;

use adapters::{Identity, ProfileDirectory, StaffProfileRow};
use tracing::{debug, instrument, warn};

use super::errors::AuthError;
use super::models::{ResolvedUser, Role};

pub struct ProfileResolver {
    directory: Arc<dyn ProfileDirectory>,
    super_admin_emails: Vec<String>,
}

impl ProfileResolver {
    pub fn new<I, S>(directory: Arc<dyn ProfileDirectory>, super_admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            directory,
            super_admin_emails: super_admin_emails
                .into_iter()
                .map(|email| email.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_super_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.super_admin_emails.iter().any(|candidate| *candidate == email)
    }

    /// Resolves `identity` or fails with `AuthError::NoProfileFound`.
    ///
    /// Performs at most one read per step and never writes. Invalidating the
    /// session after a failure is up to the caller, which knows whether the
    /// attempt is still current.
    #[instrument(skip(self, identity), fields(identity = %identity.id))]
    pub async fn resolve(&self, identity: &Identity) -> Result<ResolvedUser, AuthError> {
        if self.is_super_admin_email(&identity.email) {
            debug!("super-admin email match");
            return Ok(ResolvedUser::super_admin(identity.clone(), fallback_display_name(identity)));
        }

        match self.directory.staff_profile(&identity.id).await {
            Ok(Some(row)) if row.active => return staff_user(identity, row),
            Ok(Some(row)) => debug!(tenant = %row.tenant_id, "staff profile inactive, trying guardian"),
            Ok(None) => {}
            Err(err) => {
                warn!("staff profile lookup failed: {}", err);
                return Err(AuthError::no_profile(&identity.id));
            }
        }

        match self.directory.guardian_profile(&identity.id).await {
            Ok(Some(row)) => Ok(ResolvedUser::guardian(identity.clone(), row.tenant_id, row.name)),
            Ok(None) => Err(AuthError::no_profile(&identity.id)),
            Err(err) => {
                warn!("guardian profile lookup failed: {}", err);
                Err(AuthError::no_profile(&identity.id))
            }
        }
    }
}

fn staff_user(identity: &Identity, row: StaffProfileRow) -> Result<ResolvedUser, AuthError> {
    match Role::from_staff_column(&row.role) {
        Some(Role::Manager) => Ok(ResolvedUser::manager(identity.clone(), row.tenant_id, row.name)),
        Some(_) => Ok(ResolvedUser::staff(
            identity.clone(),
            row.tenant_id,
            row.name,
            row.areas_of_access,
        )),
        None => {
            warn!(role = %row.role, "staff profile carries an unknown role");
            Err(AuthError::no_profile(&identity.id))
        }
    }
}

/// Metadata display name, else the local part of the email.
fn fallback_display_name(identity: &Identity) -> String {
    identity
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            identity
                .email
                .split('@')
                .next()
                .unwrap_or(&identity.email)
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::{GuardianProfileRow, MemoryBackend};

    fn staff_row(id: &str, role: &str, active: bool) -> StaffProfileRow {
        StaffProfileRow {
            identity_id: id.to_string(),
            tenant_id: "T1".to_string(),
            role: role.to_string(),
            name: "Sofia".to_string(),
            active,
            areas_of_access: vec!["Financeiro".to_string()],
        }
    }

    fn guardian_row(id: &str) -> GuardianProfileRow {
        GuardianProfileRow {
            identity_id: id.to_string(),
            tenant_id: "T2".to_string(),
            name: "Carla".to_string(),
        }
    }

    fn resolver(backend: MemoryBackend) -> (Arc<MemoryBackend>, ProfileResolver) {
        let backend = Arc::new(backend);
        let resolver = ProfileResolver::new(backend.clone(), ["Admin@Fluxoo.edu"]);
        (backend, resolver)
    }

    #[tokio::test]
    async fn super_admin_wins_over_profile_rows_without_reading_tables() {
        let (backend, resolver) = resolver(
            MemoryBackend::new()
                .with_staff_profile(staff_row("a-1", "manager", true))
                .with_guardian_profile(guardian_row("a-1")),
        );

        let user = resolver.resolve(&Identity::new("a-1", "ADMIN@fluxoo.edu")).await.unwrap();

        assert_eq!(user.role(), Role::SuperAdmin);
        assert_eq!(user.tenant().as_str(), "super_admin");
        assert_eq!(user.display_name(), "ADMIN");
        assert_eq!(backend.lookup_count(), 0);
    }

    #[tokio::test]
    async fn super_admin_prefers_metadata_name() {
        let (_, resolver) = resolver(MemoryBackend::new());
        let identity = Identity::new("a-1", "admin@fluxoo.edu").with_display_name("Operações");
        let user = resolver.resolve(&identity).await.unwrap();
        assert_eq!(user.display_name(), "Operações");
    }

    #[tokio::test]
    async fn stored_role_column_is_authoritative() {
        let (_, resolver) = resolver(
            MemoryBackend::new()
                .with_staff_profile(staff_row("m-1", "manager", true))
                .with_staff_profile(staff_row("s-1", "staff", true)),
        );

        let manager = resolver.resolve(&Identity::new("m-1", "m@escola.edu")).await.unwrap();
        let staff = resolver.resolve(&Identity::new("s-1", "s@escola.edu")).await.unwrap();

        assert_eq!(manager.role(), Role::Manager);
        assert_eq!(manager.areas_of_access(), None);
        assert_eq!(staff.role(), Role::Staff);
        assert_eq!(staff.tenant().school_id(), Some("T1"));
        assert!(staff.areas_of_access().unwrap().contains("Financeiro"));
    }

    #[tokio::test]
    async fn inactive_staff_row_falls_through_to_guardian() {
        let (backend, resolver) = resolver(
            MemoryBackend::new()
                .with_staff_profile(staff_row("g-1", "manager", false))
                .with_guardian_profile(guardian_row("g-1")),
        );

        let user = resolver.resolve(&Identity::new("g-1", "g@familia.com")).await.unwrap();

        assert_eq!(user.role(), Role::Guardian);
        assert_eq!(user.tenant().school_id(), Some("T2"));
        assert_eq!(backend.lookup_count(), 2);
    }

    #[tokio::test]
    async fn inactive_staff_without_guardian_row_has_no_profile() {
        let (_, resolver) = resolver(MemoryBackend::new().with_staff_profile(staff_row("s-1", "staff", false)));
        let err = resolver.resolve(&Identity::new("s-1", "s@escola.edu")).await.unwrap_err();
        assert_eq!(err, AuthError::no_profile("s-1"));
    }

    #[tokio::test]
    async fn unknown_staff_role_is_denied() {
        let (_, resolver) = resolver(MemoryBackend::new().with_staff_profile(staff_row("s-1", "super_admin", true)));
        let err = resolver.resolve(&Identity::new("s-1", "s@escola.edu")).await.unwrap_err();
        assert_eq!(err, AuthError::no_profile("s-1"));
    }

    #[tokio::test]
    async fn lookup_failure_denies_instead_of_guessing() {
        let (backend, resolver) = resolver(MemoryBackend::new().with_guardian_profile(guardian_row("g-1")));
        backend.set_failing(true);

        let err = resolver.resolve(&Identity::new("g-1", "g@familia.com")).await.unwrap_err();

        assert_eq!(err, AuthError::no_profile("g-1"));
        assert_eq!(backend.lookup_count(), 1);
    }
}
