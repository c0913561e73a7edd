//! Route guarding for the three page zones and the API.
//!
//! `RouteGuard` decides whether the current session may enter a zone: wait
//! while the session is still loading, send anonymous visitors to the login
//! page (remembering where they were going), and bounce roles outside the
//! zone's policy to their own home page. `require_user` is the axum
//! counterpart for API routes that need a resolved user.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

use super::models::{ResolvedUser, Role, LOGIN_PATH};
use super::session::SessionSnapshot;
use crate::errors::AppError;
use crate::AppState;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session still loading; render a neutral waiting state.
    Wait,
    Allow,
    RedirectTo { path: String, from: Option<String> },
}

impl GuardDecision {
    /// Browser location for a redirect, with the bounce-back path as `?redirect=`.
    pub fn location(&self) -> Option<String> {
        match self {
            GuardDecision::RedirectTo { path, from: Some(from) } => {
                Some(format!("{}?redirect={}", path, urlencoding::encode(from)))
            }
            GuardDecision::RedirectTo { path, from: None } => Some(path.clone()),
            _ => None,
        }
    }
}

pub fn can_enter(
    user: Option<&ResolvedUser>,
    loading: bool,
    allowed_roles: Option<&[Role]>,
    requested_path: &str,
) -> GuardDecision {
    if loading {
        return GuardDecision::Wait;
    }
    let Some(user) = user else {
        return GuardDecision::RedirectTo {
            path: LOGIN_PATH.to_string(),
            from: Some(requested_path.to_string()),
        };
    };
    match allowed_roles {
        Some(roles) if !roles.contains(&user.role()) => GuardDecision::RedirectTo {
            path: user.role().home_path().to_string(),
            from: None,
        },
        _ => GuardDecision::Allow,
    }
}

/// One guard instance wraps each zone of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGuard {
    allowed_roles: Option<&'static [Role]>,
}

impl RouteGuard {
    /// Any authenticated role may enter.
    pub const fn open() -> Self {
        Self { allowed_roles: None }
    }

    pub const fn roles(allowed_roles: &'static [Role]) -> Self {
        Self {
            allowed_roles: Some(allowed_roles),
        }
    }

    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        self.allowed_roles
    }

    pub fn check(&self, session: &SessionSnapshot, requested_path: &str) -> GuardDecision {
        can_enter(session.user.as_ref(), session.loading, self.allowed_roles, requested_path)
    }
}

/// Rejects API calls made without a resolved user and hands the user to the handler.
pub async fn require_user(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let snapshot = state.session.snapshot();
    let user = match snapshot.user {
        Some(user) if !snapshot.loading => user,
        _ => return Err(AppError::Unauthorized),
    };
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::Identity;

    const STAFF_ZONE: &[Role] = &[Role::Manager, Role::Staff];

    fn admin() -> ResolvedUser {
        ResolvedUser::super_admin(Identity::new("a", "admin@fluxoo.edu"), "admin")
    }

    #[test]
    fn waits_while_loading_even_without_user() {
        assert_eq!(can_enter(None, true, Some(STAFF_ZONE), "/alunos"), GuardDecision::Wait);
        assert_eq!(can_enter(Some(&admin()), true, Some(STAFF_ZONE), "/alunos"), GuardDecision::Wait);
    }

    #[test]
    fn anonymous_goes_to_login_with_bounce_back() {
        let decision = can_enter(None, false, Some(STAFF_ZONE), "/financeiro/cobrancas");
        assert_eq!(
            decision,
            GuardDecision::RedirectTo {
                path: "/login".to_string(),
                from: Some("/financeiro/cobrancas".to_string()),
            }
        );
        assert_eq!(
            decision.location().as_deref(),
            Some("/login?redirect=%2Ffinanceiro%2Fcobrancas")
        );
    }

    #[test]
    fn wrong_role_goes_home_not_to_an_error() {
        let decision = can_enter(Some(&admin()), false, Some(STAFF_ZONE), "/alunos");
        assert_eq!(decision.location().as_deref(), Some("/admin/dashboard"));

        let guardian = ResolvedUser::guardian(Identity::new("g", "g@familia.com"), "T1", "Carla");
        let decision = can_enter(Some(&guardian), false, Some(STAFF_ZONE), "/alunos");
        assert_eq!(decision.location().as_deref(), Some("/portal"));

        let staff = ResolvedUser::staff(Identity::new("s", "s@escola.edu"), "T1", "Sofia", Vec::<String>::new());
        let decision = can_enter(Some(&staff), false, Some(&[Role::SuperAdmin]), "/admin/escolas");
        assert_eq!(decision.location().as_deref(), Some("/dashboard"));
    }

    #[test]
    fn member_role_and_open_groups_are_allowed() {
        let manager = ResolvedUser::manager(Identity::new("m", "m@escola.edu"), "T1", "Marta");
        assert_eq!(can_enter(Some(&manager), false, Some(STAFF_ZONE), "/alunos"), GuardDecision::Allow);
        assert_eq!(can_enter(Some(&admin()), false, None, "/perfil"), GuardDecision::Allow);
        assert_eq!(RouteGuard::open().allowed_roles(), None);
    }
}
