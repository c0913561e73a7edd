//! Page access decisions and the navigation menu of the current user.
//!
//! `page_outcome` runs a requested path through the zone's route guard, the
//! subscription lock and the page's area requirement, in that order.
//! `navigation_for` builds the menu the shell renders for the user's zone.

use serde::Serialize;

use super::route_table::{find_route, is_public, normalize, zone_for_path, zone_for_role};
use super::subscription::LockState;
use crate::auth::{has_access, GuardDecision, ResolvedUser, SessionSnapshot};

pub const BLOCKED_NOTICE: &str =
    "Esta área fica disponível após a confirmação do pagamento da assinatura.";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageOutcome {
    Public,
    /// Session still loading; show a neutral placeholder.
    Waiting,
    Redirect { location: String },
    NotFound,
    /// Subscription lock notice in place of the page content.
    Blocked { notice: &'static str },
    /// In-place denial for a missing area; the user stays on the page.
    AccessDenied { area: &'static str },
    Render {
        zone: &'static str,
        group: &'static str,
        title: &'static str,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NavItemView {
    pub path: &'static str,
    pub label: &'static str,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NavGroupView {
    pub id: &'static str,
    pub label: &'static str,
    pub disabled: bool,
    pub items: Vec<NavItemView>,
}

/// Decides what the shell shows for `path`.
///
/// `lock` is the subscription state of the signed-in user; `None` is read as
/// not loaded, which never blocks.
pub fn page_outcome(session: &SessionSnapshot, lock: Option<&LockState>, requested: &str) -> PageOutcome {
    let path = normalize(requested);
    if is_public(path) {
        return PageOutcome::Public;
    }

    let zone = zone_for_path(path);
    match zone.guard.check(session, requested) {
        GuardDecision::Wait => return PageOutcome::Waiting,
        decision @ GuardDecision::RedirectTo { .. } => {
            return PageOutcome::Redirect {
                location: decision.location().unwrap_or_default(),
            }
        }
        GuardDecision::Allow => {}
    }
    let Some(user) = session.user.as_ref() else {
        return PageOutcome::Waiting;
    };

    let Some(found) = find_route(path) else {
        return PageOutcome::NotFound;
    };
    let blocked = lock.is_some_and(|lock| lock.blocked);
    if found.zone.lockable && blocked && !found.group.primary {
        return PageOutcome::Blocked { notice: BLOCKED_NOTICE };
    }
    if let Some(area) = found.route.area {
        if !has_access(user, area) {
            return PageOutcome::AccessDenied { area };
        }
    }
    PageOutcome::Render {
        zone: found.zone.id,
        group: found.group.id,
        title: found.route.title,
    }
}

pub fn navigation_for(user: &ResolvedUser, lock: &LockState) -> Vec<NavGroupView> {
    let zone = zone_for_role(user.role());
    zone.groups
        .iter()
        .filter_map(|group| {
            let items: Vec<NavItemView> = group
                .routes
                .iter()
                .filter(|route| route.area.map_or(true, |area| has_access(user, area)))
                .map(|route| NavItemView {
                    path: route.path,
                    label: route.title,
                })
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(NavGroupView {
                id: group.id,
                label: group.label,
                disabled: zone.lockable && lock.blocked && !group.primary,
                items,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::Identity;

    fn snapshot(user: Option<ResolvedUser>) -> SessionSnapshot {
        SessionSnapshot::settled(user)
    }

    fn blocked() -> LockState {
        LockState {
            blocked: true,
            loaded: true,
            status: Some("pending".to_string()),
            payment_method: Some("pix".to_string()),
        }
    }

    fn staff(areas: &[&str]) -> ResolvedUser {
        ResolvedUser::staff(Identity::new("s", "s@escola.edu"), "T1", "Sofia", areas.iter().copied())
    }

    #[test]
    fn super_admin_on_staff_route_is_sent_to_admin_home() {
        let admin = ResolvedUser::super_admin(Identity::new("a", "admin@fluxoo.edu"), "admin");
        assert_eq!(
            page_outcome(&snapshot(Some(admin)), None, "/alunos"),
            PageOutcome::Redirect {
                location: "/admin/dashboard".to_string()
            }
        );
    }

    #[test]
    fn missing_area_is_denied_in_place() {
        let outcome = page_outcome(&snapshot(Some(staff(&["Financeiro"]))), None, "/alunos");
        assert_eq!(outcome, PageOutcome::AccessDenied { area: "Pedagogico" });

        let outcome = page_outcome(&snapshot(Some(staff(&["Financeiro"]))), None, "/cobrancas");
        assert!(matches!(outcome, PageOutcome::Render { group: "financeiro", .. }));
    }

    #[test]
    fn lock_blocks_everything_but_the_dashboard_group() {
        let manager = ResolvedUser::manager(Identity::new("m", "m@escola.edu"), "T1", "Marta");
        let session = snapshot(Some(manager));

        assert_eq!(
            page_outcome(&session, Some(&blocked()), "/financeiro"),
            PageOutcome::Blocked { notice: BLOCKED_NOTICE }
        );
        assert!(matches!(
            page_outcome(&session, Some(&blocked()), "/assinatura"),
            PageOutcome::Render { group: "dashboard", .. }
        ));
        assert!(matches!(
            page_outcome(&session, Some(&LockState::unlocked()), "/financeiro"),
            PageOutcome::Render { .. }
        ));
    }

    #[test]
    fn anonymous_and_loading_sessions() {
        assert_eq!(
            page_outcome(&snapshot(None), None, "/turmas?ano=2024"),
            PageOutcome::Redirect {
                location: "/login?redirect=%2Fturmas%3Fano%3D2024".to_string()
            }
        );
        assert_eq!(page_outcome(&SessionSnapshot::default(), None, "/turmas"), PageOutcome::Waiting);
        assert_eq!(page_outcome(&snapshot(None), None, "/login"), PageOutcome::Public);
    }

    #[test]
    fn unknown_page_inside_allowed_zone_is_not_found() {
        let guardian = ResolvedUser::guardian(Identity::new("g", "g@familia.com"), "T1", "Carla");
        assert_eq!(
            page_outcome(&snapshot(Some(guardian)), None, "/portal/segredos"),
            PageOutcome::NotFound
        );
    }

    #[test]
    fn menu_hides_missing_areas_and_disables_locked_groups() {
        let menu = navigation_for(&staff(&["Financeiro"]), &blocked());
        let ids: Vec<_> = menu.iter().map(|group| (group.id, group.disabled)).collect();
        assert_eq!(ids, vec![("dashboard", false), ("financeiro", true)]);
    }

    #[test]
    fn guardian_menu_is_the_portal_and_never_locked() {
        let guardian = ResolvedUser::guardian(Identity::new("g", "g@familia.com"), "T1", "Carla");
        let menu = navigation_for(&guardian, &blocked());
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].id, "familia");
        assert!(!menu[0].disabled);
        assert_eq!(menu[0].items.len(), 4);
    }
}
