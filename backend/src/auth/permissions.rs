//! Named-area permission checks.
//!
//! Super-admins and managers have every area of their tenant. Staff only have
//! the areas listed on their profile, and a missing list means none. Guardians
//! never pass an area check: the portal is gated by role alone.

use super::models::{ResolvedUser, Role};

pub fn has_access(user: &ResolvedUser, area: &str) -> bool {
    match user.role() {
        Role::SuperAdmin | Role::Manager => true,
        Role::Staff => user.areas_of_access().is_some_and(|areas| areas.contains(area)),
        Role::Guardian => false,
    }
}

pub fn has_access_any<S: AsRef<str>>(user: &ResolvedUser, areas: &[S]) -> bool {
    areas.iter().any(|area| has_access(user, area.as_ref()))
}

pub fn has_access_all<S: AsRef<str>>(user: &ResolvedUser, areas: &[S]) -> bool {
    if user.role() == Role::Guardian {
        return false;
    }
    areas.iter().all(|area| has_access(user, area.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::Identity;

    fn staff(areas: &[&str]) -> ResolvedUser {
        ResolvedUser::staff(Identity::new("s", "s@escola.edu"), "T1", "Sofia", areas.iter().copied())
    }

    #[test]
    fn staff_only_reaches_listed_areas() {
        let user = staff(&["Financeiro"]);
        assert!(has_access(&user, "Financeiro"));
        assert!(!has_access(&user, "Pedagogico"));
        assert!(!has_access(&user, "financeiro"));
    }

    #[test]
    fn empty_area_list_is_no_access() {
        let user = staff(&[]);
        assert!(!has_access(&user, "Financeiro"));
        assert!(!has_access_any(&user, &["Financeiro", "Pedagogico"]));
    }

    #[test]
    fn full_access_roles_and_guardian() {
        let admin = ResolvedUser::super_admin(Identity::new("a", "admin@fluxoo.edu"), "admin");
        let manager = ResolvedUser::manager(Identity::new("m", "m@escola.edu"), "T1", "Marta");
        let guardian = ResolvedUser::guardian(Identity::new("g", "g@familia.com"), "T1", "Carla");

        assert!(has_access(&admin, "Financeiro"));
        assert!(has_access_all(&manager, &["Financeiro", "Pedagogico"]));
        assert!(!has_access(&guardian, "Financeiro"));
        assert!(!has_access_all(&guardian, &[] as &[&str]));
    }

    #[test]
    fn any_and_all_combine_per_area() {
        let user = staff(&["Financeiro", "Comunicacao"]);
        assert!(has_access_any(&user, &["Pedagogico", "Comunicacao"]));
        assert!(!has_access_all(&user, &["Pedagogico", "Comunicacao"]));
        assert!(has_access_all(&user, &["Financeiro", "Comunicacao"]));
        assert!(has_access_all(&user, &[] as &[&str]));
    }
}
