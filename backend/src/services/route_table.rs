//! Static page table of the web shell.
//!
//! Pages are organised in three zones, each wrapped by one route guard: the
//! vendor console under `/admin`, the guardian portal under `/portal`, and the
//! school staff panel for every other path. Within a zone pages belong to
//! navigation groups; staff pages may additionally require a named area.

use crate::auth::{RouteGuard, Role, LOGIN_PATH};

#[derive(Debug)]
pub struct PageRoute {
    pub path: &'static str,
    pub title: &'static str,
    pub area: Option<&'static str>,
}

#[derive(Debug)]
pub struct NavGroup {
    pub id: &'static str,
    pub label: &'static str,
    /// The dashboard group stays reachable while the subscription is locked.
    pub primary: bool,
    pub routes: &'static [PageRoute],
}

#[derive(Debug)]
pub struct Zone {
    pub id: &'static str,
    /// `None` for the staff zone, which takes every path the others do not.
    pub prefix: Option<&'static str>,
    pub guard: RouteGuard,
    /// Whether the subscription lock applies inside this zone.
    pub lockable: bool,
    pub groups: &'static [NavGroup],
}

#[derive(Debug, Clone, Copy)]
pub struct RouteMatch {
    pub zone: &'static Zone,
    pub group: &'static NavGroup,
    pub route: &'static PageRoute,
}

pub const PUBLIC_PATHS: &[&str] = &[LOGIN_PATH, "/recuperar-senha"];

const fn page(path: &'static str, title: &'static str, area: Option<&'static str>) -> PageRoute {
    PageRoute { path, title, area }
}

pub static ADMIN_ZONE: Zone = Zone {
    id: "admin",
    prefix: Some("/admin"),
    guard: RouteGuard::roles(&[Role::SuperAdmin]),
    lockable: false,
    groups: &[NavGroup {
        id: "plataforma",
        label: "Plataforma",
        primary: true,
        routes: &[
            page("/admin/dashboard", "Painel", None),
            page("/admin/escolas", "Escolas", None),
            page("/admin/planos", "Planos", None),
            page("/admin/faturas", "Faturas", None),
        ],
    }],
};

pub static PORTAL_ZONE: Zone = Zone {
    id: "portal",
    prefix: Some("/portal"),
    guard: RouteGuard::roles(&[Role::Guardian]),
    lockable: false,
    groups: &[NavGroup {
        id: "familia",
        label: "Família",
        primary: true,
        routes: &[
            page("/portal", "Início", None),
            page("/portal/boletins", "Boletins", None),
            page("/portal/financeiro", "Mensalidades", None),
            page("/portal/fila-virtual", "Fila de saída", None),
        ],
    }],
};

pub static STAFF_ZONE: Zone = Zone {
    id: "escola",
    prefix: None,
    guard: RouteGuard::roles(&[Role::Manager, Role::Staff]),
    lockable: true,
    groups: &[
        NavGroup {
            id: "dashboard",
            label: "Painel",
            primary: true,
            routes: &[
                page("/dashboard", "Painel", None),
                page("/assinatura", "Assinatura", None),
                page("/perfil", "Meu perfil", None),
            ],
        },
        NavGroup {
            id: "pedagogico",
            label: "Pedagógico",
            primary: false,
            routes: &[
                page("/alunos", "Alunos", Some("Pedagogico")),
                page("/turmas", "Turmas", Some("Pedagogico")),
                page("/frequencia", "Frequência", Some("Pedagogico")),
                page("/notas", "Notas", Some("Pedagogico")),
            ],
        },
        NavGroup {
            id: "financeiro",
            label: "Financeiro",
            primary: false,
            routes: &[
                page("/financeiro", "Financeiro", Some("Financeiro")),
                page("/cobrancas", "Cobranças", Some("Financeiro")),
            ],
        },
        NavGroup {
            id: "comunicacao",
            label: "Comunicação",
            primary: false,
            routes: &[
                page("/mural", "Mural", Some("Comunicacao")),
                page("/fila-virtual", "Fila de saída", Some("Comunicacao")),
            ],
        },
        NavGroup {
            id: "gestao",
            label: "Gestão",
            primary: false,
            routes: &[
                page("/usuarios", "Usuários", Some("Configuracoes")),
                page("/configuracoes", "Configurações", Some("Configuracoes")),
            ],
        },
    ],
};

pub static ZONES: [&Zone; 3] = [&ADMIN_ZONE, &PORTAL_ZONE, &STAFF_ZONE];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|public| path_matches(public, path))
}

/// `pattern` matches itself and anything below it, never a longer sibling.
fn path_matches(pattern: &str, path: &str) -> bool {
    match path.strip_prefix(pattern) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || pattern.ends_with('/'),
        None => false,
    }
}

/// Strips the query string, fragment and trailing slash.
pub fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

pub fn zone_for_path(path: &str) -> &'static Zone {
    ZONES
        .iter()
        .copied()
        .find(|zone| zone.prefix.is_some_and(|prefix| path_matches(prefix, path)))
        .unwrap_or(&STAFF_ZONE)
}

pub fn zone_for_role(role: Role) -> &'static Zone {
    match role {
        Role::SuperAdmin => &ADMIN_ZONE,
        Role::Guardian => &PORTAL_ZONE,
        Role::Manager | Role::Staff => &STAFF_ZONE,
    }
}

/// Finds the page serving `path`; the longest matching page path wins.
pub fn find_route(path: &str) -> Option<RouteMatch> {
    let zone = zone_for_path(path);
    zone.groups
        .iter()
        .flat_map(|group| group.routes.iter().map(move |route| (group, route)))
        .filter(|(_, route)| path_matches(route.path, path))
        .max_by_key(|(_, route)| route.path.len())
        .map(|(group, route)| RouteMatch { zone, group, route })
}
