//! Static per-route access requirements.
//!
//! Authorization is data, not annotations: the middleware looks the
//! request up in [`POLICIES`] after validating the token. `{id}` pattern
//! segments match any single path segment; paths with no entry fall back
//! to requiring authentication only.

use actix_web::http::Method;

use crate::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any authenticated principal, regardless of roles.
    Authenticated,
    /// Requires the given role.
    Role(Role),
    /// Requires at least one of the given roles.
    AnyOf(&'static [Role]),
}

impl Access {
    pub fn permits(&self, roles: &[Role]) -> bool {
        match self {
            Access::Authenticated => true,
            Access::Role(required) => roles.contains(required),
            Access::AnyOf(any) => any.iter().any(|role| roles.contains(role)),
        }
    }
}

pub struct RoutePolicy {
    pub method: Method,
    pub pattern: &'static str,
    pub access: Access,
}

const ADMIN_OR_USER: &[Role] = &[Role::Admin, Role::User];

pub static POLICIES: &[RoutePolicy] = &[
    RoutePolicy {
        method: Method::POST,
        pattern: "/api/v1/projects",
        access: Access::Role(Role::Admin),
    },
    RoutePolicy {
        method: Method::POST,
        pattern: "/api/v1/projects/{id}",
        access: Access::Role(Role::Admin),
    },
    RoutePolicy {
        method: Method::GET,
        pattern: "/api/v1/projects/{id}",
        access: Access::Authenticated,
    },
    RoutePolicy {
        method: Method::GET,
        pattern: "/api/v1/projects",
        access: Access::Authenticated,
    },
    RoutePolicy {
        method: Method::DELETE,
        pattern: "/api/v1/projects/{id}",
        access: Access::Role(Role::Admin),
    },
    RoutePolicy {
        method: Method::POST,
        pattern: "/api/v1/tasks",
        access: Access::AnyOf(ADMIN_OR_USER),
    },
    RoutePolicy {
        method: Method::POST,
        pattern: "/api/v1/tasks/{id}",
        access: Access::AnyOf(ADMIN_OR_USER),
    },
    RoutePolicy {
        method: Method::GET,
        pattern: "/api/v1/tasks/{id}",
        access: Access::AnyOf(ADMIN_OR_USER),
    },
    RoutePolicy {
        method: Method::GET,
        pattern: "/api/v1/tasks",
        access: Access::AnyOf(ADMIN_OR_USER),
    },
    RoutePolicy {
        method: Method::DELETE,
        pattern: "/api/v1/tasks/{id}",
        access: Access::Role(Role::Admin),
    },
];

/// The access requirement for a request. Unlisted paths require
/// authentication only.
pub fn required_access(method: &Method, path: &str) -> Access {
    POLICIES
        .iter()
        .find(|policy| policy.method == *method && matches_pattern(policy.pattern, path))
        .map(|policy| policy.access)
        .unwrap_or(Access::Authenticated)
}

fn matches_pattern(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/').filter(|s| !s.is_empty());
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(expected), Some(actual)) => {
                if expected.starts_with('{') && expected.ends_with('}') {
                    continue;
                }
                if expected != actual {
                    return false;
                }
            }
            _ => return false,
        }
    }
}
