pub mod middleware;
pub mod policy;
pub mod token;

pub use middleware::AuthMiddleware;
pub use token::{verify_token, Claims};

use jsonwebtoken::DecodingKey;

/// Roles recognized by the route policies. Any other group on a token is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Maps one groups-claim entry to a role: trimmed, an optional
    /// `ROLE_` prefix stripped, matched case-insensitively. Empty and
    /// unknown entries map to `None`.
    pub fn from_group(group: &str) -> Option<Role> {
        let name = group.trim();
        if name.is_empty() {
            return None;
        }
        let name = name.strip_prefix("ROLE_").unwrap_or(name);
        if name.eq_ignore_ascii_case("admin") {
            Some(Role::Admin)
        } else if name.eq_ignore_ascii_case("user") {
            Some(Role::User)
        } else {
            None
        }
    }
}

/// Immutable token-validation settings, initialized once at startup.
pub struct AuthSettings {
    pub decoding_key: DecodingKey,
    pub issuer: String,
    pub client_id: String,
}

impl AuthSettings {
    pub fn new(secret: &str, issuer: String, client_id: String) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            client_id,
        }
    }
}
