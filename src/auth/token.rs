use jsonwebtoken::{decode, Algorithm, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthSettings, Role};
use crate::error::ApiError;

/// Claims expected on an access token.
///
/// The groups claim accepts both the plain `groups` name and the
/// `cognito:groups` form emitted by AWS Cognito pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the principal's unique identifier at the issuer.
    pub sub: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    #[serde(default)]
    pub token_use: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default, alias = "cognito:groups")]
    pub groups: Vec<String>,
}

impl Claims {
    /// The recognized roles granted by the groups claim, deduplicated.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles = Vec::new();
        for group in &self.groups {
            if let Some(role) = Role::from_group(group) {
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
        }
        roles
    }
}

/// Verifies a bearer token against the configured issuer and decodes its
/// claims.
///
/// Signature, expiry and issuer are checked by `jsonwebtoken`; on top of
/// that the token must be an access token (`token_use == "access"`) and
/// must carry the configured client id. Any failure maps to
/// `Unauthorized`.
pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[settings.issuer.as_str()]);

    let data = decode::<Claims>(token, &settings.decoding_key, &validation)?;
    let claims = data.claims;

    if claims.token_use.as_deref() != Some("access") {
        return Err(ApiError::Unauthorized("token_use must be 'access'".into()));
    }
    if claims.client_id.as_deref() != Some(settings.client_id.as_str()) {
        return Err(ApiError::Unauthorized("invalid client_id".into()));
    }
    Ok(claims)
}
