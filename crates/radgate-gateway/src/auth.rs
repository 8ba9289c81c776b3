use radgate_auth::{Claims, PresentedCredential, extract_credential};
use radgate_common::{ErrorKind, GatewayError};

use crate::state::AppState;

/// Whichever credential kind resolved the request (spec §4.6): an API
/// key scoped to a workspace and allow lists, or a JWT principal with
/// a role.
#[derive(Debug, Clone)]
pub enum Principal {
    ApiKey { name: String },
    Jwt(Claims),
}

impl Principal {
    /// The `api_key_name` column of a `UsageRecord` (spec §3): the key
    /// name for API-key callers, the JWT subject otherwise.
    pub fn usage_key_name(&self) -> String {
        match self {
            Principal::ApiKey { name } => name.clone(),
            Principal::Jwt(claims) => claims.sub.clone(),
        }
    }

    /// The role to enforce for admin-gated routes. API-key callers
    /// carry no role; only JWT principals can reach role-gated surfaces.
    pub fn role(&self) -> Option<radgate_auth::Role> {
        match self {
            Principal::ApiKey { .. } => None,
            Principal::Jwt(claims) => Some(claims.role),
        }
    }
}

/// Resolves the incoming credential against either the API key store
/// or the JWT issuer, depending on its shape (spec §4.6/§6). `api_type`
/// and `model` are only enforced for API-key principals; a JWT grants
/// access independent of the router's per-key allow lists.
pub fn authenticate(
    state: &AppState,
    headers: &http::HeaderMap,
    query: Option<&str>,
    api_type: &str,
    model: &str,
) -> Result<Principal, GatewayError> {
    let raw = extract_credential(headers, query)
        .ok_or_else(|| GatewayError::new(ErrorKind::Unauthorized, "missing credential"))?;

    match PresentedCredential::classify(&raw) {
        PresentedCredential::BearerJwt(token) => {
            let claims = state.jwt.validate(&token).map_err(|err| GatewayError::new(ErrorKind::Unauthorized, err.to_string()))?;
            Ok(Principal::Jwt(claims))
        }
        PresentedCredential::ApiKey(raw_key) => {
            let record = state.api_keys.validate(&raw_key, api_type, model)?;
            state.api_keys.touch_last_used(&record.hash);
            Ok(Principal::ApiKey { name: record.name })
        }
    }
}
