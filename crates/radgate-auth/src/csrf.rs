use base64::Engine;
use rand::RngCore;

use crate::error::AuthError;

/// Generates a 32-byte base64 CSRF token (spec §4.6).
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Mutating methods other than GET/HEAD/OPTIONS/TRACE require a valid
/// CSRF token; GET and friends are exempt (spec §4.6).
pub fn requires_csrf(method: &http::Method) -> bool {
    !matches!(
        *method,
        http::Method::GET | http::Method::HEAD | http::Method::OPTIONS | http::Method::TRACE
    )
}

/// Constant-time comparison of the cookie-stored token against the
/// header-presented one (double-submit pattern).
pub fn verify_csrf(expected: &str, presented: Option<&str>) -> Result<(), AuthError> {
    let presented = presented.ok_or(AuthError::InvalidCsrf)?;
    if expected.len() != presented.len() {
        return Err(AuthError::InvalidCsrf);
    }
    let diff = expected
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    if diff == 0 { Ok(()) } else { Err(AuthError::InvalidCsrf) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_exempt() {
        assert!(!requires_csrf(&http::Method::GET));
        assert!(requires_csrf(&http::Method::POST));
    }

    #[test]
    fn matching_tokens_verify() {
        let token = generate_csrf_token();
        assert!(verify_csrf(&token, Some(token.as_str())).is_ok());
    }

    #[test]
    fn mismatched_tokens_fail() {
        let token = generate_csrf_token();
        assert!(verify_csrf(&token, Some("wrong")).is_err());
    }

    #[test]
    fn missing_token_fails() {
        let token = generate_csrf_token();
        assert!(verify_csrf(&token, None).is_err());
    }
}
