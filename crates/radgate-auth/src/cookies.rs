/// Builds a `Set-Cookie` value for the access token: secure,
/// http-only, same-site strict, scoped to `/` (spec §4.6).
pub fn access_token_cookie(value: &str, max_age_secs: i64) -> String {
    build_cookie("rad_access", value, "/", max_age_secs)
}

/// Same attributes as the access cookie but scoped to the auth
/// subtree only (spec §4.6).
pub fn refresh_token_cookie(value: &str, max_age_secs: i64) -> String {
    build_cookie("rad_refresh", value, "/v1/oauth", max_age_secs)
}

/// A cookie that clears the named cookie (used on logout).
pub fn expire_cookie(name: &str, path: &str) -> String {
    format!("{name}=; Path={path}; Max-Age=0; Secure; HttpOnly; SameSite=Strict")
}

fn build_cookie(name: &str, value: &str, path: &str, max_age_secs: i64) -> String {
    format!("{name}={value}; Path={path}; Max-Age={max_age_secs}; Secure; HttpOnly; SameSite=Strict")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_is_scoped_to_root() {
        let cookie = access_token_cookie("tok", 900);
        assert!(cookie.contains("Path=/;"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
    }

    #[test]
    fn refresh_cookie_is_scoped_to_auth_subtree() {
        let cookie = refresh_token_cookie("tok", 86400);
        assert!(cookie.contains("Path=/v1/oauth"));
    }
}
