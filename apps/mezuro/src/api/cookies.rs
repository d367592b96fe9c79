//! Minimal cookie helpers: the API only ever sets two cookies, the session
//! token and the one-shot flash.

use axum::http::{HeaderMap, header};

/// Cookie holding the signed-in user's token.
pub const SESSION_COOKIE: &str = "_mezuro_session";

/// Cookie carrying flash messages across one redirect.
pub const FLASH_COOKIE: &str = "_mezuro_flash";

/// Value of cookie `name` in the request's `Cookie` headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value storing `value` under `name` for the whole site.
pub fn set(name: &str, value: &str) -> String {
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax")
}

/// `set_cookie` restricted to HTTPS.
pub fn secure(set_cookie: &str) -> String {
    if set_cookie
        .split(';')
        .any(|attr| attr.trim().eq_ignore_ascii_case("secure"))
    {
        set_cookie.to_string()
    } else {
        format!("{set_cookie}; Secure")
    }
}

/// `Set-Cookie` value that deletes cookie `name`.
pub fn expire(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_named_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; _mezuro_session=abc123; _mezuro_flash="),
        );
        assert_eq!(read(&headers, SESSION_COOKIE), Some("abc123".to_string()));
        assert_eq!(read(&headers, FLASH_COOKIE), None);
        assert_eq!(read(&headers, "missing"), None);
    }

    #[test]
    fn secure_flag_is_added_once() {
        let plain = set(SESSION_COOKIE, "t");
        assert!(!plain.contains("Secure"));

        let marked = secure(&plain);
        assert!(marked.ends_with("; Secure"));
        assert_eq!(secure(&marked), marked);
        assert!(secure(&expire(FLASH_COOKIE)).contains("Max-Age=0; Secure"));
    }
}
