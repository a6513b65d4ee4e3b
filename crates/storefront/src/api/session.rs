//! Session cookie persistence and CSRF token extraction.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};
use tracing::debug;
use url::Url;

use crate::storage::{StorageAdapter, keys};

/// `window._csrf = "..."` as injected by the checkout page template.
static CSRF_GLOBAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"window\._csrf\s*=\s*["']([^"']+)["']"#).expect("Invalid regex")
});

/// `<input type="hidden" name="csrf" value="...">` fallback.
static CSRF_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input[^>]*name=["']csrf["'][^>]*value=["']([^"']+)["']"#)
        .expect("Invalid regex")
});

/// Pull the CSRF token out of the checkout page HTML.
///
/// Looks for the page global first, then for a hidden `csrf` form input.
#[must_use]
pub fn extract_csrf_token(html: &str) -> Option<String> {
    CSRF_GLOBAL_RE
        .captures(html)
        .or_else(|| CSRF_INPUT_RE.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Load cookies saved by [`persist_cookies`] into `jar`.
pub fn restore_cookies(jar: &Jar, storage: &StorageAdapter, base_url: &Url) {
    let Some(cookies) = storage.get::<Vec<String>>(keys::SESSION) else {
        return;
    };
    debug!(count = cookies.len(), "Restoring session cookies");
    for cookie in &cookies {
        jar.add_cookie_str(cookie, base_url);
    }
}

/// Save the jar's cookies for `base_url` to storage.
pub fn persist_cookies(jar: &Jar, storage: &StorageAdapter, base_url: &Url) {
    let cookies: Vec<String> = jar
        .cookies(base_url)
        .and_then(|header| header.to_str().ok().map(str::to_string))
        .map(|header| {
            header
                .split("; ")
                .filter(|pair| !pair.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if cookies.is_empty() {
        storage.remove(keys::SESSION);
    } else {
        storage.set(keys::SESSION, &cookies);
    }
}

/// Forget the saved session.
pub fn forget_cookies(storage: &StorageAdapter) {
    storage.remove(keys::SESSION);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_csrf_from_page_global() {
        let html = r#"<script>
            window._csrf = "2f1c8c3e-8d7a-4a3b-9b1e-0a4c6f9d2e11";
        </script>"#;
        assert_eq!(
            extract_csrf_token(html).as_deref(),
            Some("2f1c8c3e-8d7a-4a3b-9b1e-0a4c6f9d2e11")
        );
    }

    #[test]
    fn test_extract_csrf_from_hidden_input() {
        let html = r#"<form><input type="hidden" name="csrf" value="abc-123"></form>"#;
        assert_eq!(extract_csrf_token(html).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_extract_csrf_missing() {
        assert_eq!(extract_csrf_token("<html><body>Login</body></html>"), None);
        // An empty token is treated as missing
        assert_eq!(extract_csrf_token(r#"window._csrf = "";"#), None);
    }

    #[test]
    fn test_cookie_round_trip_through_storage() {
        let storage = StorageAdapter::in_memory();
        let url = Url::parse("http://shop.test/").unwrap();

        let jar = Jar::default();
        jar.add_cookie_str("sessionId=abc; Path=/; HttpOnly", &url);
        persist_cookies(&jar, &storage, &url);
        assert_eq!(
            storage.get::<Vec<String>>(keys::SESSION),
            Some(vec!["sessionId=abc".to_string()])
        );

        let restored = Jar::default();
        restore_cookies(&restored, &storage, &url);
        let header = restored.cookies(&url).unwrap();
        assert_eq!(header.to_str().unwrap(), "sessionId=abc");
    }

    #[test]
    fn test_persist_empty_jar_forgets_session() {
        let storage = StorageAdapter::in_memory();
        storage.set(keys::SESSION, &vec!["old=1"]);
        let url = Url::parse("http://shop.test/").unwrap();

        persist_cookies(&Jar::default(), &storage, &url);
        assert!(storage.get_raw(keys::SESSION).is_none());
    }
}
