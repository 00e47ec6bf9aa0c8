//! Cookie record in the browser's native JSON shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Expiry value browsers report for session cookies.
pub const SESSION_EXPIRY: f64 = -1.0;

fn default_path() -> String {
    "/".to_string()
}

const fn session_expiry() -> f64 {
    SESSION_EXPIRY
}

/// A single browser cookie as written to the cache.
///
/// Attributes this type does not model are kept in `extra` so a cache file
/// survives a load/save cycle unchanged.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Seconds since the epoch, or `-1` for session cookies.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CookieRecord {
    /// Create a session cookie scoped to `domain` with path `/`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: SESSION_EXPIRY,
            http_only: false,
            secure: false,
            session: true,
            same_site: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Whether the cookie carries an absolute expiry.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !self.session && self.expires >= 0.0
    }
}

// Cookie values are credentials; keep them out of logs.
impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("expires", &self.expires)
            .field("http_only", &self.http_only)
            .field("secure", &self.secure)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_browser_json() {
        let json = r#"{
            "name": "user_session",
            "value": "abc",
            "domain": "github.com",
            "path": "/",
            "expires": 1767225600.5,
            "size": 15,
            "httpOnly": true,
            "secure": true,
            "session": false,
            "sameSite": "Lax",
            "priority": "Medium"
        }"#;

        let cookie: CookieRecord = serde_json::from_str(json).unwrap();
        assert_eq!(cookie.name, "user_session");
        assert!(cookie.http_only);
        assert!(cookie.is_persistent());
        assert_eq!(cookie.same_site.as_deref(), Some("Lax"));
        assert_eq!(cookie.extra.get("size"), Some(&serde_json::json!(15)));

        // Unmodelled attributes are written back out
        let back = serde_json::to_value(&cookie).unwrap();
        assert_eq!(back["priority"], "Medium");
        assert_eq!(back["httpOnly"], true);
    }

    #[test]
    fn test_minimal_record_defaults() {
        let cookie: CookieRecord =
            serde_json::from_str(r#"{"name": "a", "value": "b"}"#).unwrap();
        assert_eq!(cookie.path, "/");
        assert!(!cookie.is_persistent());
    }

    #[test]
    fn test_debug_redacts_value() {
        let cookie = CookieRecord::new("zh_session", "very-secret", "app.zenhub.com");
        let debug = format!("{cookie:?}");
        assert!(debug.contains("zh_session"));
        assert!(!debug.contains("very-secret"));
    }
}
