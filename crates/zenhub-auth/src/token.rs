//! The unofficial API token handed back to the caller.

use std::fmt;

/// Opaque bearer token read from the application's local storage.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw storage value. Empty values are not tokens.
    #[must_use]
    pub fn from_storage(value: Option<String>) -> Option<Self> {
        value.filter(|v| !v.trim().is_empty()).map(Self)
    }

    /// Returns the raw token. Never log the return value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper, returning the raw token.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage() {
        assert!(ApiToken::from_storage(None).is_none());
        assert!(ApiToken::from_storage(Some(String::new())).is_none());
        assert!(ApiToken::from_storage(Some("  ".to_string())).is_none());

        let token = ApiToken::from_storage(Some("T1".to_string())).unwrap();
        assert_eq!(token.expose(), "T1");
    }

    #[test]
    fn test_debug_redacts() {
        let token = ApiToken::from_storage(Some("secret".to_string())).unwrap();
        assert!(!format!("{token:?}").contains("secret"));
    }
}
