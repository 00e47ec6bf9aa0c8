//! Credential bundles supplied once per run.
//!
//! Neither bundle is ever persisted; `Debug` output redacts the passwords.

use std::fmt;

/// Login for the identity provider (GitHub).
#[derive(Clone)]
pub struct IdentityCredentials {
    pub username: String,
    password: String,
}

impl IdentityCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the password. Never log the return value.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for IdentityCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login for the mailbox that receives device verification codes.
#[derive(Clone)]
pub struct MailCredentials {
    pub username: String,
    password: String,
}

impl MailCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the password. Never log the return value.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_passwords() {
        let gh = IdentityCredentials::new("octocat", "hunter2");
        let mail = MailCredentials::new("bot@example.com", "app-pass");

        let gh_debug = format!("{gh:?}");
        let mail_debug = format!("{mail:?}");

        assert!(gh_debug.contains("octocat"));
        assert!(!gh_debug.contains("hunter2"));
        assert!(!mail_debug.contains("app-pass"));
        assert_eq!(gh.password(), "hunter2");
    }
}
