//! Configuration for the token acquisition flow.
//!
//! Every URL, selector and timeout the flow relies on lives here so the
//! login sequence can follow markup changes on either site without code
//! edits in the state machine.

use std::path::PathBuf;
use std::time::Duration;

/// Application entry point.
pub const DEFAULT_ENTRY_URL: &str = "https://app.zenhub.com";

/// Application's own login page (matched exactly).
pub const DEFAULT_APP_LOGIN_URL: &str = "https://app.zenhub.com/login";

/// Zenhub auth service page offering "sign in with GitHub" (matched as prefix).
pub const DEFAULT_PROVIDER_ENTRY_PREFIX: &str = "https://auth.zenhub.com/login";

/// GitHub credential form (matched as prefix).
pub const DEFAULT_IDENTITY_LOGIN_PREFIX: &str = "https://github.com/login";

/// GitHub "verify new device" interstitial (matched as prefix).
pub const DEFAULT_VERIFY_DEVICE_PREFIX: &str = "https://github.com/sessions/verified-device";

/// Default wait for the network to settle after a navigation or submit.
pub const DEFAULT_NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default wait for a control before clicking it.
pub const DEFAULT_SELECTOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wait for the authenticated landing page.
pub const DEFAULT_LANDING_TIMEOUT: Duration = Duration::from_secs(120);

/// Default cookie cache directory.
pub const DEFAULT_COOKIE_DIR: &str = "./cookies";

/// Default diagnostic snapshot file.
pub const DEFAULT_SNAPSHOT_PATH: &str = "errorPageContent.html";

/// Subject of GitHub's device verification email.
pub const DEFAULT_VERIFICATION_SUBJECT: &str = "[GitHub] Please verify your device";

/// Local storage key holding the token.
pub const DEFAULT_TOKEN_STORAGE_KEY: &str = "api_token";

/// Default Gmail IMAP host.
pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";

/// Default Gmail IMAP port (implicit TLS).
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// Default bound on connecting to and reading from the IMAP server.
pub const DEFAULT_IMAP_TIMEOUT: Duration = Duration::from_secs(30);

/// CSS selectors the flow waits for, clicks and types into.
#[derive(Debug, Clone)]
pub struct Selectors {
    /// Primary "sign in" button on the application login page.
    pub app_sign_in: String,
    /// "Sign in with GitHub" button on the auth service page.
    pub provider_sign_in: String,
    pub username_field: String,
    pub password_field: String,
    pub submit_button: String,
    /// One-time code input on the verify-device page.
    pub otp_field: String,
    /// Element unique to the authenticated landing page.
    pub landing_marker: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            app_sign_in: ".zhc-button--color-primary".to_string(),
            provider_sign_in: "button#github-login".to_string(),
            username_field: "#login_field".to_string(),
            password_field: "#password".to_string(),
            submit_button: "[name=\"commit\"]".to_string(),
            otp_field: "#otp".to_string(),
            landing_marker: ".zhc-sidebar__navigation h1".to_string(),
        }
    }
}

/// URLs that identify each recognised page.
#[derive(Debug, Clone)]
pub struct PageUrls {
    pub entry: String,
    pub app_login: String,
    pub provider_entry_prefix: String,
    pub identity_login_prefix: String,
    pub verify_device_prefix: String,
}

impl Default for PageUrls {
    fn default() -> Self {
        Self {
            entry: DEFAULT_ENTRY_URL.to_string(),
            app_login: DEFAULT_APP_LOGIN_URL.to_string(),
            provider_entry_prefix: DEFAULT_PROVIDER_ENTRY_PREFIX.to_string(),
            identity_login_prefix: DEFAULT_IDENTITY_LOGIN_PREFIX.to_string(),
            verify_device_prefix: DEFAULT_VERIFY_DEVICE_PREFIX.to_string(),
        }
    }
}

/// Mailbox connection settings.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    /// Connect and per-read timeout on the socket.
    pub timeout: Duration,
    /// Skip certificate validation on the IMAP connection.
    pub accept_invalid_certs: bool,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_IMAP_HOST.to_string(),
            port: DEFAULT_IMAP_PORT,
            timeout: DEFAULT_IMAP_TIMEOUT,
            accept_invalid_certs: true,
        }
    }
}

/// Configuration for one token acquisition run.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub urls: PageUrls,
    pub selectors: Selectors,
    pub network_idle_timeout: Duration,
    pub selector_timeout: Duration,
    pub landing_timeout: Duration,
    /// Directory holding one `<host>.json` file per domain.
    pub cookie_dir: PathBuf,
    /// Where the page body is dumped when a run fails.
    pub snapshot_path: PathBuf,
    pub verification_subject: String,
    pub token_storage_key: String,
    pub imap: ImapConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            urls: PageUrls::default(),
            selectors: Selectors::default(),
            network_idle_timeout: DEFAULT_NETWORK_IDLE_TIMEOUT,
            selector_timeout: DEFAULT_SELECTOR_TIMEOUT,
            landing_timeout: DEFAULT_LANDING_TIMEOUT,
            cookie_dir: PathBuf::from(DEFAULT_COOKIE_DIR),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            verification_subject: DEFAULT_VERIFICATION_SUBJECT.to_string(),
            token_storage_key: DEFAULT_TOKEN_STORAGE_KEY.to_string(),
            imap: ImapConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Create configuration from the defaults plus environment overrides.
    ///
    /// # Optional Environment Variables
    /// - `ZENHUB_AUTH_COOKIE_DIR`: Cookie cache directory (default: ./cookies)
    /// - `ZENHUB_AUTH_SNAPSHOT_PATH`: Failure snapshot (default: errorPageContent.html)
    /// - `ZENHUB_AUTH_NETWORK_IDLE_TIMEOUT_SECS`: Network idle wait (default: 60)
    /// - `ZENHUB_AUTH_LANDING_TIMEOUT_SECS`: Landing page wait (default: 120)
    /// - `ZENHUB_AUTH_IMAP_HOST`: IMAP host (default: imap.gmail.com)
    /// - `ZENHUB_AUTH_IMAP_PORT`: IMAP port (default: 993)
    /// - `ZENHUB_AUTH_IMAP_TIMEOUT_SECS`: IMAP connect/read timeout (default: 30)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("ZENHUB_AUTH_COOKIE_DIR") {
            config.cookie_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("ZENHUB_AUTH_SNAPSHOT_PATH") {
            config.snapshot_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("ZENHUB_AUTH_NETWORK_IDLE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.network_idle_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("ZENHUB_AUTH_LANDING_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.landing_timeout = Duration::from_secs(secs);
        }
        if let Some(host) = lookup("ZENHUB_AUTH_IMAP_HOST") {
            config.imap.host = host;
        }
        if let Some(port) = lookup("ZENHUB_AUTH_IMAP_PORT").and_then(|v| v.parse().ok()) {
            config.imap.port = port;
        }
        if let Some(secs) = lookup("ZENHUB_AUTH_IMAP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.imap.timeout = Duration::from_secs(secs);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.network_idle_timeout, Duration::from_secs(60));
        assert_eq!(config.landing_timeout, Duration::from_secs(120));
        assert_eq!(config.imap.host, "imap.gmail.com");
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.imap.timeout, Duration::from_secs(30));
        assert_eq!(config.token_storage_key, "api_token");
        assert_eq!(config.selectors.landing_marker, ".zhc-sidebar__navigation h1");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ZENHUB_AUTH_COOKIE_DIR", "/tmp/cookies"),
            ("ZENHUB_AUTH_LANDING_TIMEOUT_SECS", "5"),
            ("ZENHUB_AUTH_IMAP_PORT", "not-a-port"),
            ("ZENHUB_AUTH_IMAP_TIMEOUT_SECS", "3"),
        ]);
        let config = AuthConfig::from_lookup(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.cookie_dir, PathBuf::from("/tmp/cookies"));
        assert_eq!(config.landing_timeout, Duration::from_secs(5));
        assert_eq!(config.imap.timeout, Duration::from_secs(3));
        // Unparseable values fall back to the default
        assert_eq!(config.imap.port, DEFAULT_IMAP_PORT);
        assert_eq!(config.network_idle_timeout, DEFAULT_NETWORK_IDLE_TIMEOUT);
    }
}
