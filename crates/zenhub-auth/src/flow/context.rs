//! Per-run session context threaded through every login step.

use crate::browser::BrowserSession;
use crate::config::AuthConfig;
use crate::cookies::CookieCache;
use crate::credentials::{IdentityCredentials, MailCredentials};
use crate::error::{AuthError, Result};
use crate::mail::MailClient;

/// Host name of `url`, if it has one.
pub(crate) fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .host_str()
        .map(str::to_owned)
}

/// Everything one run needs, owned by the flow for its whole duration.
pub(crate) struct SessionContext<'a> {
    pub browser: Box<dyn BrowserSession>,
    pub cookies: CookieCache,
    pub config: &'a AuthConfig,
    pub identity: &'a IdentityCredentials,
    pub mail_credentials: &'a MailCredentials,
    pub mail: &'a dyn MailClient,
    /// Set once the landing marker was seen.
    pub landing_confirmed: bool,
    snapshot_taken: bool,
}

impl<'a> SessionContext<'a> {
    pub fn new(
        browser: Box<dyn BrowserSession>,
        cookies: CookieCache,
        config: &'a AuthConfig,
        identity: &'a IdentityCredentials,
        mail_credentials: &'a MailCredentials,
        mail: &'a dyn MailClient,
    ) -> Self {
        Self {
            browser,
            cookies,
            config,
            identity,
            mail_credentials,
            mail,
            landing_confirmed: false,
            snapshot_taken: false,
        }
    }

    pub async fn current_url(&self) -> Result<String> {
        self.browser.current_url().await
    }

    /// Current URL for log lines; never fails.
    pub async fn url_for_logs(&self) -> String {
        self.browser
            .current_url()
            .await
            .unwrap_or_else(|_| "<unknown>".to_string())
    }

    /// Navigate to `target`, carrying cookies across through the cache.
    pub async fn goto(&mut self, target: &str) -> Result<()> {
        let current = self.save_current_cookies().await;
        if let Some(host) = host_of(target) {
            if current.as_deref() != Some(host.as_str()) {
                self.inject_cached_cookies(&host).await;
            }
        }
        self.browser.goto(target).await
    }

    /// Persist the current page's cookies under its host.
    ///
    /// Returns the host. Failures are logged; the cache is best-effort.
    pub async fn save_current_cookies(&mut self) -> Option<String> {
        let url = match self.browser.current_url().await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read current URL to save cookies");
                return None;
            }
        };
        let host = host_of(&url)?;

        let saved = match self.browser.cookies().await {
            Ok(cookies) => self.cookies.save(&host, &cookies),
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            tracing::warn!(domain = %host, error = %e, "Failed to save cookies");
        }
        Some(host)
    }

    /// Load `host`'s cached cookies into the browser, if there are any.
    ///
    /// A rejected cache entry only gets logged; the login runs without it.
    pub async fn inject_cached_cookies(&mut self, host: &str) {
        let cached = match self.cookies.load(host) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(domain = host, error = %e, "Ignoring unreadable cookie cache entry");
                None
            }
        };

        if let Some(cookies) = cached {
            tracing::info!(domain = host, count = cookies.len(), "Reusing cached cookies");
            if let Err(e) = self.browser.set_cookies(&cookies).await {
                tracing::warn!(domain = host, error = %e, "Browser rejected cached cookies");
            }
        }
    }

    /// Wait for the network to go quiet. A timeout only gets logged.
    pub async fn wait_for_network_idle(&mut self) {
        let timeout = self.config.network_idle_timeout;
        if let Err(e) = self.browser.wait_for_network_idle(timeout).await {
            tracing::warn!(
                error = %e,
                "Waiting for network idle not possible. Continuing in hope that the page has changed"
            );
        }
    }

    /// Wait for the network, then cache whatever cookies the page holds.
    pub async fn settle(&mut self) {
        self.wait_for_network_idle().await;
        self.save_current_cookies().await;
    }

    /// Wait for `selector` to appear, then click it.
    pub async fn click_when_ready(&mut self, selector: &str) -> Result<()> {
        self.browser
            .wait_for_selector(selector, self.config.selector_timeout)
            .await?;
        tracing::info!(selector, "Clicking");
        self.browser.click(selector).await
    }

    /// Dump the page body to the snapshot file, at most once per run.
    pub async fn capture_snapshot(&mut self) {
        if self.snapshot_taken {
            return;
        }
        self.snapshot_taken = true;

        let path = &self.config.snapshot_path;
        let written = match self.browser.body_html().await {
            Ok(html) => std::fs::write(path, html).map_err(AuthError::from),
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => tracing::info!(path = %path.display(), "Wrote diagnostic page snapshot"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to write page snapshot"),
        }
    }

    /// Close the browser, logging (not returning) any failure.
    pub async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "Failed to close browser cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://app.zenhub.com/login").as_deref(), Some("app.zenhub.com"));
        assert_eq!(host_of("https://github.com").as_deref(), Some("github.com"));
        assert_eq!(host_of("about:blank"), None);
        assert_eq!(host_of(""), None);
    }
}
