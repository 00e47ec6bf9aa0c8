//! Browser sessions backed by chromiumoxide.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::js::EvaluationResult;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use super::{BrowserLauncher, BrowserSession};
use crate::cookies::CookieRecord;
use crate::error::{AuthError, Result};

/// Poll interval for selector and network-idle waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet period after which the network counts as idle.
const IDLE_WINDOW: Duration = Duration::from_millis(500);

const NETWORK_STATE_JS: &str = "({ ready: document.readyState === 'complete', \
     resources: performance.getEntriesByType('resource').length })";

fn cdp(err: CdpError) -> AuthError {
    AuthError::Browser(err.to_string())
}

/// Launch options.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Keep Chrome's sandbox. Containers usually need it off.
    pub sandbox: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
        }
    }
}

/// Launches Chromium through chromiumoxide.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    options: BrowserOptions,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder();
        if !self.options.headless {
            builder = builder.with_head();
        }
        if !self.options.sandbox {
            builder = builder
                .arg("--no-sandbox") // Required for containerized environments
                .arg("--disable-dev-shm-usage"); // Avoid /dev/shm size issues in containers
        }
        builder
            .build()
            .map_err(|e| AuthError::Launch(format!("Failed to build browser config: {e}")))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        tracing::info!(headless = self.options.headless, "Launching browser");

        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AuthError::Launch(e.to_string()))?;

        // Spawn handler task
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // Don't leak the process when the first page can't open
                let _ = browser.close().await;
                let _ = handle.await;
                return Err(AuthError::Launch(e.to_string()));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            handler: Some(handle),
            page,
        }))
    }
}

/// URL a cookie belongs to, so CDP can scope it without a loaded page.
fn cookie_url(cookie: &CookieRecord) -> String {
    let host = cookie.domain.trim_start_matches('.');
    let path = if cookie.path.starts_with('/') {
        cookie.path.as_str()
    } else {
        "/"
    };
    format!("https://{host}{path}")
}

fn cookie_params(cookies: &[CookieRecord]) -> Result<Vec<CookieParam>> {
    cookies
        .iter()
        .map(|cookie| {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .url(cookie_url(cookie))
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .http_only(cookie.http_only);
            if cookie.is_persistent() {
                builder = builder.expires(TimeSinceEpoch::new(cookie.expires));
            }
            builder.build().map_err(|e| {
                AuthError::Browser(format!("Failed to build cookie {}: {e}", cookie.name))
            })
        })
        .collect()
}

/// `getItem` answers `null` for a missing key, which arrives without a value.
fn storage_value(result: &EvaluationResult) -> Result<Option<String>> {
    match result.value() {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Ok(Some(other.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct NetworkState {
    ready: bool,
    resources: u64,
}

/// A launched Chromium with its single page.
pub struct ChromiumSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Page,
}

impl ChromiumSession {
    async fn network_state(&self) -> Option<NetworkState> {
        // Evaluation fails while a navigation swaps the execution context
        self.page
            .evaluate(NETWORK_STATE_JS)
            .await
            .ok()?
            .into_value()
            .ok()
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await.map_err(cdp)?.unwrap_or_default())
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        tracing::debug!(url, "Navigating");
        self.page.goto(url).await.map_err(cdp)?;
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut last_count = None;
        let mut quiet_since = Instant::now();

        loop {
            let now = Instant::now();
            match self.network_state().await {
                Some(state) if state.ready => {
                    if last_count != Some(state.resources) {
                        last_count = Some(state.resources);
                        quiet_since = now;
                    } else if now.duration_since(quiet_since) >= IDLE_WINDOW {
                        return Ok(());
                    }
                }
                _ => {
                    last_count = None;
                    quiet_since = now;
                }
            }

            if now >= deadline {
                return Err(AuthError::Timeout {
                    what: "network idle".to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AuthError::Timeout {
                    what: format!("selector {selector}"),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        tracing::debug!(selector, "Clicking");
        self.page
            .find_element(selector)
            .await
            .map_err(cdp)?
            .click()
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        tracing::debug!(selector, "Typing into field");
        self.page
            .find_element(selector)
            .await
            .map_err(cdp)?
            .click()
            .await
            .map_err(cdp)?
            .type_str(text)
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(cdp)?
            .press_key("Enter")
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>> {
        let cookies = self.page.get_cookies().await.map_err(cdp)?;
        // CDP cookies serialize in the same camelCase shape the cache uses
        let value = serde_json::to_value(cookies)?;
        Ok(serde_json::from_value(value)?)
    }

    async fn set_cookies(&mut self, cookies: &[CookieRecord]) -> Result<()> {
        // Page::set_cookies refuses to run while the page is on about:blank,
        // so send the command directly with a URL on every cookie
        let params = cookie_params(cookies)?;
        self.page
            .execute(SetCookiesParams::new(params))
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn local_storage_item(&self, key: &str) -> Result<Option<String>> {
        let key = serde_json::to_string(key)?;
        let expr = format!("window.localStorage.getItem({key})");
        let result = self.page.evaluate(expr).await.map_err(cdp)?;
        storage_value(&result)
    }

    async fn body_html(&self) -> Result<String> {
        let html: String = self
            .page
            .evaluate("document.body ? document.body.outerHTML : ''")
            .await
            .map_err(cdp)?
            .into_value()?;
        Ok(html)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            browser.close().await.map_err(cdp)?;
        }
        if let Some(handle) = self.handler.take() {
            handle
                .await
                .map_err(|e| AuthError::Browser(format!("Browser handler task failed: {e}")))?;
        }
        Ok(())
    }
}
