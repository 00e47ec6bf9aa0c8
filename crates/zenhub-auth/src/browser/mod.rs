//! Headless browser abstraction.
//!
//! The login flow only talks to [`BrowserSession`]; [`ChromiumLauncher`]
//! provides the production implementation on top of chromiumoxide.

mod chromium;

pub use chromium::{BrowserOptions, ChromiumLauncher, ChromiumSession};

use std::time::Duration;

use async_trait::async_trait;

use crate::cookies::CookieRecord;
use crate::error::Result;

/// Starts a browser with a single open page.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// One browser with one page, driven step by step.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// URL of the page's main frame.
    async fn current_url(&self) -> Result<String>;

    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until the page has no network activity, bounded by `timeout`.
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Wait until `selector` matches an element, bounded by `timeout`.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Focus `selector` and type `text` into it.
    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()>;

    /// Press Enter with `selector` focused.
    async fn press_enter(&mut self, selector: &str) -> Result<()>;

    /// Cookies visible to the current page.
    async fn cookies(&self) -> Result<Vec<CookieRecord>>;

    async fn set_cookies(&mut self, cookies: &[CookieRecord]) -> Result<()>;

    /// Read `key` from the page's `localStorage`.
    async fn local_storage_item(&self, key: &str) -> Result<Option<String>>;

    /// `document.body.outerHTML`, for diagnostics.
    async fn body_html(&self) -> Result<String>;

    /// Shut the browser down. Called exactly once per session.
    async fn close(&mut self) -> Result<()>;
}
