//! Browser-driven login that ends with the Zenhub frontend API token.
//!
//! The flow is an explicit state machine: each [`Step`] runs one action
//! against the browser and names the step that follows. Page recognition
//! lives in [`PageState`], separate from the actions taken on each page.
//!
//! ```text
//! Start -> RouteEntry -+-> (app login)      click sign-in ---------------+
//!                      +-> (provider entry) click GitHub -> IdentityLogin |
//!                      +-> (other)          warn ------------------------+
//! IdentityLogin -> TwoFactorCheck -> AwaitLandingPage -> ExtractToken
//! ```

mod context;
mod page;

pub use page::PageState;

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::browser::{BrowserLauncher, BrowserOptions, BrowserSession, ChromiumLauncher};
use crate::config::AuthConfig;
use crate::cookies::CookieCache;
use crate::credentials::{IdentityCredentials, MailCredentials};
use crate::error::{AuthError, Result};
use crate::mail::{extract_verification_code, ImapMailClient, MailClient};
use crate::token::ApiToken;

use self::context::{host_of, SessionContext};

/// Steps of the login state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Open the application entry URL.
    Start,
    /// Decide where the entry URL landed us.
    RouteEntry,
    /// Fill in the GitHub credential form if it is showing.
    IdentityLogin,
    /// Answer GitHub's device verification challenge if it is showing.
    TwoFactorCheck,
    /// Wait for the authenticated landing page.
    AwaitLandingPage,
    /// Read the token out of local storage.
    ExtractToken,
}

/// Read the token from the current page's local storage.
///
/// A pure read: calling it twice without page changes gives the same answer.
pub async fn read_token(browser: &dyn BrowserSession, key: &str) -> Result<Option<ApiToken>> {
    let value = browser.local_storage_item(key).await?;
    Ok(ApiToken::from_storage(value))
}

/// Acquires Zenhub API tokens by driving a browser through the login.
pub struct TokenAcquirer {
    config: AuthConfig,
    launcher: Box<dyn BrowserLauncher>,
    mail: Box<dyn MailClient>,
}

impl TokenAcquirer {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        launcher: Box<dyn BrowserLauncher>,
        mail: Box<dyn MailClient>,
    ) -> Self {
        Self {
            config,
            launcher,
            mail,
        }
    }

    /// Chromium for the browser, IMAP for the verification mailbox.
    #[must_use]
    pub fn chromium(config: AuthConfig, options: BrowserOptions) -> Self {
        let mail = ImapMailClient::new(config.imap.clone());
        Self::new(
            config,
            Box::new(ChromiumLauncher::new(options)),
            Box::new(mail),
        )
    }

    /// Log in and return the token, or the reason it could not be obtained.
    ///
    /// Every failure is logged with the page URL, leaves one diagnostic
    /// snapshot behind, and still closes the browser.
    pub async fn acquire_token(
        &self,
        identity: &IdentityCredentials,
        mail_credentials: &MailCredentials,
    ) -> Result<ApiToken> {
        tracing::info!(user = %identity.username, "Acquiring Zenhub API token");

        let cookies = CookieCache::new(&self.config.cookie_dir);
        if let Err(e) = cookies.ensure_dir() {
            tracing::error!(dir = %self.config.cookie_dir.display(), error = %e, "Cannot create cookie cache");
            return Err(e);
        }

        let browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                tracing::error!(error = %e, "Browser launch failed");
                return Err(e);
            }
        };

        let mut ctx = SessionContext::new(
            browser,
            cookies,
            &self.config,
            identity,
            mail_credentials,
            self.mail.as_ref(),
        );

        let outcome = AssertUnwindSafe(run(&mut ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(AuthError::Panicked(panic_message(panic.as_ref()))));

        if let Err(e) = &outcome {
            let url = ctx.url_for_logs().await;
            tracing::error!(url = %url, error = %e, "Token acquisition failed");
            ctx.capture_snapshot().await;
        }

        ctx.close().await;

        if outcome.is_ok() {
            tracing::info!("Zenhub API token acquired");
        }
        outcome
    }
}

async fn run(ctx: &mut SessionContext<'_>) -> Result<ApiToken> {
    let mut step = Step::Start;
    loop {
        tracing::debug!(?step, "Entering login step");
        step = match step {
            Step::Start => start(ctx).await?,
            Step::RouteEntry => route_entry(ctx).await?,
            Step::IdentityLogin => identity_login(ctx).await?,
            Step::TwoFactorCheck => two_factor_check(ctx).await?,
            Step::AwaitLandingPage => await_landing_page(ctx).await,
            Step::ExtractToken => return extract_token(ctx).await,
        };
    }
}

async fn start(ctx: &mut SessionContext<'_>) -> Result<Step> {
    let config = ctx.config;
    let entry = &config.urls.entry;
    tracing::info!(url = %entry, "Opening Zenhub");
    ctx.goto(entry).await?;
    Ok(Step::RouteEntry)
}

async fn route_entry(ctx: &mut SessionContext<'_>) -> Result<Step> {
    ctx.settle().await;

    let config = ctx.config;
    let url = ctx.current_url().await?;

    match PageState::classify(&url, &config.urls) {
        PageState::AppLogin => {
            tracing::info!(url = %url, "On Zenhub login page");
            ctx.click_when_ready(&config.selectors.app_sign_in).await?;
            Ok(Step::AwaitLandingPage)
        }
        PageState::ProviderEntry => {
            tracing::info!(url = %url, "On Zenhub auth page");
            // The click lands on GitHub; bring its session along
            if let Some(host) = host_of(&config.urls.identity_login_prefix) {
                ctx.inject_cached_cookies(&host).await;
            }
            ctx.click_when_ready(&config.selectors.provider_sign_in).await?;
            ctx.settle().await;
            Ok(Step::IdentityLogin)
        }
        state => {
            tracing::warn!(url = %url, ?state, "Zenhub login page expected, trying landing page anyway");
            Ok(Step::AwaitLandingPage)
        }
    }
}

async fn identity_login(ctx: &mut SessionContext<'_>) -> Result<Step> {
    let config = ctx.config;
    let url = ctx.current_url().await?;
    if !PageState::IdentityLogin.matches(&url, &config.urls) {
        tracing::info!(url = %url, "Not on the GitHub login page, continuing without login");
        return Ok(Step::TwoFactorCheck);
    }

    tracing::info!("On GitHub login page, signing in");
    let selectors = &config.selectors;
    let identity = ctx.identity;
    ctx.browser
        .type_text(&selectors.username_field, &identity.username)
        .await?;
    ctx.browser
        .type_text(&selectors.password_field, identity.password())
        .await?;
    ctx.browser.click(&selectors.submit_button).await?;
    ctx.settle().await;

    Ok(Step::TwoFactorCheck)
}

async fn two_factor_check(ctx: &mut SessionContext<'_>) -> Result<Step> {
    let config = ctx.config;
    let url = ctx.current_url().await?;
    if !PageState::VerifyDevice.matches(&url, &config.urls) {
        tracing::info!(url = %url, "Not on the device verification page, continuing without verification");
        return Ok(Step::AwaitLandingPage);
    }

    tracing::info!("Need to verify the new device");
    let body = ctx
        .mail
        .take_unseen_by_subject(ctx.mail_credentials, &config.verification_subject)
        .await?;

    // No email is read as "not challenged this time"; the landing wait decides
    let Some(body) = body else {
        tracing::warn!(
            subject = %config.verification_subject,
            "No unread verification email found, continuing without a code"
        );
        return Ok(Step::AwaitLandingPage);
    };

    let code = extract_verification_code(&body).ok_or(AuthError::MissingVerificationCode)?;

    let otp_field = &config.selectors.otp_field;
    ctx.browser.type_text(otp_field, code).await?;
    if let Err(e) = ctx.browser.press_enter(otp_field).await {
        tracing::error!(error = %e, "Error submitting verification code");
    }

    tracing::info!("Waiting for page to finish loading");
    ctx.settle().await;

    Ok(Step::AwaitLandingPage)
}

async fn await_landing_page(ctx: &mut SessionContext<'_>) -> Step {
    let config = ctx.config;

    match ctx
        .browser
        .wait_for_selector(&config.selectors.landing_marker, config.landing_timeout)
        .await
    {
        Ok(()) => {
            tracing::info!("Zenhub landing page loaded");
            ctx.landing_confirmed = true;
        }
        Err(e) => {
            let url = ctx.url_for_logs().await;
            tracing::error!(url = %url, error = %e, "Zenhub landing page did not load");
            ctx.capture_snapshot().await;
        }
    }
    Step::ExtractToken
}

async fn extract_token(ctx: &mut SessionContext<'_>) -> Result<ApiToken> {
    let token = read_token(ctx.browser.as_ref(), &ctx.config.token_storage_key).await?;
    let url = ctx.url_for_logs().await;

    match token {
        Some(_) if !ctx.landing_confirmed => Err(AuthError::LandingUnconfirmed { url }),
        Some(token) => Ok(token),
        None => Err(AuthError::TokenMissing { url }),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
