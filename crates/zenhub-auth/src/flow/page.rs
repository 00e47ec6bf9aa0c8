//! Recognised page states and their URL matchers.

use crate::config::PageUrls;

/// Page the browser is on, as far as the login flow cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Application's own login page.
    AppLogin,
    /// Auth service page offering "sign in with GitHub".
    ProviderEntry,
    /// GitHub credential form.
    IdentityLogin,
    /// GitHub "verify new device" interstitial.
    VerifyDevice,
    /// Anything else.
    Unrecognized,
}

impl PageState {
    /// States with a matcher, in match order.
    pub const RECOGNIZED: [Self; 4] = [
        Self::AppLogin,
        Self::ProviderEntry,
        Self::IdentityLogin,
        Self::VerifyDevice,
    ];

    /// Whether `url` is this page.
    #[must_use]
    pub fn matches(self, url: &str, urls: &PageUrls) -> bool {
        match self {
            Self::AppLogin => url == urls.app_login,
            Self::ProviderEntry => url.starts_with(&urls.provider_entry_prefix),
            Self::IdentityLogin => url.starts_with(&urls.identity_login_prefix),
            Self::VerifyDevice => url.starts_with(&urls.verify_device_prefix),
            Self::Unrecognized => false,
        }
    }

    /// First recognised state matching `url`.
    #[must_use]
    pub fn classify(url: &str, urls: &PageUrls) -> Self {
        Self::RECOGNIZED
            .into_iter()
            .find(|state| state.matches(url, urls))
            .unwrap_or(Self::Unrecognized)
    }
}
