//! Zenhub frontend API token acquisition.
//!
//! Zenhub's official API cannot edit boards, so board automation talks to
//! the frontend API instead, which needs the token the web app keeps in
//! local storage. This crate gets that token by logging in through GitHub
//! in a headless browser:
//! - Per-domain cookie cache so repeated runs skip finished login hops
//! - GitHub device verification via the code mailed to the account
//! - A diagnostic page snapshot whenever a run fails
//!
//! # Usage
//!
//! ```no_run
//! use zenhub_auth::{AuthConfig, BrowserOptions, IdentityCredentials, MailCredentials, TokenAcquirer};
//!
//! # async fn example() -> Result<(), zenhub_auth::AuthError> {
//! let acquirer = TokenAcquirer::chromium(AuthConfig::from_env(), BrowserOptions::default());
//! let token = acquirer
//!     .acquire_token(
//!         &IdentityCredentials::new("octocat", "password"),
//!         &MailCredentials::new("octocat@gmail.com", "app-password"),
//!     )
//!     .await?;
//! println!("{}", token.expose());
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod cookies;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod mail;
pub mod token;

// Re-export main types
pub use browser::{BrowserLauncher, BrowserOptions, BrowserSession};
pub use config::AuthConfig;
pub use cookies::{CookieCache, CookieRecord};
pub use credentials::{IdentityCredentials, MailCredentials};
pub use error::AuthError;
pub use flow::{read_token, PageState, Step, TokenAcquirer};
pub use mail::MailClient;
pub use token::ApiToken;
