//! zenhub-auth CLI - fetch the Zenhub frontend API token for board automation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zenhub_auth::browser::BrowserOptions;
use zenhub_auth::{AuthConfig, CookieCache, IdentityCredentials, MailCredentials, TokenAcquirer};

/// zenhub-auth - Log in to Zenhub through GitHub and print the frontend API token.
#[derive(Parser)]
#[command(name = "zenhub-auth")]
#[command(about = "Acquire the Zenhub frontend API token via a scripted GitHub login")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and print the token on stdout
    Token {
        /// GitHub username
        #[arg(env = "GITHUB_USERNAME")]
        github_username: String,

        /// GitHub password
        #[arg(env = "GITHUB_PASSWORD", hide_env_values = true)]
        github_password: String,

        /// Gmail address receiving GitHub's device verification mails
        #[arg(env = "GMAIL_USERNAME")]
        mail_username: String,

        /// Gmail app password
        #[arg(env = "GMAIL_APP_PASSWORD", hide_env_values = true)]
        mail_password: String,

        /// Write the token to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Cookie cache directory (overrides ZENHUB_AUTH_COOKIE_DIR)
        #[arg(long)]
        cookie_dir: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },

    /// Seed the cookie cache from a URI-encoded JSON map of domain to cookies
    SeedCookies {
        /// Encoded cookies, e.g. from a CI secret; blank is a no-op
        #[arg(default_value = "")]
        cookies: String,

        /// Cookie cache directory (overrides ZENHUB_AUTH_COOKIE_DIR)
        #[arg(long)]
        cookie_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for the token
    let filter = if cli.verbose {
        EnvFilter::new("zenhub_auth=debug,info")
    } else {
        EnvFilter::new("zenhub_auth=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Token {
            github_username,
            github_password,
            mail_username,
            mail_password,
            output,
            cookie_dir,
            headful,
        } => {
            let identity = IdentityCredentials::new(github_username, github_password);
            let mail = MailCredentials::new(mail_username, mail_password);
            run_token(&identity, &mail, output, cookie_dir, headful).await
        }
        Commands::SeedCookies {
            cookies,
            cookie_dir,
        } => run_seed_cookies(&cookies, cookie_dir),
    }
}

fn load_config(cookie_dir: Option<PathBuf>) -> AuthConfig {
    let mut config = AuthConfig::from_env();
    if let Some(dir) = cookie_dir {
        config.cookie_dir = dir;
    }
    config
}

async fn run_token(
    identity: &IdentityCredentials,
    mail: &MailCredentials,
    output: Option<PathBuf>,
    cookie_dir: Option<PathBuf>,
    headful: bool,
) -> Result<()> {
    let config = load_config(cookie_dir);
    let options = BrowserOptions {
        headless: !headful,
        ..BrowserOptions::default()
    };

    let acquirer = TokenAcquirer::chromium(config, options);
    let token = acquirer
        .acquire_token(identity, mail)
        .await
        .context("Failed to acquire Zenhub API token")?;

    match output {
        Some(path) => {
            std::fs::write(&path, token.expose())
                .with_context(|| format!("Failed to write token to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Token written");
        }
        None => println!("{}", token.expose()),
    }

    Ok(())
}

fn run_seed_cookies(encoded: &str, cookie_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(cookie_dir);
    let cache = CookieCache::new(&config.cookie_dir);
    let count = cache
        .seed_from_encoded(encoded)
        .context("Failed to seed cookie cache")?;
    tracing::info!(domains = count, "Cookie cache ready");
    Ok(())
}
