//! Smoke test for the chromiumoxide driver against the live Zenhub entry page.
//!
//! Opens Zenhub without logging in and reports which login page it landed on.
//!
//! Run with: cargo run --example smoke_entry_page

use zenhub_auth::browser::{BrowserLauncher, BrowserOptions, ChromiumLauncher};
use zenhub_auth::{AuthConfig, PageState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔷 Zenhub Entry Page Smoke Test\n");

    let config = AuthConfig::default();
    let launcher = ChromiumLauncher::new(BrowserOptions::default());

    println!("🌐 Launching browser...");
    let mut browser = launcher.launch().await?;

    browser.goto(&config.urls.entry).await?;
    if let Err(e) = browser.wait_for_network_idle(config.network_idle_timeout).await {
        println!("⚠️  {e}");
    }

    let url = browser.current_url().await?;
    println!("📍 Current URL: {url}");
    println!("🧭 Page state: {:?}", PageState::classify(&url, &config.urls));

    let cookies = browser.cookies().await?;
    println!("🍪 Cookies: {}", cookies.len());

    let html = browser.body_html().await?;
    println!("📝 Body length: {} bytes", html.len());

    browser.close().await?;

    println!("\n🎉 Smoke test complete!");
    Ok(())
}
