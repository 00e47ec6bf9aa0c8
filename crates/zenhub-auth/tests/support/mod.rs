//! Scripted in-memory browser and mailbox for driving the login flow.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use zenhub_auth::error::Result;
use zenhub_auth::{
    AuthError, BrowserLauncher, BrowserSession, CookieRecord, MailClient, MailCredentials,
};

pub const ENTRY: &str = "https://app.zenhub.com";
pub const APP_LOGIN: &str = "https://app.zenhub.com/login";
pub const PROVIDER_ENTRY: &str = "https://auth.zenhub.com/login?state=xyz";
pub const GITHUB_LOGIN: &str = "https://github.com/login?client_id=zenhub&return_to=%2Flogin";
pub const VERIFY_DEVICE: &str = "https://github.com/sessions/verified-device";
pub const LANDING: &str = "https://app.zenhub.com/workspaces/team-board";

pub const APP_SIGN_IN: &str = ".zhc-button--color-primary";
pub const PROVIDER_SIGN_IN: &str = "button#github-login";
pub const SUBMIT: &str = "[name=\"commit\"]";
pub const OTP: &str = "#otp";
pub const LANDING_MARKER: &str = ".zhc-sidebar__navigation h1";
pub const VERIFY_SUBJECT: &str = "[GitHub] Please verify your device";

/// Something the flow asked the browser to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Goto(String),
    SetCookies(Vec<(String, String)>),
    WaitForSelector(String),
    Click(String),
    Type(String, String),
    PressEnter(String),
    Cookies(String),
    StorageRead(String),
    BodyHtml,
    Close,
}

/// The fake web: pages, what each control leads to, and what the browser holds.
#[derive(Debug, Default)]
pub struct World {
    pub url: String,
    /// goto target -> URL actually landed on
    pub redirects: HashMap<String, String>,
    /// selector -> URL reached by clicking it
    pub click_targets: HashMap<String, String>,
    /// selector -> URL reached by pressing Enter in it
    pub enter_targets: HashMap<String, String>,
    /// URL -> selectors present on that page
    pub elements: HashMap<String, HashSet<String>>,
    /// host -> cookies the browser reports there
    pub cookies: HashMap<String, Vec<CookieRecord>>,
    pub storage: HashMap<String, String>,
    pub fail_enter: bool,
    /// Reject cookie writes, as CDP does for malformed or unscoped cookies
    pub reject_cookies: bool,
    pub calls: Vec<Call>,
}

impl World {
    pub fn new() -> Self {
        Self {
            url: "about:blank".to_string(),
            ..Self::default()
        }
    }

    pub fn page(&mut self, url: &str, selectors: &[&str]) -> &mut Self {
        self.elements
            .entry(url.to_string())
            .or_default()
            .extend(selectors.iter().map(|s| (*s).to_string()));
        self
    }

    pub fn redirect(&mut self, from: &str, to: &str) -> &mut Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn on_click(&mut self, selector: &str, to: &str) -> &mut Self {
        self.click_targets.insert(selector.to_string(), to.to_string());
        self
    }

    pub fn on_enter(&mut self, selector: &str, to: &str) -> &mut Self {
        self.enter_targets.insert(selector.to_string(), to.to_string());
        self
    }

    pub fn token(&mut self, value: &str) -> &mut Self {
        self.storage.insert("api_token".to_string(), value.to_string());
        self
    }

    fn has_element(&self, selector: &str) -> bool {
        self.elements
            .get(&self.url)
            .is_some_and(|present| present.contains(selector))
    }

    fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

pub type SharedWorld = Arc<Mutex<World>>;

pub fn shared(world: World) -> SharedWorld {
    Arc::new(Mutex::new(world))
}

pub fn calls(world: &SharedWorld) -> Vec<Call> {
    world.lock().unwrap().calls.clone()
}

pub fn count(world: &SharedWorld, call: &Call) -> usize {
    calls(world).iter().filter(|c| *c == call).count()
}

pub fn position(world: &SharedWorld, pred: impl Fn(&Call) -> bool) -> Option<usize> {
    calls(world).iter().position(pred)
}

pub struct FakeBrowser {
    pub world: SharedWorld,
}

impl FakeBrowser {
    fn record(&self, call: Call) {
        self.world.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    async fn current_url(&self) -> Result<String> {
        Ok(self.world.lock().unwrap().url.clone())
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        let mut world = self.world.lock().unwrap();
        world.calls.push(Call::Goto(url.to_string()));
        let landed = world
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        world.url = landed;
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let mut world = self.world.lock().unwrap();
        world.calls.push(Call::WaitForSelector(selector.to_string()));
        if world.has_element(selector) {
            Ok(())
        } else {
            Err(AuthError::Timeout {
                what: format!("selector {selector}"),
                timeout,
            })
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let mut world = self.world.lock().unwrap();
        world.calls.push(Call::Click(selector.to_string()));
        if !world.has_element(selector) {
            return Err(AuthError::Browser(format!("no element for {selector}")));
        }
        if let Some(target) = world.click_targets.get(selector).cloned() {
            world.url = target;
        }
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        self.record(Call::Type(selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> Result<()> {
        let mut world = self.world.lock().unwrap();
        world.calls.push(Call::PressEnter(selector.to_string()));
        if world.fail_enter {
            return Err(AuthError::Browser("node detached".to_string()));
        }
        if let Some(target) = world.enter_targets.get(selector).cloned() {
            world.url = target;
        }
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>> {
        let mut world = self.world.lock().unwrap();
        let url = world.url.clone();
        world.calls.push(Call::Cookies(url));
        let host = world.host().unwrap_or_default();
        Ok(world.cookies.get(&host).cloned().unwrap_or_default())
    }

    async fn set_cookies(&mut self, cookies: &[CookieRecord]) -> Result<()> {
        let pairs = cookies
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect();
        let mut world = self.world.lock().unwrap();
        world.calls.push(Call::SetCookies(pairs));
        if world.reject_cookies {
            return Err(AuthError::Browser("Blank page can not have cookie".to_string()));
        }
        Ok(())
    }

    async fn local_storage_item(&self, key: &str) -> Result<Option<String>> {
        let mut world = self.world.lock().unwrap();
        world.calls.push(Call::StorageRead(key.to_string()));
        Ok(world.storage.get(key).cloned())
    }

    async fn body_html(&self) -> Result<String> {
        self.record(Call::BodyHtml);
        Ok("<body><div id=\"app\">fake page</div></body>".to_string())
    }

    async fn close(&mut self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}

pub struct FakeLauncher {
    pub world: SharedWorld,
    pub fail: bool,
}

impl FakeLauncher {
    pub fn new(world: &SharedWorld) -> Self {
        Self {
            world: Arc::clone(world),
            fail: false,
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail {
            return Err(AuthError::Launch("chrome not found".to_string()));
        }
        Ok(Box::new(FakeBrowser {
            world: Arc::clone(&self.world),
        }))
    }
}

/// What the fake mailbox does when searched.
#[derive(Debug, Clone)]
pub enum Inbox {
    /// One unseen message with the verification subject and this body.
    Verification(String),
    /// Unseen mail, none with the verification subject.
    Empty,
    /// Connection refused.
    Unreachable,
    /// The client blows up.
    Panics,
}

pub struct FakeMail {
    pub inbox: Inbox,
    pub searches: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeMail {
    pub fn new(inbox: Inbox) -> Self {
        Self {
            inbox,
            searches: Arc::default(),
        }
    }
}

#[async_trait]
impl MailClient for FakeMail {
    async fn take_unseen_by_subject(
        &self,
        credentials: &MailCredentials,
        subject: &str,
    ) -> Result<Option<String>> {
        self.searches
            .lock()
            .unwrap()
            .push((credentials.username.clone(), subject.to_string()));

        match &self.inbox {
            Inbox::Verification(body) if subject == VERIFY_SUBJECT => Ok(Some(body.clone())),
            Inbox::Verification(_) | Inbox::Empty => Ok(None),
            Inbox::Unreachable => Err(AuthError::Mail("connection refused".to_string())),
            Inbox::Panics => panic!("mailbox exploded"),
        }
    }
}

/// Zenhub login page -> primary button -> landing page.
pub fn app_login_world() -> World {
    let mut world = World::new();
    world
        .redirect(ENTRY, APP_LOGIN)
        .page(APP_LOGIN, &[APP_SIGN_IN])
        .on_click(APP_SIGN_IN, LANDING);
    world
}

/// Zenhub auth page -> GitHub login -> device verification -> landing page.
pub fn provider_world() -> World {
    let mut world = World::new();
    world
        .redirect(ENTRY, PROVIDER_ENTRY)
        .page(PROVIDER_ENTRY, &[PROVIDER_SIGN_IN])
        .on_click(PROVIDER_SIGN_IN, GITHUB_LOGIN)
        .page(GITHUB_LOGIN, &["#login_field", "#password", SUBMIT])
        .on_click(SUBMIT, VERIFY_DEVICE)
        .page(VERIFY_DEVICE, &[OTP])
        .on_enter(OTP, LANDING);
    world
}
