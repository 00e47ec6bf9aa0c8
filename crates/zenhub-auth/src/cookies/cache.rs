//! On-disk cookie cache, one JSON file per host name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AuthError, Result};

use super::CookieRecord;

/// Directory of `<host>.json` files.
#[derive(Debug, Clone)]
pub struct CookieCache {
    dir: PathBuf,
}

impl CookieCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Path of the cache file for `domain`.
    #[must_use]
    pub fn path_for(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("{domain}.json"))
    }

    /// Whether a cache entry exists for `domain`.
    #[must_use]
    pub fn contains(&self, domain: &str) -> bool {
        is_safe_domain(domain) && self.path_for(domain).exists()
    }

    /// Load the cookies cached for `domain`, or `None` when there is no entry.
    pub fn load(&self, domain: &str) -> Result<Option<Vec<CookieRecord>>> {
        if !self.contains(domain) {
            return Ok(None);
        }
        let content = std::fs::read_to_string(self.path_for(domain))?;
        let cookies: Vec<CookieRecord> = serde_json::from_str(&content)?;
        tracing::debug!(domain, count = cookies.len(), "Loaded cached cookies");
        Ok(Some(cookies))
    }

    /// Replace the cache entry for `domain`.
    pub fn save(&self, domain: &str, cookies: &[CookieRecord]) -> Result<()> {
        check_domain(domain)?;
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(cookies)?;
        std::fs::write(self.path_for(domain), content)?;
        tracing::debug!(domain, count = cookies.len(), "Saved cookies");
        Ok(())
    }

    /// Seed the cache from a URI-encoded JSON object mapping domain to cookies.
    ///
    /// Blank input is a no-op. Returns the number of domains written.
    pub fn seed_from_encoded(&self, encoded: &str) -> Result<usize> {
        self.ensure_dir()?;

        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Ok(0);
        }

        let decoded = urlencoding::decode(encoded).map_err(|e| {
            AuthError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        let domains: BTreeMap<String, Vec<CookieRecord>> = serde_json::from_str(&decoded)?;

        for (domain, cookies) in &domains {
            self.save(domain, cookies)?;
        }

        tracing::info!(domains = domains.len(), dir = %self.dir.display(), "Seeded cookie cache");
        Ok(domains.len())
    }
}

fn is_safe_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain != "."
        && domain != ".."
        && !domain.contains(['/', '\\'])
}

fn check_domain(domain: &str) -> Result<()> {
    if is_safe_domain(domain) {
        Ok(())
    } else {
        Err(AuthError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a cookie cache domain: {domain:?}"),
        )))
    }
}
