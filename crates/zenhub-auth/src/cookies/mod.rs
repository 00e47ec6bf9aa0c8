//! Per-domain cookie cache.
//!
//! Cookies are persisted after every navigation and injected again before
//! the browser next visits the same host, so repeated runs skip login hops
//! that are still authenticated.

mod cache;
mod record;

pub use cache::CookieCache;
pub use record::CookieRecord;
