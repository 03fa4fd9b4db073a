//! Process-wide default blacklist.
//!
//! The default instance is created lazily on first use. Nothing reaps it
//! until the embedding program calls [`Reaper::spawn`] with [`global()`].
//!
//! [`Reaper::spawn`]: super::Reaper::spawn

use std::sync::Arc;

use lazy_static::lazy_static;

use super::entry::Entry;
use super::error::BlacklistError;
use super::list::IpBlacklist;

lazy_static! {
    static ref DEFAULT_BLACKLIST: Arc<IpBlacklist> = Arc::new(IpBlacklist::new());
}

pub fn global() -> Arc<IpBlacklist> {
    DEFAULT_BLACKLIST.clone()
}

pub fn add(key: &str, duration_secs: i64) -> Result<(), BlacklistError> {
    DEFAULT_BLACKLIST.add(key, duration_secs)
}

pub fn remove(key: &str) -> Result<(), BlacklistError> {
    DEFAULT_BLACKLIST.remove(key)
}

pub fn contains(key: &str) -> bool {
    DEFAULT_BLACKLIST.contains(key)
}

pub fn snapshot() -> Vec<Entry> {
    DEFAULT_BLACKLIST.snapshot()
}
