use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fnv::FnvHashMap;
use log::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::entry::Entry;
use super::error::{validate_key, BlacklistError};

/// Storage guarded by the blacklist lock.
///
/// `items` is the source of truth for membership. `expirations` orders the
/// timed entries by expiry so the reaper only ever touches the head, and
/// `permanent` keeps entries without expiry out of that ordering entirely.
/// Every key in `items` lives in exactly one of the two indexes.
#[derive(Debug, Default)]
struct Storage {
    items: FnvHashMap<String, i64>,
    expirations: BTreeSet<(i64, String)>,
    permanent: BTreeSet<String>,
}

impl Storage {
    fn insert(&mut self, key: &str, expires_at: i64) {
        if let Some(prev) = self.items.insert(key.to_string(), expires_at) {
            self.unindex(key, prev);
        }
        if expires_at > 0 {
            self.expirations.insert((expires_at, key.to_string()));
        } else {
            self.permanent.insert(key.to_string());
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.items.remove(key) {
            Some(expires_at) => {
                self.unindex(key, expires_at);
                true
            }
            None => false,
        }
    }

    fn unindex(&mut self, key: &str, expires_at: i64) {
        if expires_at > 0 {
            self.expirations.remove(&(expires_at, key.to_string()));
        } else {
            self.permanent.remove(key);
        }
    }

    /// Pops expired entries off the front of the expiry index.
    ///
    /// Stops at the first entry that has not expired yet. Permanent entries
    /// are never part of the index, so they can't be reached from here.
    fn evict_expired(&mut self, now: i64) -> Vec<String> {
        let mut evicted = Vec::new();
        while let Some((expires_at, _)) = self.expirations.first() {
            if *expires_at >= now {
                break;
            }
            if let Some((_, key)) = self.expirations.pop_first() {
                self.items.remove(&key);
                evicted.push(key);
            }
        }
        evicted
    }

    fn entries(&self) -> Vec<Entry> {
        let timed = self
            .expirations
            .iter()
            .map(|(expires_at, key)| Entry::new(key.clone(), *expires_at));
        let permanent = self
            .permanent
            .iter()
            .map(|key| Entry::permanent(key.clone()));
        timed.chain(permanent).collect()
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let indexed = self.expirations.len() + self.permanent.len();
        indexed == self.items.len()
            && self
                .expirations
                .iter()
                .all(|(expires_at, key)| self.items.get(key) == Some(expires_at))
            && self
                .permanent
                .iter()
                .all(|key| matches!(self.items.get(key), Some(at) if *at <= 0))
    }
}

/// A thread-safe set of blocked identifiers with optional expiry.
///
/// Mutations and eviction passes take the write lock, lookups and snapshots
/// share the read lock. Expired entries stay visible to [`contains`] until an
/// eviction pass runs, usually driven by a [`Reaper`].
///
/// [`contains`]: IpBlacklist::contains
/// [`Reaper`]: super::Reaper
#[derive(Debug)]
pub struct IpBlacklist<C: Clock = SystemClock> {
    clock: C,
    storage: RwLock<Storage>,
}

impl IpBlacklist<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for IpBlacklist<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> IpBlacklist<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            storage: RwLock::new(Storage::default()),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Blocks `key` for `duration_secs` seconds, or forever when the
    /// duration is zero or negative. Any previous entry for the key is
    /// replaced, not extended.
    pub fn add(&self, key: &str, duration_secs: i64) -> Result<(), BlacklistError> {
        validate_key(key)?;
        let expires_at = if duration_secs > 0 {
            self.clock.now().saturating_add(duration_secs)
        } else {
            0
        };

        self.write().insert(key, expires_at);
        debug!("Blocked {}", Entry::new(key, expires_at));
        Ok(())
    }

    /// Unblocks `key`. Removing a key that isn't present is not an error.
    pub fn remove(&self, key: &str) -> Result<(), BlacklistError> {
        validate_key(key)?;
        if self.write().remove(key) {
            debug!("Unblocked {}", key);
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().items.contains_key(key)
    }

    /// Returns every entry ordered by ascending expiry, permanent ones last.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.read().entries()
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// Runs a single eviction pass and returns how many entries it removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let evicted = self.write().evict_expired(now);
        if !evicted.is_empty() {
            debug!("Evicted {} expired entries: {:?}", evicted.len(), evicted);
        }
        evicted.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Storage> {
        self.storage.read().unwrap_or_else(|err| {
            warn!("Blacklist lock was poisoned, recovering");
            PoisonError::into_inner(err)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Storage> {
        self.storage.write().unwrap_or_else(|err| {
            warn!("Blacklist lock was poisoned, recovering");
            PoisonError::into_inner(err)
        })
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.read().is_consistent()
    }
}
