use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat};

/// A single blocked identifier.
///
/// `expires_at` is a unix timestamp in seconds. Zero or a negative value
/// marks a permanent entry which is only ever dropped by an explicit remove.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub key: String,
    pub expires_at: i64,
}

impl Entry {
    pub fn new(key: impl Into<String>, expires_at: i64) -> Self {
        Self {
            key: key.into(),
            expires_at,
        }
    }

    pub fn permanent(key: impl Into<String>) -> Self {
        Self::new(key, 0)
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at <= 0
    }

    pub fn is_expired(&self, now: i64) -> bool {
        !self.is_permanent() && self.expires_at < now
    }

    /// Seconds left until expiry, `None` for permanent entries.
    pub fn remaining(&self, now: i64) -> Option<i64> {
        if self.is_permanent() {
            None
        } else {
            Some((self.expires_at - now).max(0))
        }
    }
}

// Timed entries ascend by expiry, permanent entries always sort last.
// Ties fall back to the key so that listings are stable.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_permanent(), other.is_permanent()) {
            (true, true) => self
                .key
                .cmp(&other.key)
                .then_with(|| self.expires_at.cmp(&other.expires_at)),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .expires_at
                .cmp(&other.expires_at)
                .then_with(|| self.key.cmp(&other.key)),
        }
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_permanent() {
            return write!(f, "{} (permanent)", self.key);
        }
        match DateTime::from_timestamp(self.expires_at, 0) {
            Some(at) => write!(
                f,
                "{} (until {})",
                self.key,
                at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            None => write!(f, "{} (until {})", self.key, self.expires_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative_expiry_are_permanent() {
        assert!(Entry::new("1.1.1.1", 0).is_permanent());
        assert!(Entry::new("1.1.1.1", -5).is_permanent());
        assert!(!Entry::new("1.1.1.1", 1).is_permanent());
    }

    #[test]
    fn test_permanent_entry_never_expires() {
        let entry = Entry::permanent("1.1.1.1");
        assert!(!entry.is_expired(i64::MAX));
        assert_eq!(entry.remaining(100), None);
    }

    #[test]
    fn test_expiry_is_strictly_in_the_past() {
        let entry = Entry::new("1.1.1.1", 100);
        assert!(!entry.is_expired(99));
        assert!(!entry.is_expired(100));
        assert!(entry.is_expired(101));
    }

    #[test]
    fn test_remaining_saturates_at_zero() {
        let entry = Entry::new("1.1.1.1", 100);
        assert_eq!(entry.remaining(40), Some(60));
        assert_eq!(entry.remaining(500), Some(0));
    }

    #[test]
    fn test_permanent_entries_sort_after_timed_ones() {
        let mut entries = vec![
            Entry::permanent("a"),
            Entry::new("b", 300),
            Entry::new("c", -1),
            Entry::new("d", 100),
            Entry::new("e", 200),
        ];
        entries.sort();

        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["d", "e", "b", "a", "c"]);
    }

    #[test]
    fn test_equal_expiry_orders_by_key() {
        let mut entries = vec![Entry::new("z", 10), Entry::new("a", 10)];
        entries.sort();
        assert_eq!(entries[0].key, "a");
        assert_eq!(entries[1].key, "z");
    }

    #[test]
    fn test_display_permanent() {
        assert_eq!(
            Entry::permanent("5.6.7.8").to_string(),
            "5.6.7.8 (permanent)"
        );
    }

    #[test]
    fn test_display_timed() {
        assert_eq!(
            Entry::new("1.2.3.4", 1_700_000_000).to_string(),
            "1.2.3.4 (until 2023-11-14T22:13:20Z)"
        );
    }
}
