//! Time-windowed memory of recently seen keys.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;

/// Default window for change-feed duplicate suppression.
pub const DEFAULT_DEDUPE_WINDOW_SECS: i64 = 120;

/// Remembers keys for a bounded time.
///
/// The feed only redelivers within short windows, so entries older than the
/// window are dropped to keep memory flat over long sessions.
#[derive(Debug, Clone)]
pub struct DedupeCache<K> {
    window: Duration,
    seen: HashMap<K, DateTime<Utc>>,
}

impl<K> DedupeCache<K>
where
    K: Eq + Hash,
{
    /// Creates an empty cache holding keys for `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// Records `key` and returns `true` unless it was already seen inside
    /// the window.
    pub fn first_sighting(&mut self, key: K, now: DateTime<Utc>) -> bool {
        if self.contains(&key, now) {
            return false;
        }
        self.seen.insert(key, now);
        true
    }

    /// Records `key`, restarting its window.
    pub fn insert(&mut self, key: K, now: DateTime<Utc>) {
        self.seen.insert(key, now);
    }

    /// Returns `true` when `key` was recorded inside the window.
    #[must_use]
    pub fn contains(&self, key: &K, now: DateTime<Utc>) -> bool {
        self.seen
            .get(key)
            .is_some_and(|recorded| now - *recorded <= self.window)
    }

    /// Drops every entry older than the window.
    pub fn purge(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.seen.retain(|_, recorded| now - *recorded <= window);
    }

    /// Returns the number of remembered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` when nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
