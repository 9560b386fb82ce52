//! Ordered fallback chains.
//!
//! A chain is a plain slice of named strategies. The driver runs them in
//! order and stops at the first one that returns something, so the
//! fallback order is data that tests can inspect.

/// One step of a chain: a key naming the step and a matcher that returns
/// `None` for "no match".
pub struct Strategy<K, T> {
    pub key: K,
    pub run: fn(&str) -> Option<T>,
}

impl<K: Copy, T> Strategy<K, T> {
    pub const fn new(key: K, run: fn(&str) -> Option<T>) -> Self {
        Self { key, run }
    }
}

/// Run strategies in order; return the first hit together with its key.
pub fn first_match<K: Copy, T>(chain: &[Strategy<K, T>], text: &str) -> Option<(K, T)> {
    chain
        .iter()
        .find_map(|s| (s.run)(text).map(|v| (s.key, v)))
}
