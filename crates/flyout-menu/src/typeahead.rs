#![forbid(unsafe_code)]

//! Type-ahead search.
//!
//! Printable keys accumulate into a buffer that resets after an idle
//! timeout. Matching is a case-insensitive prefix test against each node's
//! text value.
//!
//! # Invariants
//!
//! 1. A buffer of one repeated character (`"aaa"`) searches for that single
//!    character, so repeated presses cycle through items starting with it.
//! 2. Single-character searches start *after* the current match; longer
//!    searches start *at* it so extending a match keeps it.
//! 3. Returning the current match is reported as "no change" (`None`).

use web_time::{Duration, Instant};

/// Accumulating type-ahead buffer with idle expiry.
#[derive(Debug, Clone)]
pub struct TypeAhead {
    buffer: String,
    last_input: Option<Instant>,
    timeout: Duration,
}

impl TypeAhead {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: String::new(),
            last_input: None,
            timeout,
        }
    }

    /// Append `c`, first clearing the buffer if it has gone stale.
    /// Returns the buffer after the push.
    pub fn push(&mut self, c: char, now: Instant) -> &str {
        self.expire(now);
        self.buffer.push(c);
        self.last_input = Some(now);
        &self.buffer
    }

    /// Clear the buffer if the idle timeout elapsed since the last key.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.last_input {
            Some(last) if now.saturating_duration_since(last) >= self.timeout => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_input = None;
    }

    /// Whether a search is in progress. Space counts as a search character
    /// only while this holds.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.buffer.is_empty()
    }

    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// When the current buffer will expire.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.last_input.map(|last| last + self.timeout)
    }
}

/// Find the next candidate whose text starts with `search`.
///
/// `candidates` are `(key, text)` pairs in display order, already limited
/// to enabled, navigable nodes. `current` is the highlighted key, if any.
pub fn find_match<'a, K, I>(candidates: I, search: &str, current: Option<K>) -> Option<K>
where
    K: Copy + PartialEq,
    I: IntoIterator<Item = (K, &'a str)>,
{
    let candidates: Vec<(K, &str)> = candidates.into_iter().collect();
    let mut chars = search.chars();
    let first = chars.next()?;
    let repeated = chars.all(|c| c == first);
    let normalized: String;
    let needle = if repeated {
        normalized = first.to_string();
        normalized.as_str()
    } else {
        search
    };
    let needle = needle.to_lowercase();

    let start = current
        .and_then(|cur| candidates.iter().position(|(k, _)| *k == cur))
        .unwrap_or(0);
    let exclude_current = needle.chars().count() == 1;

    let found = candidates
        .iter()
        .cycle()
        .skip(start)
        .take(candidates.len())
        .filter(|(k, _)| !(exclude_current && Some(*k) == current))
        .find(|(_, text)| text.to_lowercase().starts_with(&needle))
        .map(|(k, _)| *k);

    if found == current { None } else { found }
}
