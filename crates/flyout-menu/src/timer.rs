#![forbid(unsafe_code)]

//! Deadline queue for cancellable scheduled callbacks.
//!
//! Nothing here sleeps or spawns: the owner asks for [`TimerQueue::next_deadline`],
//! waits however its host waits, and calls [`TimerQueue::pop_due`] with the
//! current time. Entries carry a caller-defined key describing what to do
//! when they fire.

use web_time::Instant;

#[derive(Debug, Clone)]
struct Entry<K> {
    seq: u64,
    deadline: Instant,
    key: K,
}

/// Pending timers, fired earliest-deadline first (ties in schedule order).
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    entries: Vec<Entry<K>>,
    next_seq: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<K> TimerQueue<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire at `deadline`.
    pub fn schedule(&mut self, deadline: Instant, key: K) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { seq, deadline, key });
    }

    /// Cancel every entry whose key matches. Returns how many were removed.
    pub fn cancel_matching(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.key));
        before - self.entries.len()
    }

    /// Remove and return the earliest entry due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<K> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by(|(_, a), (_, b)| a.deadline.cmp(&b.deadline).then(a.seq.cmp(&b.seq)))
            .map(|(idx, _)| idx)?;
        Some(self.entries.remove(idx).key)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Whether any pending key matches.
    pub fn any(&self, mut pred: impl FnMut(&K) -> bool) -> bool {
        self.entries.iter().any(|e| pred(&e.key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
