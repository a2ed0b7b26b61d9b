//! Patent identifier allocation.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{PatentId, unix_millis};

/// Hands out strictly increasing identifiers.
///
/// Each id is the current wall-clock time in milliseconds, or one more
/// than the previous id when the clock has not advanced (or went
/// backwards). Safe to share between tasks.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> PatentId {
        self.next_at(unix_millis())
    }

    fn next_at(&self, now: u64) -> PatentId {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return PatentId::from(candidate),
                Err(observed) => last = observed,
            }
        }
    }
}
