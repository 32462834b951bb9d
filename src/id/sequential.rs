//! Wrapping sequential identifiers.
//!
//! The counter lives behind its own mutex, independent of any store lock,
//! because ids are minted before the record they address is inserted.

use super::IdGenerator;
use std::sync::{Mutex, PoisonError};

/// Sequential `u64` generator over the inclusive range `first..=last`.
///
/// `next_id` returns the current value and then advances; after handing
/// out `last` it wraps back to `first`. Each value is issued exactly once
/// per pass through the range, even under concurrent callers.
#[derive(Debug)]
pub struct SequentialGenerator {
    /// First value in the sequence
    first: u64,
    /// Last value in the sequence
    last: u64,
    /// Next value to hand out
    next: Mutex<u64>,
}

impl SequentialGenerator {
    /// Creates a generator over the full `u64` range, starting at 0.
    pub fn new() -> Self {
        Self::with_range(0, u64::MAX)
    }

    /// Creates a generator over `first..=last`.
    ///
    /// Bounds given in the wrong order are swapped.
    pub fn with_range(first: u64, last: u64) -> Self {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };

        Self {
            first,
            last,
            next: Mutex::new(first),
        }
    }

    /// The floor of the sequence.
    pub fn first(&self) -> u64 {
        self.first
    }

    /// The ceiling of the sequence.
    pub fn last(&self) -> u64 {
        self.last
    }
}

impl Default for SequentialGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialGenerator {
    type Id = u64;

    fn next_id(&self) -> u64 {
        // A panic while holding this lock cannot leave the counter
        // half-written, so a poisoned lock is still usable.
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);

        let current = *next;
        *next = if current < self.last {
            current + 1
        } else {
            self.first
        };

        current
    }

    /// Saturates at `u64::MAX` for the full range.
    fn span(&self) -> Option<u64> {
        Some((self.last - self.first).saturating_add(1))
    }
}
