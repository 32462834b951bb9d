//! Stored records and their expiration predicate.

use std::time::{Duration, Instant};

/// Longest lifetime a record can be given. Longer TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// `now + ttl` with `ttl` clamped to [`MAX_TTL`].
fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now)
}

/// A stored session: identifier, lifetime bounds and a caller-defined payload.
///
/// Records leave the store by value. Mutating `payload` changes only the
/// caller's copy until it is committed with `MemoryStore::update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<I, T> {
    /// The identifier this record is stored under
    id: I,
    /// When this record was created
    created_at: Instant,
    /// When this record stops being reachable
    expires_at: Instant,
    /// Insertion stamp assigned by the store, distinguishes reuses of an id
    generation: u64,
    /// Caller-defined session data
    pub payload: T,
}

impl<I, T: Default> Record<I, T> {
    /// Creates a record with a default payload.
    pub fn new(id: I, created_at: Instant, expires_at: Instant) -> Self {
        Self {
            id,
            created_at,
            expires_at,
            generation: 0,
            payload: T::default(),
        }
    }
}

impl<I, T> Record<I, T> {
    /// Creates a record that lives for `ttl` starting at `now`.
    ///
    /// A `ttl` beyond [`MAX_TTL`] is clamped.
    pub fn with_ttl(id: I, now: Instant, ttl: Duration, payload: T) -> Self {
        Self {
            id,
            created_at: now,
            expires_at: deadline(now, ttl),
            generation: 0,
            payload,
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> &I {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Checks if this record has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks if this record has expired as of `now`.
    ///
    /// A record is live strictly before `expires_at`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime as of `now`, zero once expired.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Moves the expiration to `now + ttl`, clamped like [`Record::with_ttl`].
    pub(crate) fn renew(&mut self, now: Instant, ttl: Duration) {
        self.expires_at = deadline(now, ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_default_payload() {
        let now = Instant::now();
        let record: Record<u64, Vec<String>> =
            Record::new(7, now, now + Duration::from_secs(60));

        assert_eq!(*record.id(), 7);
        assert!(record.payload.is_empty());
        assert_eq!(record.created_at(), now);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Instant::now();
        let record = Record::with_ttl("a", now, Duration::from_secs(10), ());

        assert!(!record.is_expired_at(now));
        assert!(!record.is_expired_at(now + Duration::from_secs(9)));
        // Expiring exactly at expires_at, not after it
        assert!(record.is_expired_at(now + Duration::from_secs(10)));
        assert!(record.is_expired_at(now + Duration::from_secs(11)));
    }

    #[test]
    fn test_is_expired_uses_wall_clock() {
        let now = Instant::now();
        let live = Record::with_ttl(1u64, now, Duration::from_secs(3600), ());
        let dead = Record::with_ttl(2u64, now, Duration::ZERO, ());

        assert!(!live.is_expired());
        assert!(dead.is_expired());
    }

    #[test]
    fn test_remaining() {
        let now = Instant::now();
        let record = Record::with_ttl(1u64, now, Duration::from_secs(30), ());

        assert_eq!(record.remaining_at(now), Duration::from_secs(30));
        assert_eq!(
            record.remaining_at(now + Duration::from_secs(10)),
            Duration::from_secs(20)
        );
        assert_eq!(
            record.remaining_at(now + Duration::from_secs(60)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_renew() {
        let now = Instant::now();
        let mut record = Record::with_ttl(1u64, now, Duration::from_secs(5), ());

        let later = now + Duration::from_secs(4);
        record.renew(later, Duration::from_secs(5));

        assert_eq!(record.expires_at(), later + Duration::from_secs(5));
        assert!(!record.is_expired_at(now + Duration::from_secs(8)));
    }

    #[test]
    fn test_oversized_ttl_is_clamped() {
        let now = Instant::now();
        let mut record = Record::with_ttl(1u64, now, Duration::MAX, ());
        assert_eq!(record.remaining_at(now), MAX_TTL);

        record.renew(now, Duration::from_secs(u64::MAX));
        assert_eq!(record.expires_at(), now + MAX_TTL);
        assert!(!record.is_expired_at(now + Duration::from_secs(3600)));
    }
}
