//! Thread-Safe Expiring Record Store
//!
//! This module implements the core of FlashSession: a concurrent map from
//! identifier to [`Record`] where every record carries an expiration instant.
//!
//! ## Design Decisions
//!
//! 1. **One RwLock**: A single lock guards the whole map. Lookups share it;
//!    inserts, deletes and sweeps take it exclusively, so a sweep is atomic
//!    with respect to any single create or delete.
//! 2. **Lazy Expiry**: A read that finds an expired record removes it on the
//!    spot and reports [`StoreError::Expired`]. It can never be read again.
//! 3. **Active Expiry**: [`MemoryStore::cleanup`] removes every expired
//!    record. The [`ExpirySweeper`](super::ExpirySweeper) calls it on an
//!    interval so records nobody reads again still get reclaimed.
//! 4. **Copy-out / Copy-in**: Reads return an owned copy. Changes reach the
//!    store only through [`MemoryStore::update`], the same contract a
//!    persistence-backed store would need.
//!
//! ## Read Path
//!
//! ```text
//!  read(id)
//!     │
//!     ▼
//!  ┌──────────────┐  absent   ┌──────────┐
//!  │ shared lock  │──────────>│ NotFound │
//!  └──────┬───────┘           └──────────┘
//!         │ present
//!         ▼
//!    live? ──yes──> clone out
//!         │ no
//!         ▼
//!  ┌──────────────────┐ re-check ┌─────────┐
//!  │ exclusive lock   │─────────>│ Expired │  (record removed)
//!  └──────────────────┘          └─────────┘
//! ```

use super::clock::{Clock, SystemClock};
use super::error::StoreError;
use super::record::Record;
use crate::id::IdGenerator;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default lifetime of a freshly created record (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// How many identifiers `create` will mint before giving up when each one
/// collides with a live record.
pub const MAX_MINT_ATTEMPTS: usize = 64;

/// Configuration for a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Lifetime given to records by [`MemoryStore::create`] (default: 1 hour)
    pub default_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
        }
    }
}

/// The create/read/update/delete/cleanup capability of a session store.
///
/// [`MemoryStore`] is the in-process implementation. A persistence-backed
/// store would serialize the record in `update`; callers therefore always
/// call `update` after mutating a record, even though the in-memory store
/// could get by without it.
pub trait RecordStore: Send + Sync {
    /// Identifier type. Travels as text in correlation tokens.
    type Id: Clone + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static;

    /// Caller-defined session payload.
    type Payload: Clone + Default + Send + Sync;

    /// Mints a fresh identifier and stores a record with a default payload.
    fn create(&self) -> Result<Record<Self::Id, Self::Payload>, StoreError>;

    /// Fetches a live record.
    fn read(&self, id: &Self::Id) -> Result<Record<Self::Id, Self::Payload>, StoreError>;

    /// Commits the payload of a previously fetched record.
    fn update(&self, record: &Record<Self::Id, Self::Payload>) -> Result<(), StoreError>;

    /// Removes a record. Deleting an absent id succeeds.
    fn delete(&self, id: &Self::Id) -> Result<(), StoreError>;

    /// Removes every expired record, returning how many were removed.
    fn cleanup(&self) -> u64;

    /// Number of records physically held, expired or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot of store counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Records currently held (including expired, unswept ones)
    pub records: u64,
    /// Total successful creates
    pub creates: u64,
    /// Total reads attempted
    pub reads: u64,
    /// Total successful updates
    pub updates: u64,
    /// Total deletes that removed a record
    pub deletes: u64,
    /// Records reclaimed because they expired (lazily or by sweep)
    pub expired: u64,
    /// Reads that found nothing live
    pub misses: u64,
}

/// In-memory expiring session store.
///
/// Designed to be wrapped in an `Arc` and shared between every request
/// handler and the background sweeper. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use flashsession::id::SequentialGenerator;
/// use flashsession::storage::{MemoryStore, StoreError};
///
/// let store: MemoryStore<SequentialGenerator, Vec<String>> =
///     MemoryStore::new(SequentialGenerator::new());
///
/// let mut record = store.create().unwrap();
/// record.payload.push("hello".to_string());
/// store.update(&record).unwrap();
///
/// let fetched = store.read(record.id()).unwrap();
/// assert_eq!(fetched.payload, vec!["hello".to_string()]);
///
/// store.delete(record.id()).unwrap();
/// assert_eq!(store.read(record.id()), Err(StoreError::NotFound));
/// ```
pub struct MemoryStore<G: IdGenerator, T> {
    /// Mints identifiers for new records
    generator: G,

    /// The records, keyed by identifier
    records: RwLock<HashMap<G::Id, Record<G::Id, T>>>,

    /// Time source for every expiry decision
    clock: Arc<dyn Clock>,

    config: StoreConfig,

    /// Stamp for the next inserted record
    next_generation: AtomicU64,

    create_count: AtomicU64,
    read_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    expired_count: AtomicU64,
    miss_count: AtomicU64,
}

impl<G: IdGenerator, T> Debug for MemoryStore<G, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("records", &self.read_map().len())
            .field("default_ttl", &self.config.default_ttl)
            .field("create_count", &self.create_count.load(Ordering::Relaxed))
            .field("read_count", &self.read_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl<G: IdGenerator, T: Clone + Default> MemoryStore<G, T> {
    /// Creates a store with the default configuration and the system clock.
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, StoreConfig::default())
    }

    /// Creates a store with the given configuration and the system clock.
    pub fn with_config(generator: G, config: StoreConfig) -> Self {
        Self::with_clock(generator, config, Arc::new(SystemClock))
    }

    /// Creates a store that reads time from `clock`.
    pub fn with_clock(generator: G, config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            generator,
            records: RwLock::new(HashMap::new()),
            clock,
            config,
            next_generation: AtomicU64::new(1),
            create_count: AtomicU64::new(0),
            read_count: AtomicU64::new(0),
            update_count: AtomicU64::new(0),
            delete_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Creates a record that lives for the configured default TTL.
    pub fn create(&self) -> Result<Record<G::Id, T>, StoreError> {
        self.create_with_ttl(self.config.default_ttl)
    }

    /// Creates a record that lives for `ttl`.
    ///
    /// Identifiers that collide with a live record are skipped. An expired
    /// occupant is reclaimed and its identifier reused. After
    /// [`MAX_MINT_ATTEMPTS`] consecutive collisions, or one full pass over a
    /// generator with a smaller [`IdGenerator::span`], this fails with
    /// [`StoreError::GeneratorExhausted`]. A `ttl` beyond
    /// [`MAX_TTL`](super::MAX_TTL) is clamped.
    pub fn create_with_ttl(&self, ttl: Duration) -> Result<Record<G::Id, T>, StoreError> {
        let max_attempts = self.mint_attempts();
        let now = self.clock.now();
        let mut records = self.write_map();

        for attempt in 1..=max_attempts {
            let id = self.generator.next_id();

            if let Some(existing) = records.get(&id) {
                if !existing.is_expired_at(now) {
                    trace!(id = %id, attempt, "Minted id is still live, skipping");
                    continue;
                }
                // Expired occupant: reclaim it and reuse the slot
                self.expired_count.fetch_add(1, Ordering::Relaxed);
            }

            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            let record =
                Record::with_ttl(id.clone(), now, ttl, T::default()).with_generation(generation);
            records.insert(id, record.clone());
            self.create_count.fetch_add(1, Ordering::Relaxed);

            trace!(id = %record.id(), ttl_ms = ttl.as_millis() as u64, "Record created");
            return Ok(record);
        }

        warn!(
            attempts = max_attempts,
            records = records.len(),
            "Could not mint an unused id"
        );
        Err(StoreError::GeneratorExhausted {
            attempts: max_attempts,
        })
    }

    /// Minting attempts per create: one pass over a small id space at most.
    fn mint_attempts(&self) -> usize {
        match self.generator.span() {
            Some(span) if span < MAX_MINT_ATTEMPTS as u64 => span.max(1) as usize,
            _ => MAX_MINT_ATTEMPTS,
        }
    }

    /// Reads a live record.
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored under `id`, and
    /// [`StoreError::Expired`] if the stored record's lifetime has ended. An
    /// expired record is removed before this returns.
    pub fn read(&self, id: &G::Id) -> Result<Record<G::Id, T>, StoreError> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now();

        // Fast path: shared lock for existing, live records
        {
            let records = self.read_map();
            match records.get(id) {
                Some(record) if !record.is_expired_at(now) => return Ok(record.clone()),
                Some(_) => {}
                None => {
                    self.miss_count.fetch_add(1, Ordering::Relaxed);
                    return Err(StoreError::NotFound);
                }
            }
        }

        // Record is expired - need the write lock to remove it
        let mut records = self.write_map();
        match records.get(id) {
            Some(record) if record.is_expired_at(now) => {
                records.remove(id);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                debug!(id = %id, "Expired record reclaimed on read");
                Err(StoreError::Expired)
            }
            // Race: the slot was reused between the two locks
            Some(record) => Ok(record.clone()),
            // Race: a sweep or delete got there first
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::NotFound)
            }
        }
    }

    /// Commits the payload of `record` back into the store.
    ///
    /// Fails with [`StoreError::NotFound`] if the record has been deleted,
    /// or if its id now belongs to a different record, and with
    /// [`StoreError::Expired`] if it expired in the meantime.
    pub fn update(&self, record: &Record<G::Id, T>) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut records = self.write_map();

        match records.get_mut(record.id()) {
            Some(stored) if stored.generation() != record.generation() => {
                Err(StoreError::NotFound)
            }
            Some(stored) if stored.is_expired_at(now) => {
                records.remove(record.id());
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::Expired)
            }
            Some(stored) => {
                stored.payload = record.payload.clone();
                self.update_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    /// Deletes a record. Deleting an id that is not stored is not an error.
    pub fn delete(&self, id: &G::Id) -> Result<(), StoreError> {
        let mut records = self.write_map();

        if records.remove(id).is_some() {
            self.delete_count.fetch_add(1, Ordering::Relaxed);
            trace!(id = %id, "Record deleted");
        }

        Ok(())
    }

    /// Extends a live record's lifetime to `now + ttl` and returns it.
    ///
    /// A `ttl` beyond [`MAX_TTL`](super::MAX_TTL) is clamped.
    pub fn touch(&self, id: &G::Id, ttl: Duration) -> Result<Record<G::Id, T>, StoreError> {
        let now = self.clock.now();
        let mut records = self.write_map();

        match records.get_mut(id) {
            Some(record) if record.is_expired_at(now) => {
                records.remove(id);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::Expired)
            }
            Some(record) => {
                record.renew(now, ttl);
                Ok(record.clone())
            }
            None => Err(StoreError::NotFound),
        }
    }

    /// Remaining lifetime of a live record.
    pub fn ttl(&self, id: &G::Id) -> Result<Duration, StoreError> {
        let now = self.clock.now();
        let records = self.read_map();

        match records.get(id) {
            Some(record) if record.is_expired_at(now) => Err(StoreError::Expired),
            Some(record) => Ok(record.remaining_at(now)),
            None => Err(StoreError::NotFound),
        }
    }

    /// Checks if a live record exists under `id`.
    pub fn contains(&self, id: &G::Id) -> bool {
        let now = self.clock.now();
        self.read_map()
            .get(id)
            .map(|record| !record.is_expired_at(now))
            .unwrap_or(false)
    }

    /// Removes every expired record.
    ///
    /// This is called by the background expiry sweeper.
    ///
    /// # Returns
    ///
    /// Returns the number of records that were removed.
    pub fn cleanup(&self) -> u64 {
        let now = self.clock.now();
        let mut records = self.write_map();

        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        let removed = (before - records.len()) as u64;

        if removed > 0 {
            self.expired_count.fetch_add(removed, Ordering::Relaxed);
            debug!(
                removed = removed,
                remaining = records.len(),
                "Expired records cleaned up"
            );
        }

        removed
    }

    /// Drops every record.
    pub fn clear(&self) {
        self.write_map().clear();
    }

    /// Number of records physically held, including expired records that
    /// have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            records: self.len() as u64,
            creates: self.create_count.load(Ordering::Relaxed),
            reads: self.read_count.load(Ordering::Relaxed),
            updates: self.update_count.load(Ordering::Relaxed),
            deletes: self.delete_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
        }
    }
}

impl<G: IdGenerator, T> MemoryStore<G, T> {
    // Every mutation below completes before its guard drops, so the map is
    // consistent even if a holder panicked.
    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<G::Id, Record<G::Id, T>>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, HashMap<G::Id, Record<G::Id, T>>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<G, T> RecordStore for MemoryStore<G, T>
where
    G: IdGenerator,
    T: Clone + Default + Send + Sync,
{
    type Id = G::Id;
    type Payload = T;

    fn create(&self) -> Result<Record<G::Id, T>, StoreError> {
        MemoryStore::create(self)
    }

    fn read(&self, id: &G::Id) -> Result<Record<G::Id, T>, StoreError> {
        MemoryStore::read(self, id)
    }

    fn update(&self, record: &Record<G::Id, T>) -> Result<(), StoreError> {
        MemoryStore::update(self, record)
    }

    fn delete(&self, id: &G::Id) -> Result<(), StoreError> {
        MemoryStore::delete(self, id)
    }

    fn cleanup(&self) -> u64 {
        MemoryStore::cleanup(self)
    }

    fn len(&self) -> usize {
        MemoryStore::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{RandomGenerator, SequentialGenerator};
    use crate::storage::clock::ManualClock;
    use crate::storage::MAX_TTL;
    use std::collections::HashSet;
    use std::thread;
    use tokio_test::{assert_err, assert_ok};

    type SeqStore = MemoryStore<SequentialGenerator, Vec<u32>>;

    fn manual_store(generator: SequentialGenerator, ttl: Duration) -> (SeqStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::with_clock(
            generator,
            StoreConfig { default_ttl: ttl },
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (store, clock)
    }

    #[test]
    fn test_create_and_read() {
        let store = SeqStore::new(SequentialGenerator::new());

        let created = assert_ok!(store.create());
        let fetched = assert_ok!(store.read(created.id()));

        assert_eq!(fetched.id(), created.id());
        assert!(fetched.payload.is_empty());
        assert_eq!(fetched.expires_at(), created.expires_at());
    }

    #[test]
    fn test_create_uses_default_ttl() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(90));

        let record = assert_ok!(store.create());
        assert_eq!(record.expires_at() - clock.now(), Duration::from_secs(90));
        assert_eq!(assert_ok!(store.ttl(record.id())), Duration::from_secs(90));
    }

    #[test]
    fn test_create_with_custom_ttl() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(90));

        let record = assert_ok!(store.create_with_ttl(Duration::from_secs(5)));
        clock.advance(Duration::from_secs(6));

        assert_eq!(store.read(record.id()), Err(StoreError::Expired));
    }

    #[test]
    fn test_read_nonexistent() {
        let store = SeqStore::new(SequentialGenerator::new());
        assert_eq!(store.read(&42), Err(StoreError::NotFound));
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_update_is_copy_in() {
        let store = SeqStore::new(SequentialGenerator::new());

        let mut record = assert_ok!(store.create());
        record.payload.push(1);

        // Not visible until committed
        assert!(assert_ok!(store.read(record.id())).payload.is_empty());

        assert_ok!(store.update(&record));
        assert_eq!(assert_ok!(store.read(record.id())).payload, vec![1]);
    }

    #[test]
    fn test_update_deleted_record() {
        let store = SeqStore::new(SequentialGenerator::new());

        let record = assert_ok!(store.create());
        assert_ok!(store.delete(record.id()));

        assert_eq!(store.update(&record), Err(StoreError::NotFound));
    }

    #[test]
    fn test_update_expired_record() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(1));

        let record = assert_ok!(store.create());
        clock.advance(Duration::from_secs(2));

        assert_eq!(store.update(&record), Err(StoreError::Expired));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_does_not_touch_reused_id() {
        let (store, clock) = manual_store(SequentialGenerator::with_range(0, 0), Duration::from_secs(1));

        let stale = assert_ok!(store.create());
        clock.advance(Duration::from_secs(2));

        // Same id minted again after the first record expired
        let mut fresh = assert_ok!(store.create());
        assert_eq!(stale.id(), fresh.id());

        assert_eq!(store.update(&stale), Err(StoreError::NotFound));

        fresh.payload.push(9);
        assert_ok!(store.update(&fresh));
    }

    #[test]
    fn test_update_rejects_stale_copy_minted_at_same_instant() {
        let (store, _clock) = manual_store(SequentialGenerator::with_range(0, 0), Duration::from_secs(60));

        let mut stale = assert_ok!(store.create_with_ttl(Duration::ZERO));
        // Clock has not moved: same id, same creation instant
        let fresh = assert_ok!(store.create());
        assert_eq!(stale.id(), fresh.id());
        assert_eq!(stale.created_at(), fresh.created_at());

        stale.payload.push(666);
        assert_eq!(store.update(&stale), Err(StoreError::NotFound));

        let stored = assert_ok!(store.read(fresh.id()));
        assert!(stored.payload.is_empty());
    }

    #[test]
    fn test_oversized_ttl_does_not_panic() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(60));

        let record = assert_ok!(store.create_with_ttl(Duration::from_secs(u64::MAX)));
        assert_eq!(assert_ok!(store.ttl(record.id())), MAX_TTL);

        let touched = assert_ok!(store.touch(record.id(), Duration::MAX));
        assert_eq!(touched.expires_at(), clock.now() + MAX_TTL);

        clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert!(store.contains(record.id()));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = SeqStore::new(SequentialGenerator::new());

        let record = assert_ok!(store.create());
        assert_ok!(store.delete(record.id()));
        assert_ok!(store.delete(record.id()));
        assert_ok!(store.delete(&999));

        assert_eq!(store.read(record.id()), Err(StoreError::NotFound));
        assert_eq!(store.stats().deletes, 1);
    }

    #[test]
    fn test_expired_record_is_never_returned() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(10));

        let record = assert_ok!(store.create());

        clock.advance(Duration::from_secs(9));
        assert_ok!(store.read(record.id()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.read(record.id()), Err(StoreError::Expired));

        // Lazily removed, never resurrected
        assert_eq!(store.read(record.id()), Err(StoreError::NotFound));
        assert!(!store.contains(record.id()));
    }

    #[test]
    fn test_expire_scenario() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(1));

        let a = assert_ok!(store.create());
        assert_ok!(store.read(a.id()));

        clock.advance(Duration::from_millis(1500));
        let err = assert_err!(store.read(a.id()));
        assert!(err.is_not_found());

        store.cleanup();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_cleanup_expired() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(60));

        let expiring: Vec<_> = (0..5)
            .map(|_| store.create_with_ttl(Duration::from_secs(1)).unwrap())
            .collect();
        let live: Vec<_> = (0..3).map(|_| store.create().unwrap()).collect();

        clock.advance(Duration::from_secs(2));

        assert_eq!(store.cleanup(), 5);
        assert_eq!(store.len(), 3);

        for record in &expiring {
            assert_eq!(store.read(record.id()), Err(StoreError::NotFound));
        }
        for record in &live {
            assert_ok!(store.read(record.id()));
        }

        // Nothing left to sweep
        assert_eq!(store.cleanup(), 0);
        assert_eq!(store.stats().expired, 5);
    }

    #[test]
    fn test_touch_extends_lifetime() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(10));

        let record = assert_ok!(store.create());
        clock.advance(Duration::from_secs(8));

        let touched = assert_ok!(store.touch(record.id(), Duration::from_secs(10)));
        assert_eq!(touched.expires_at(), clock.now() + Duration::from_secs(10));

        clock.advance(Duration::from_secs(8));
        assert_ok!(store.read(record.id()));
    }

    #[test]
    fn test_touch_expired_and_missing() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(1));

        let record = assert_ok!(store.create());
        clock.advance(Duration::from_secs(1));

        assert_eq!(
            store.touch(record.id(), Duration::from_secs(10)),
            Err(StoreError::Expired)
        );
        assert_eq!(
            store.touch(&12345, Duration::from_secs(10)),
            Err(StoreError::NotFound)
        );
    }

    #[test]
    fn test_ttl_and_contains() {
        let (store, clock) = manual_store(SequentialGenerator::new(), Duration::from_secs(30));

        let record = assert_ok!(store.create());
        clock.advance(Duration::from_secs(10));

        assert!(store.contains(record.id()));
        assert_eq!(assert_ok!(store.ttl(record.id())), Duration::from_secs(20));

        clock.advance(Duration::from_secs(20));
        assert!(!store.contains(record.id()));
        assert_eq!(store.ttl(record.id()), Err(StoreError::Expired));
        assert_eq!(store.ttl(&777), Err(StoreError::NotFound));
    }

    #[test]
    fn test_wraparound_skips_live_ids() {
        let (store, clock) = manual_store(SequentialGenerator::with_range(1, 3), Duration::from_secs(60));

        let first = assert_ok!(store.create_with_ttl(Duration::from_secs(1)));
        let second = assert_ok!(store.create());
        let third = assert_ok!(store.create());
        assert_eq!((*first.id(), *second.id(), *third.id()), (1, 2, 3));

        clock.advance(Duration::from_secs(2));

        // Generator wraps to 1 (expired, reused)
        let fourth = assert_ok!(store.create());
        assert_eq!(*fourth.id(), 1);

        // Next are 2 and 3 (live) then 1 (live again): one full pass, nothing free
        assert_eq!(
            store.create(),
            Err(StoreError::GeneratorExhausted { attempts: 3 })
        );
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_large_id_space_caps_at_max_attempts() {
        let (store, _clock) = manual_store(SequentialGenerator::with_range(0, 99), Duration::from_secs(60));
        for _ in 0..100 {
            assert_ok!(store.create());
        }

        assert_eq!(
            store.create(),
            Err(StoreError::GeneratorExhausted {
                attempts: MAX_MINT_ATTEMPTS
            })
        );
    }

    #[test]
    fn test_wraparound_finds_free_slot() {
        let store = SeqStore::new(SequentialGenerator::with_range(0, 3));

        let ids: Vec<u64> = (0..4).map(|_| *store.create().unwrap().id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        assert_ok!(store.delete(&2));

        // 0 and 1 are live and skipped, 2 is free again
        let record = assert_ok!(store.create());
        assert_eq!(*record.id(), 2);
    }

    #[test]
    fn test_clear() {
        let store = SeqStore::new(SequentialGenerator::new());
        for _ in 0..10 {
            assert_ok!(store.create());
        }

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_stats() {
        let store = SeqStore::new(SequentialGenerator::new());

        let mut record = assert_ok!(store.create());
        assert_ok!(store.read(record.id()));
        record.payload.push(3);
        assert_ok!(store.update(&record));
        assert_err!(store.read(&100));
        assert_ok!(store.delete(record.id()));

        let stats = store.stats();
        assert_eq!(stats.records, 0);
        assert_eq!(stats.creates, 1);
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_random_ids() {
        let store: MemoryStore<RandomGenerator, ()> = MemoryStore::new(RandomGenerator::new());

        let record = assert_ok!(store.create());
        assert_eq!(record.id().len(), 44); // 32 bytes in padded base64
        assert_ok!(store.read(record.id()));
        assert_eq!(
            store.read(&"not-a-real-id".to_string()),
            Err(StoreError::NotFound)
        );
    }

    #[test]
    fn test_through_trait_object_generics() {
        fn roundtrip<S: RecordStore<Payload = Vec<u32>>>(store: &S) {
            let mut record = store.create().unwrap();
            record.payload.push(5);
            store.update(&record).unwrap();
            assert_eq!(store.read(record.id()).unwrap().payload, vec![5]);
            store.delete(record.id()).unwrap();
            assert!(store.is_empty());
        }

        roundtrip(&SeqStore::new(SequentialGenerator::new()));
    }

    #[test]
    fn test_concurrent_creates_are_distinct() {
        let store = Arc::new(SeqStore::new(SequentialGenerator::new()));
        let mut handles = vec![];

        for _ in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                (0..100)
                    .map(|_| *store.create().unwrap().id())
                    .collect::<Vec<_>>()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "duplicate id {}", id);
            }
        }

        assert_eq!(ids.len(), 1000);
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_concurrent_mixed_operations() {
        let store = Arc::new(MemoryStore::<SequentialGenerator, Vec<u32>>::with_config(
            SequentialGenerator::new(),
            StoreConfig {
                default_ttl: Duration::from_millis(5),
            },
        ));
        let mut handles = vec![];

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let mut kept = vec![];
                for j in 0..200u32 {
                    let ttl = if j % 2 == 0 {
                        Duration::from_secs(3600)
                    } else {
                        Duration::from_millis(1)
                    };
                    let mut record = store.create_with_ttl(ttl).unwrap();
                    record.payload.push(j);
                    let _ = store.update(&record);
                    let _ = store.read(record.id());

                    if j % 4 == 0 {
                        store.delete(record.id()).unwrap();
                    } else if j % 2 == 0 {
                        kept.push(*record.id());
                    }
                    if i == 0 && j % 25 == 0 {
                        store.cleanup();
                    }
                }
                kept
            }));
        }

        let mut kept = vec![];
        for handle in handles {
            kept.extend(handle.join().unwrap());
        }

        thread::sleep(Duration::from_millis(10));
        store.cleanup();

        // Only long-lived, undeleted records survive
        assert_eq!(store.len(), kept.len());
        for id in kept {
            let record = store.read(&id).unwrap();
            assert_eq!(record.payload.len(), 1);
        }
    }
}
