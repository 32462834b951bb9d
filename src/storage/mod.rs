//! Storage Module
//!
//! This module provides the core of FlashSession: a thread-safe store of
//! expiring records and the background sweeper that reclaims them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MemoryStore                           │
//! │   IdGenerator ──> RwLock<HashMap<Id, Record<Id, T>>>        │
//! │                         ▲                                   │
//! │                   Clock │ (expiry decisions)                │
//! └─────────────────────────┼───────────────────────────────────┘
//!                           │ cleanup()
//!              ┌────────────┴──────────────┐
//!              │      ExpirySweeper        │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Single RwLock**: Concurrent readers, exclusive writers and sweeps
//! - **Lazy Expiry**: Expired records are reclaimed when read
//! - **Active Expiry**: The sweeper reclaims records nobody reads again
//! - **Copy-out / Copy-in**: Reads hand out copies, `update` commits them
//! - **Injectable Clock**: Expiry can be tested without sleeping
//!
//! ## Example
//!
//! ```
//! use flashsession::id::RandomGenerator;
//! use flashsession::storage::{MemoryStore, StoreConfig};
//! use std::time::Duration;
//!
//! let store: MemoryStore<RandomGenerator, Option<String>> = MemoryStore::with_config(
//!     RandomGenerator::new(),
//!     StoreConfig { default_ttl: Duration::from_secs(1800) },
//! );
//!
//! let mut session = store.create().unwrap();
//! session.payload = Some("Ariz".to_string());
//! store.update(&session).unwrap();
//!
//! let again = store.read(session.id()).unwrap();
//! assert_eq!(again.payload.as_deref(), Some("Ariz"));
//! ```

pub mod clock;
pub mod error;
pub mod expiry;
pub mod managed;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StoreError;
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper, DEFAULT_SWEEP_INTERVAL};
pub use managed::ManagedStore;
pub use record::{Record, MAX_TTL};
pub use store::{
    MemoryStore, RecordStore, StoreConfig, StoreStats, DEFAULT_TTL, MAX_MINT_ATTEMPTS,
};
