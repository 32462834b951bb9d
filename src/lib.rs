//! # FlashSession - An In-Memory Expiring Session Store
//!
//! FlashSession keeps short-lived, opaque-keyed records ("sessions") in
//! memory so that independent requests from the same client can share
//! state. Records expire after a time-to-live and are reclaimed both
//! lazily (on read) and actively (by a background sweeper).
//!
//! ## Features
//!
//! - **Concurrent**: One RwLock-guarded map, safe under true parallelism
//! - **TTL Support**: Every record carries an expiration instant
//! - **Lazy + Active Expiry**: Expired records are never returned, and a
//!   cancellable Tokio task sweeps the ones nobody reads again
//! - **Pluggable Identifiers**: Cryptographically random or sequential ids
//! - **Copy-out / Copy-in**: Handlers mutate a copy and commit it with `update`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            FlashSession                                 │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ Transport   │───>│  Session    │───>│ MemoryStore │<── IdGenerator   │
//! │  │ (token in)  │    │  Binding    │    │  RwLock map │<── Clock         │
//! │  └─────────────┘    └─────────────┘    └──────▲──────┘                  │
//! │                                               │ cleanup()               │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashsession::binding::SessionBinding;
//! use flashsession::id::RandomGenerator;
//! use flashsession::storage::{ExpiryConfig, ManagedStore, MemoryStore};
//!
//! #[derive(Clone, Default)]
//! struct Visit { count: u64 }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Store with hourly sweeping, stopped on shutdown
//!     let managed = ManagedStore::start(
//!         MemoryStore::<RandomGenerator, Visit>::new(RandomGenerator::new()),
//!         ExpiryConfig::default(),
//!     );
//!     let binding = SessionBinding::new(managed.store());
//!
//!     // Per request: load, mutate, commit, hand the token back
//!     let mut session = binding.load(cookie_value).unwrap();
//!     session.payload.count += 1;
//!     binding.commit(&session).unwrap();
//!     let token = SessionBinding::<MemoryStore<RandomGenerator, Visit>>::token(&session);
//!
//!     managed.shutdown().await;
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`id`]: Identifier generators
//! - [`storage`]: Records, the expiring store and the sweeper
//! - [`binding`]: Token-to-record request binding
//! - [`commands`]: Line-protocol command handler for the demo server
//! - [`connection`]: Client connection management for the demo server
//! - [`config`]: Server configuration from environment and arguments

pub mod binding;
pub mod commands;
pub mod config;
pub mod connection;
pub mod id;
pub mod storage;

// Re-export commonly used types for convenience
pub use binding::SessionBinding;
pub use commands::{ClientSession, CommandHandler};
pub use connection::{handle_connection, ConnectionStats};
pub use id::{IdGenerator, RandomGenerator, SequentialGenerator};
pub use storage::{
    start_expiry_sweeper, ExpiryConfig, ExpirySweeper, ManagedStore, MemoryStore, Record,
    RecordStore, StoreConfig, StoreError,
};

/// The default port the demo server listens on
pub const DEFAULT_PORT: u16 = 7070;

/// The default host the demo server binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of FlashSession
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
