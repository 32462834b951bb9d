//! A store bundled with its sweeper.
//!
//! [`ManagedStore`] starts the background sweep when it is constructed and
//! stops it on [`ManagedStore::shutdown`] or drop, tying the sweeper's
//! lifetime to the store's.

use super::expiry::{ExpiryConfig, ExpirySweeper};
use super::RecordStore;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug)]
pub struct ManagedStore<S: RecordStore + 'static> {
    store: Arc<S>,
    sweeper: ExpirySweeper,
}

impl<S: RecordStore + 'static> ManagedStore<S> {
    /// Wraps `store` and starts sweeping it. Must be called inside a Tokio runtime.
    pub fn start(store: S, config: ExpiryConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    /// Like [`ManagedStore::start`], for a store that is already shared.
    pub fn from_arc(store: Arc<S>, config: ExpiryConfig) -> Self {
        let sweeper = ExpirySweeper::start(Arc::clone(&store), config);
        Self { store, sweeper }
    }

    /// A shared handle to the underlying store.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub fn is_sweeping(&self) -> bool {
        !self.sweeper.is_finished()
    }

    /// Stops the sweeper and waits for it to exit. The store itself stays
    /// usable through any outstanding [`ManagedStore::store`] handles.
    pub async fn shutdown(self) {
        self.sweeper.shutdown().await;
    }
}

impl<S: RecordStore + 'static> Deref for ManagedStore<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.store
    }
}
