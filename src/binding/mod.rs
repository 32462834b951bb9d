//! Request Binding
//!
//! The adapter between a transport and the store. A request arrives with an
//! optional correlation token (a cookie value, a header, a protocol
//! argument); the binding turns it into a [`Record`] and, after the handler
//! has mutated its copy, commits the record back.
//!
//! ```text
//!   token? ──> load() ──> read(id) ──ok──> Record
//!                │            │
//!                │   missing / bad / NotFound / Expired
//!                │            ▼
//!                └──────> create() ─────> Record
//!
//!   handler mutates record.payload
//!
//!   commit(record) ──> update()       token(record) ──> client
//! ```

use crate::storage::{Record, RecordStore, StoreError};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Binds inbound correlation tokens to records in a [`RecordStore`].
#[derive(Debug)]
pub struct SessionBinding<S> {
    store: Arc<S>,
}

impl<S> Clone for SessionBinding<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore> SessionBinding<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Parses a token into the store's identifier type.
    ///
    /// Empty or malformed tokens yield `None`, meaning "no valid id".
    pub fn parse_token(token: &str) -> Option<S::Id> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        token.parse().ok()
    }

    /// Renders a record's identifier as the outbound token.
    pub fn token(record: &Record<S::Id, S::Payload>) -> String {
        record.id().to_string()
    }

    /// Fetches the record addressed by `token`, or creates a new one.
    ///
    /// A missing token, a token that does not parse, and a token whose
    /// record is gone or expired all fall back to [`RecordStore::create`].
    /// Any other store error is returned.
    pub fn load(&self, token: Option<&str>) -> Result<Record<S::Id, S::Payload>, StoreError> {
        if let Some(id) = token.and_then(Self::parse_token) {
            match self.store.read(&id) {
                Ok(record) => {
                    trace!(id = %id, "Loaded existing session");
                    return Ok(record);
                }
                Err(e) if e.is_not_found() => {
                    debug!(id = %id, reason = %e, "No valid session for token");
                }
                Err(e) => return Err(e),
            }
        }

        let record = self.store.create()?;
        debug!(id = %record.id(), "Created new session");
        Ok(record)
    }

    /// Fetches the record addressed by `token` without creating one.
    pub fn lookup(&self, token: &str) -> Result<Record<S::Id, S::Payload>, StoreError> {
        let id = Self::parse_token(token).ok_or(StoreError::NotFound)?;
        self.store.read(&id)
    }

    /// Commits a mutated record back to the store.
    pub fn commit(&self, record: &Record<S::Id, S::Payload>) -> Result<(), StoreError> {
        self.store.update(record).map_err(|e| {
            warn!(id = %record.id(), error = %e, "Failed to save session");
            e
        })
    }

    /// Ends the session addressed by `token`. Unknown tokens are ignored.
    pub fn end(&self, token: &str) -> Result<(), StoreError> {
        match Self::parse_token(token) {
            Some(id) => self.store.delete(&id),
            None => Ok(()),
        }
    }
}
