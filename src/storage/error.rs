//! Store error taxonomy.

/// Errors returned by record store operations.
///
/// `NotFound` and `Expired` are ordinary outcomes of a lookup, not
/// failures of the store. Callers normally treat them the same way; see
/// [`StoreError::is_not_found`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record exists under the identifier
    #[error("no record with that id")]
    NotFound,

    /// A record exists but its lifetime has ended
    #[error("record has expired")]
    Expired,

    /// Every freshly minted identifier collided with a live record
    #[error("id generator exhausted after {attempts} attempts")]
    GeneratorExhausted { attempts: usize },

    /// Failure inside a backing store
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// True for outcomes meaning "no valid record": `NotFound` and `Expired`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound | StoreError::Expired)
    }
}
