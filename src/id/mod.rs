//! Identifier Generators
//!
//! Every record in the store is addressed by an opaque identifier. This
//! module defines the [`IdGenerator`] capability and its two strategies:
//!
//! - [`RandomGenerator`]: cryptographically secure random bytes rendered
//!   as base64 text. Suitable for identifiers handed to untrusted clients.
//! - [`SequentialGenerator`]: a wrapping `u64` counter. Cheap and
//!   predictable, useful for internal keys and tests.
//!
//! Generators are plain values passed into a store at construction time.
//! There is no process-wide default instance.
//!
//! ## Example
//!
//! ```
//! use flashsession::id::{IdGenerator, SequentialGenerator};
//!
//! let ids = SequentialGenerator::with_range(10, 11);
//! assert_eq!(ids.next_id(), 10);
//! assert_eq!(ids.next_id(), 11);
//! assert_eq!(ids.next_id(), 10); // wrapped
//! ```

pub mod random;
pub mod sequential;

pub use random::{RandomGenerator, DEFAULT_ID_SIZE};
pub use sequential::SequentialGenerator;

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

/// Produces the next identifier of type [`IdGenerator::Id`].
///
/// Implementations must be safe to call from many threads at once
/// without external synchronization.
pub trait IdGenerator: Send + Sync {
    /// The identifier type. It must round-trip through its textual form
    /// so it can travel as a correlation token.
    type Id: Clone + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static;

    /// Returns the next identifier.
    fn next_id(&self) -> Self::Id;

    /// Number of distinct identifiers issued before the sequence repeats,
    /// or `None` when there is no useful bound.
    fn span(&self) -> Option<u64> {
        None
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    type Id = G::Id;

    fn next_id(&self) -> Self::Id {
        (**self).next_id()
    }

    fn span(&self) -> Option<u64> {
        (**self).span()
    }
}
