//! Cryptographically secure random identifiers.
//!
//! Each call draws `size` bytes from the operating system's CSPRNG and
//! encodes them with the standard base64 alphabet. With the default of
//! 32 bytes the collision probability is negligible for any realistic
//! number of live sessions.

use super::IdGenerator;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

/// Default number of random bytes per identifier.
pub const DEFAULT_ID_SIZE: usize = 32;

/// Random string identifier generator.
///
/// Holds no state beyond its configured size. If the entropy source
/// fails, `next_id` panics: handing out weak identifiers would be worse
/// than stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomGenerator {
    size: usize,
}

impl RandomGenerator {
    /// Creates a generator producing [`DEFAULT_ID_SIZE`] random bytes per id.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_ID_SIZE)
    }

    /// Creates a generator producing `size` random bytes per id.
    pub fn with_size(size: usize) -> Self {
        Self { size }
    }

    /// Number of random bytes behind each identifier.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomGenerator {
    type Id = String;

    fn next_id(&self) -> String {
        let mut buffer = vec![0u8; self.size];
        // OsRng::fill_bytes panics if the OS entropy source is unavailable.
        OsRng.fill_bytes(&mut buffer);
        BASE64.encode(&buffer)
    }
}
