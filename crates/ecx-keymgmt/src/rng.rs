//! Random sources for key generation.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::KeyMgmtError;

/// A random-bit source that may fail.
pub trait RandomSource: Send {
    /// Fill `dest` entirely with random bytes.
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), KeyMgmtError>;
}

impl<R> RandomSource for R
where
    R: RngCore + CryptoRng + Send,
{
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), KeyMgmtError> {
        self.try_fill_bytes(dest)
            .map_err(|e| KeyMgmtError::generation(format!("random source failed: {e}")))
    }
}

/// The operating system CSPRNG.
pub fn system_rng() -> Box<dyn RandomSource> {
    Box::new(OsRng)
}
