//! Random row values.

use rand::rngs::OsRng;
use rand::RngCore;

/// Produces random binary row values.
///
/// Backed by the operating system's entropy source by default. Errors are
/// returned to the caller as-is; the transaction attempt that asked for the
/// value is abandoned and retried by its worker.
pub struct PayloadGenerator<R = OsRng> {
    rng: R,
}

impl PayloadGenerator<OsRng> {
    pub fn os() -> Self {
        Self { rng: OsRng }
    }
}

impl<R: RngCore> PayloadGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Fill `buf` with fresh random bytes.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(buf)
    }

    /// A new value of `size` random bytes.
    pub fn generate(&mut self, size: usize) -> Result<Vec<u8>, rand::Error> {
        let mut value = vec![0u8; size];
        self.fill(&mut value)?;
        Ok(value)
    }
}
