//! The "fill N bytes with cryptographically strong randomness" collaborator (§6).
//!
//! The source this crate is based on falls back to a non-cryptographic PRNG
//! when its OpenSSL backend cannot be loaded. That fallback is not carried
//! forward here: callers that cannot obtain strong randomness get
//! [`CryptoCoreError::InternalFailure`] rather than a silently degraded salt
//! or nonce.

pub use rand_core::{CryptoRng, Error as RngError, RngCore};

use crate::error::{CryptoCoreError, Result};

/// Fills `buf` with cryptographically strong random bytes.
///
/// Any [`CryptoRng`] implementation is accepted, matching how the rest of
/// the crate accepts `rand_core`-compatible generators rather than
/// hard-coding one. `OsRng` (available through the `default-rng` feature,
/// on by default) is the expected production source.
pub fn fill_random(rng: &mut (impl RngCore + CryptoRng), buf: &mut [u8]) -> Result<()> {
    rng.try_fill_bytes(buf)
        .map_err(|_| CryptoCoreError::InternalFailure("RNG collaborator failed to fill buffer"))
}

/// The default cryptographic RNG, gated behind the `default-rng` feature
/// exactly as the teacher crate gates its own `rand_core/getrandom` wiring.
#[cfg(feature = "default-rng")]
pub fn os_rng() -> impl RngCore + CryptoRng {
    rand_core::OsRng
}
