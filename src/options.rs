//! Tunable parameters for container operations, separated from the
//! operations themselves so defaults can change without touching call sites.

use crate::container::{KeyLength, DEFAULT_CHUNK_SIZE, PBKDF2_ITERATIONS};

/// Options shared by encryption and decryption.
#[derive(Debug, Clone)]
pub struct CryptoOptions {
    /// Bytes read/written per streaming chunk.
    pub chunk_size: usize,
    /// PBKDF2 iteration count used when deriving keys.
    pub pbkdf2_iterations: u32,
}

impl Default for CryptoOptions {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, pbkdf2_iterations: PBKDF2_ITERATIONS }
    }
}

/// Options specific to [`crate::container::encrypt_file`].
#[derive(Debug, Clone)]
pub struct EncryptOptions {
    pub shared: CryptoOptions,
    /// AES key length to encrypt under.
    pub key_length: KeyLength,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self { shared: CryptoOptions::default(), key_length: KeyLength::Aes256 }
    }
}

/// Options specific to [`crate::container::decrypt_file`].
///
/// Decryption reads its key length from the container header itself, so this
/// only carries the streaming chunk size and the PBKDF2 iteration count -- the
/// header does not record the iteration count, so a caller that overrode it
/// on encryption must pass the same value back here. It exists as its own
/// type so a caller can tune it without reaching into [`EncryptOptions`]'s
/// encryption-only fields, and so future header-external knobs (e.g. a
/// scratch directory override) have somewhere to live.
#[derive(Debug, Clone, Default)]
pub struct DecryptOptions {
    pub shared: CryptoOptions,
}
