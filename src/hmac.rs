//! RFC 2104 HMAC-SHA512 (C3).

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoCoreError, Result};
use crate::sha512::{Sha512Context, BLOCK_SIZE, DIGEST_SIZE};

/// A streaming HMAC-SHA512 context.
///
/// Holds the pre-hashed inner and outer contexts (each already fed its
/// padded key) so that [`finalize`](Self::finalize) only needs to fold in
/// the inner digest, matching the two-context construction used throughout
/// the original tool's streaming API.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacSha512Context {
    inner: Sha512Context,
    outer: Sha512Context,
    #[zeroize(skip)]
    initialized: bool,
}

impl Default for HmacSha512Context {
    fn default() -> Self {
        Self { inner: Sha512Context::new(), outer: Sha512Context::new(), initialized: false }
    }
}

impl HmacSha512Context {
    /// Derives the inner/outer key pads from `key` and seeds both contexts.
    ///
    /// Keys longer than [`BLOCK_SIZE`] are first hashed down to
    /// [`DIGEST_SIZE`] bytes; shorter keys are zero-padded, per RFC 2104.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        let mut key_block = [0u8; BLOCK_SIZE];
        if key.len() > BLOCK_SIZE {
            let digest = crate::sha512::sha512(key);
            key_block[..DIGEST_SIZE].copy_from_slice(&digest);
        } else if !key.is_empty() {
            key_block[..key.len()].copy_from_slice(key);
        }

        let mut i_key_pad = [0u8; BLOCK_SIZE];
        let mut o_key_pad = [0u8; BLOCK_SIZE];
        for i in 0..BLOCK_SIZE {
            i_key_pad[i] = key_block[i] ^ 0x36;
            o_key_pad[i] = key_block[i] ^ 0x5c;
        }
        key_block.zeroize();

        let mut inner = Sha512Context::new();
        inner.update(&i_key_pad);
        let mut outer = Sha512Context::new();
        outer.update(&o_key_pad);
        i_key_pad.zeroize();
        o_key_pad.zeroize();

        Self { inner, outer, initialized: true }
    }

    /// Feeds `data` into the running MAC. May be called any number of times.
    pub fn update(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.inner.update(data);
        }
    }

    /// Finalizes the MAC, writing [`DIGEST_SIZE`] bytes to `out`.
    ///
    /// # Errors
    /// Returns [`CryptoCoreError::NotInitialized`] if called on a default
    /// context never seeded via [`new`](Self::new), or
    /// [`CryptoCoreError::BufferTooSmall`] if `out` is too short.
    pub fn finalize(self, out: &mut [u8]) -> Result<()> {
        if !self.initialized {
            return Err(CryptoCoreError::NotInitialized);
        }
        if out.len() < DIGEST_SIZE {
            return Err(CryptoCoreError::BufferTooSmall { needed: DIGEST_SIZE, available: out.len() });
        }

        let mut inner_hash = [0u8; DIGEST_SIZE];
        self.inner.finalize(&mut inner_hash)?;

        let mut outer = self.outer;
        outer.update(&inner_hash);
        inner_hash.zeroize();
        outer.finalize(out)
    }
}

/// One-shot convenience wrapper: `HMAC-SHA512(key, data)`.
///
/// # Errors
/// Returns [`CryptoCoreError::BufferTooSmall`] if `out` is shorter than
/// [`DIGEST_SIZE`].
pub fn hmac_sha512(key: &[u8], data: &[u8], out: &mut [u8]) -> Result<()> {
    let mut ctx = HmacSha512Context::new(key);
    ctx.update(data);
    ctx.finalize(out)
}
