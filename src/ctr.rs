//! AES-CTR streaming mode (C5).
//!
//! Encryption and decryption are the same operation: each block of the
//! counter is AES-encrypted to produce a keystream block, which is XORed
//! with the input. The counter is a 16-byte big-endian value, incremented
//! once per block.

use crate::aes::{AesContext, BLOCK_SIZE};
use crate::error::Result;

/// Increments a 16-byte big-endian counter in place, matching the carry
/// propagation of a 128-bit unsigned integer increment.
fn increment_counter(counter: &mut [u8; BLOCK_SIZE]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Builds the initial 16-byte counter block from an 8-byte nonce: the
/// nonce occupies the high-order bytes and the low-order 8 bytes start
/// at zero, so the first 2^64 blocks are addressable before the nonce
/// portion would ever need to change.
#[must_use]
pub fn initial_counter_block(nonce: &[u8; 8]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block[..8].copy_from_slice(nonce);
    block
}

/// Encrypts or decrypts `input` into `output` under AES-CTR, using and
/// advancing `counter` in place.
///
/// `cipher` must already have had [`AesContext::set_key`] called on it.
/// `output` must be at least `input.len()` bytes. Calling this again with
/// the advanced `counter` continues the same keystream, so a caller can
/// process a file in chunks without re-deriving anything.
///
/// # Errors
/// Propagates any error from the underlying block encryption, in
/// particular [`crate::error::CryptoCoreError::NotInitialized`] if
/// `cipher` has no key scheduled, and
/// [`crate::error::CryptoCoreError::BufferTooSmall`] if `output` is
/// shorter than `input`.
pub fn ctr_crypt(
    cipher: &AesContext,
    input: &[u8],
    output: &mut [u8],
    counter: &mut [u8; BLOCK_SIZE],
) -> Result<()> {
    if output.len() < input.len() {
        return Err(crate::error::CryptoCoreError::BufferTooSmall {
            needed: input.len(),
            available: output.len(),
        });
    }

    let mut keystream = [0u8; BLOCK_SIZE];
    for (in_chunk, out_chunk) in input.chunks(BLOCK_SIZE).zip(output.chunks_mut(BLOCK_SIZE)) {
        cipher.encrypt_block(counter, &mut keystream)?;
        for (o, (i, k)) in out_chunk.iter_mut().zip(in_chunk.iter().zip(keystream.iter())) {
            *o = i ^ k;
        }
        increment_counter(counter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn run(key: &[u8], bits: u32, mut counter: [u8; BLOCK_SIZE], input: &[u8]) -> Vec<u8> {
        let mut cipher = AesContext::new();
        cipher.set_key(key, bits).unwrap();
        let mut out = vec![0u8; input.len()];
        ctr_crypt(&cipher, input, &mut out, &mut counter).unwrap();
        out
    }

    /// NIST SP 800-38A F.5.1, first block.
    #[test]
    fn nist_aes128_ctr_single_block() {
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let counter = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let pt = hex!("6bc1bee22e409f96e93d7e117393172a");
        let out = run(&key, 128, counter, &pt);
        assert_eq!(out, hex!("874d6191b620e3261bef6864990db6ce"));
    }

    /// NIST SP 800-38A F.5.3, first block.
    #[test]
    fn nist_aes192_ctr_single_block() {
        let key = hex!("8e73b0f7da0e6452c810f32b809079e562f8ead2522c6b7b");
        let counter = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let pt = hex!("6bc1bee22e409f96e93d7e117393172a");
        let out = run(&key, 192, counter, &pt);
        assert_eq!(out, hex!("1abc932417521ca24f2b0459fe7e6e0b"));
    }

    /// NIST SP 800-38A F.5.5, first block.
    #[test]
    fn nist_aes256_ctr_single_block() {
        let key = hex!("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4");
        let counter = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let pt = hex!("6bc1bee22e409f96e93d7e117393172a");
        let out = run(&key, 256, counter, &pt);
        assert_eq!(out, hex!("601ec313775789a5b7a7f504bbf3d228"));
    }

    /// NIST SP 800-38A F.5.1, two-block continuation: counter must carry
    /// across calls to `ctr_crypt` exactly as it does within one call.
    #[test]
    fn nist_aes128_ctr_two_blocks() {
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let counter = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let pt = hex!(
            "6bc1bee22e409f96e93d7e117393172a"
            "ae2d8a571e03ac9c9eb76fac45af8e51"
        );
        let out = run(&key, 128, counter, &pt);
        assert_eq!(
            out,
            hex!(
                "874d6191b620e3261bef6864990db6ce"
                "9806f66b7970fdff8617187bb9fffdff"
            )
        );
    }

    #[test]
    fn decrypt_undoes_encrypt() {
        let key = [0x42u8; 16];
        let counter = [0u8; BLOCK_SIZE];
        let plaintext = b"the quick brown fox jumps over the lazy dog, many times over";
        let ciphertext = run(&key, 128, counter, plaintext);
        let recovered = run(&key, 128, counter, &ciphertext);
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn counter_wraps_all_bytes() {
        let mut counter = [0xffu8; BLOCK_SIZE];
        increment_counter(&mut counter);
        assert_eq!(counter, [0u8; BLOCK_SIZE]);
    }

    #[test]
    fn counter_increments_last_byte_only_by_default() {
        let mut counter = [0u8; BLOCK_SIZE];
        increment_counter(&mut counter);
        let mut expected = [0u8; BLOCK_SIZE];
        expected[15] = 1;
        assert_eq!(counter, expected);
    }
}
