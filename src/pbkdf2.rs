//! RFC 8018 PBKDF2-HMAC-SHA512 key derivation (C4).

use zeroize::Zeroize;

use crate::error::{CryptoCoreError, Result};
use crate::hmac::HmacSha512Context;
use crate::sha512::DIGEST_SIZE;

/// Default salt substituted when the caller supplies none, matching the
/// container format's fallback for headers written before salts were
/// mandatory. Spells "AESC" in ASCII.
pub const DEFAULT_SALT: [u8; 4] = [0x41, 0x45, 0x53, 0x43];

/// Derives `output.len()` bytes of key material from `password` and `salt`
/// using `iterations` rounds of PBKDF2-HMAC-SHA512.
///
/// An empty `salt` is replaced with [`DEFAULT_SALT`] rather than treated as
/// an error, mirroring the original tool's behavior for legacy containers
/// that predate per-file random salts.
///
/// # Errors
/// Returns [`CryptoCoreError::InvalidArgument`] if `password` is empty,
/// `output` is empty, or `iterations` is zero.
pub fn pbkdf2_hmac_sha512(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output: &mut [u8],
) -> Result<()> {
    if password.is_empty() {
        return Err(CryptoCoreError::InvalidArgument("password must not be empty"));
    }
    if output.is_empty() {
        return Err(CryptoCoreError::InvalidArgument("output buffer must not be empty"));
    }
    if iterations == 0 {
        return Err(CryptoCoreError::InvalidArgument("iterations must be nonzero"));
    }

    let actual_salt: &[u8] = if salt.is_empty() { &DEFAULT_SALT } else { salt };

    let blocks_needed = output.len().div_ceil(DIGEST_SIZE);
    for block in 0..blocks_needed {
        let block_index = (block as u32) + 1;
        let mut salt_block = Vec::with_capacity(actual_salt.len() + 4);
        salt_block.extend_from_slice(actual_salt);
        salt_block.extend_from_slice(&block_index.to_be_bytes());

        let mut u = [0u8; DIGEST_SIZE];
        let mut ctx = HmacSha512Context::new(password);
        ctx.update(&salt_block);
        ctx.finalize(&mut u)?;
        salt_block.zeroize();

        let mut t = u;
        for _ in 1..iterations {
            let mut next = [0u8; DIGEST_SIZE];
            let mut ctx = HmacSha512Context::new(password);
            ctx.update(&u);
            ctx.finalize(&mut next)?;
            u = next;
            for (t_byte, u_byte) in t.iter_mut().zip(u.iter()) {
                *t_byte ^= u_byte;
            }
        }

        let start = block * DIGEST_SIZE;
        let copy_len = (output.len() - start).min(DIGEST_SIZE);
        output[start..start + copy_len].copy_from_slice(&t[..copy_len]);
        t.zeroize();
        u.zeroize();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 64] {
        let mut out = [0u8; 64];
        pbkdf2_hmac_sha512(password, salt, iterations, &mut out).unwrap();
        out
    }

    #[test]
    fn one_iteration() {
        let expected = hex!(
            "867f70cf1adee3cfde89b589ec674f10"
            "409bfb4f2e998c4f5f480065b0fe2188"
            "5f4f5fe952c81f3c6380ae1a68cd9188"
            "5dc8410f10862afa90afd515b0578039"
        );
        assert_eq!(derive(b"password", b"salt", 1), expected);
    }

    #[test]
    fn two_iterations() {
        let expected = hex!(
            "e1d9c16a89260f4fbb5fce0e362ba70c"
            "6eba3b5037e30ccc4c2e52af30d8266c"
            "b26c898660efa09dcf4b77323898cf33"
            "0a0ddf14f1bd948c93c05bc8b31791a2"
        );
        assert_eq!(derive(b"password", b"salt", 2), expected);
    }

    #[test]
    fn forty_ninety_six_iterations() {
        let expected = hex!(
            "d197b1b33db0143e018b12f3d1d1479e"
            "6cdebdcc97c5c0f8a6304c655119134c"
            "3c2c6d505045fd920380756fd2fa3173"
            "465889fc0f2e680e1911c33e96c9240a"
        );
        assert_eq!(derive(b"password", b"salt", 4096), expected);
    }

    #[test]
    fn long_password_and_salt() {
        let expected = hex!(
            "8c0511f4c6e597c6ac6315d8f0362e22"
            "5f3c501495ba23b868c005174dc4ee71"
            "115b59f9e60cd9532fa33e0f75aefe30"
            "965b6e74fe2d5b96138f0fca5832a08e"
        );
        assert_eq!(
            derive(b"passwordPASSWORDpassword", b"saltSALTsaltSALTsaltSALTsaltSALTsalt", 4096),
            expected
        );
    }

    #[test]
    fn empty_salt_uses_default() {
        let mut explicit = [0u8; 32];
        pbkdf2_hmac_sha512(b"hunter2", &DEFAULT_SALT, 10, &mut explicit).unwrap();
        let mut implicit = [0u8; 32];
        pbkdf2_hmac_sha512(b"hunter2", b"", 10, &mut implicit).unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn rejects_empty_password() {
        let mut out = [0u8; 32];
        assert!(pbkdf2_hmac_sha512(b"", b"salt", 10, &mut out).is_err());
    }

    #[test]
    fn output_longer_than_one_block() {
        let mut out = [0u8; 96];
        assert!(pbkdf2_hmac_sha512(b"password", b"salt", 10, &mut out).is_ok());
        assert!(out.iter().any(|&b| b != 0));
    }
}
