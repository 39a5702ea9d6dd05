//! Versioned authenticated binary container (C6).
//!
//! Layout (56-byte header, then a 64-byte HMAC slot, then the ciphertext):
//!
//! ```text
//! offset  size  field
//! 0       4     signature, "AESC"
//! 4       1     version, currently 0x02
//! 5       1     key_length_code, 0x01/0x02/0x03 for AES-128/192/256
//! 6       1     mode_code, 0x02 for CTR (the only mode this crate writes)
//! 7       1     hmac_enabled, 0x01
//! 8       8     nonce
//! 16      8     format, the original file extension incl. leading dot,
//!               NUL-padded
//! 24      16    salt, the PBKDF2 salt
//! 40      16    reserved, zero-filled on write and ignored on read
//! 56      64    HMAC-SHA512 over header || plaintext
//! 120     ...   ciphertext
//! ```
//!
//! The HMAC covers the header and the *plaintext*, not the ciphertext, so
//! verification requires decrypting first. Decryption therefore runs in two
//! passes: the candidate plaintext is written to a scratch file, the HMAC is
//! recomputed over header || scratch contents, and only a match causes the
//! scratch file to be promoted to the caller's requested output path. Any
//! failure along the way leaves no scratch file and no partial output.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use subtle::ConstantTimeEq;
use tracing::{debug, instrument, trace, warn};
use zeroize::Zeroize;

use crate::{
    aes::{AesContext, BLOCK_SIZE},
    ctr,
    error::{CryptoCoreError, OpContext, Result},
    hmac::HmacSha512Context,
    options::{DecryptOptions, EncryptOptions},
    pbkdf2::pbkdf2_hmac_sha512,
};

/// Magic bytes at the start of every container.
pub const SIGNATURE: [u8; 4] = *b"AESC";
/// The only container version this crate writes or reads.
pub const VERSION: u8 = 0x02;
/// The only cipher mode this crate writes or reads.
pub const MODE_CTR: u8 = 0x02;
/// Marks that the header is followed by an HMAC slot.
pub const HMAC_ENABLED: u8 = 0x01;

/// Size of the fixed header, in bytes.
pub const HEADER_SIZE: usize = 56;
/// Size of the nonce field, in bytes.
pub const NONCE_SIZE: usize = 8;
/// Size of the extension field, in bytes.
pub const FORMAT_SIZE: usize = 8;
/// Size of the PBKDF2 salt field, in bytes.
pub const SALT_SIZE: usize = 16;
/// Size of the reserved field, in bytes.
pub const RESERVED_SIZE: usize = 16;
/// Size of the HMAC slot that follows the header.
pub const HMAC_SIZE: usize = 64;

/// PBKDF2 iteration count used to derive keys from a passphrase.
pub const PBKDF2_ITERATIONS: u32 = 10_000;
/// Bytes of PBKDF2 output consumed: enough for a 256-bit AES key plus the
/// 24-byte HMAC key that follows it.
const KDF_OUTPUT_SIZE: usize = 64;
/// Offset within the PBKDF2 output where the HMAC key begins.
const KDF_AES_KEY_OFFSET: usize = 32;
/// Size of the derived HMAC key, in bytes.
const HMAC_KEY_SIZE: usize = 24;

/// Default size of the chunks streamed between the input and output files.
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// Recognized AES key lengths, and the single byte a header uses to name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLength {
    /// 128-bit AES key.
    Aes128,
    /// 192-bit AES key.
    Aes192,
    /// 256-bit AES key.
    Aes256,
}

impl KeyLength {
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Aes128 => 128,
            Self::Aes192 => 192,
            Self::Aes256 => 256,
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Aes128 => 0x01,
            Self::Aes192 => 0x02,
            Self::Aes256 => 0x03,
        }
    }

    fn from_code(code: u8, context: &OpContext) -> Result<Self> {
        match code {
            0x01 => Ok(Self::Aes128),
            0x02 => Ok(Self::Aes192),
            0x03 => Ok(Self::Aes256),
            _ => Err(CryptoCoreError::UnsupportedKeyLength { code, context: context.clone() }),
        }
    }
}

/// The 56-byte container header, parsed into its fields.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    /// AES key length this container was encrypted under.
    pub key_length: KeyLength,
    /// CTR nonce, occupying the high-order 8 bytes of the initial counter.
    pub nonce: [u8; NONCE_SIZE],
    /// Original file extension, including its leading dot, NUL-padded.
    pub format: [u8; FORMAT_SIZE],
    /// PBKDF2 salt used to derive the AES and HMAC keys.
    pub salt: [u8; SALT_SIZE],
}

impl ContainerHeader {
    fn new(key_length: KeyLength, nonce: [u8; NONCE_SIZE], salt: [u8; SALT_SIZE], extension: &str) -> Self {
        let mut format = [0u8; FORMAT_SIZE];
        let bytes = extension.as_bytes();
        // Leave room for the implicit NUL terminator, matching the original
        // tool's truncation of the stored extension to 7 bytes of text.
        let copy_len = bytes.len().min(FORMAT_SIZE - 1);
        format[..copy_len].copy_from_slice(&bytes[..copy_len]);
        Self { key_length, nonce, format, salt }
    }

    /// The stored extension, including its leading dot, with trailing NULs
    /// stripped. Empty if the source file had no extension.
    #[must_use]
    pub fn extension(&self) -> &str {
        let end = self.format.iter().position(|&b| b == 0).unwrap_or(FORMAT_SIZE);
        std::str::from_utf8(&self.format[..end]).unwrap_or("")
    }

    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&SIGNATURE);
        out[4] = VERSION;
        out[5] = self.key_length.code();
        out[6] = MODE_CTR;
        out[7] = HMAC_ENABLED;
        out[8..16].copy_from_slice(&self.nonce);
        out[16..24].copy_from_slice(&self.format);
        out[24..40].copy_from_slice(&self.salt);
        // out[40..56] (reserved) stays zero.
        out
    }

    fn from_bytes(bytes: &[u8; HEADER_SIZE], context: &OpContext) -> Result<Self> {
        if bytes[0..4] != SIGNATURE {
            return Err(CryptoCoreError::InvalidSignature { context: context.clone() });
        }
        if bytes[4] != VERSION {
            return Err(CryptoCoreError::InvalidHeader {
                reason: "unsupported container version",
                context: context.clone(),
            });
        }
        if bytes[6] != MODE_CTR {
            return Err(CryptoCoreError::InvalidHeader {
                reason: "unsupported cipher mode",
                context: context.clone(),
            });
        }
        let key_length = KeyLength::from_code(bytes[5], context)?;

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[8..16]);
        let mut format = [0u8; FORMAT_SIZE];
        format.copy_from_slice(&bytes[16..24]);
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[24..40]);

        Ok(Self { key_length, nonce, format, salt })
    }
}

/// AES and HMAC keys derived from a passphrase, zeroized on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
struct DerivedKeys {
    aes_key: [u8; 32],
    aes_key_len: usize,
    hmac_key: [u8; HMAC_KEY_SIZE],
}

impl DerivedKeys {
    fn derive(password: &[u8], salt: &[u8], key_length: KeyLength, iterations: u32) -> Result<Self> {
        let mut kdf_out = [0u8; KDF_OUTPUT_SIZE];
        pbkdf2_hmac_sha512(password, salt, iterations, &mut kdf_out)?;

        let aes_key_len = (key_length.bits() / 8) as usize;
        let mut aes_key = [0u8; 32];
        aes_key[..aes_key_len].copy_from_slice(&kdf_out[..aes_key_len]);

        let mut hmac_key = [0u8; HMAC_KEY_SIZE];
        hmac_key.copy_from_slice(&kdf_out[KDF_AES_KEY_OFFSET..KDF_AES_KEY_OFFSET + HMAC_KEY_SIZE]);

        kdf_out.zeroize();
        Ok(Self { aes_key, aes_key_len, hmac_key })
    }

    fn aes_key(&self) -> &[u8] {
        &self.aes_key[..self.aes_key_len]
    }
}

/// Reports progress during a streaming encrypt or decrypt, as
/// `(bytes_done, bytes_total)`.
pub type ProgressCallback<'a> = dyn FnMut(u64, u64) + 'a;

/// Encrypts `input_path` into `output_path` under `password`, writing a
/// fresh random nonce and salt into the header.
///
/// The input's extension (if any) is recorded in the header so
/// [`decrypt_file`] can restore it. `options` selects the AES key width plus
/// the streaming chunk size and PBKDF2 iteration count; [`EncryptOptions::default`]
/// reproduces the exact container-format behavior mandated by the format spec.
#[instrument(skip(password, options, rng, progress), fields(input = %input_path.as_ref().display()))]
pub fn encrypt_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    password: &[u8],
    options: &EncryptOptions,
    rng: &mut (impl rand_core::RngCore + rand_core::CryptoRng),
    mut progress: Option<&mut ProgressCallback<'_>>,
) -> Result<()> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    let key_length = options.key_length;
    let chunk_size = options.shared.chunk_size;

    let mut nonce = [0u8; NONCE_SIZE];
    let mut salt = [0u8; SALT_SIZE];
    crate::rng::fill_random(rng, &mut nonce)?;
    crate::rng::fill_random(rng, &mut salt)?;

    let extension = input_path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();
    let header = ContainerHeader::new(key_length, nonce, salt, &extension);

    let keys = DerivedKeys::derive(password, &salt, key_length, options.shared.pbkdf2_iterations)?;
    let mut cipher = AesContext::new();
    cipher.set_key(keys.aes_key(), key_length.bits())?;
    let mut counter = ctr::initial_counter_block(&nonce);

    let in_ctx = || OpContext::new().with_path(input_path);
    let out_ctx = || OpContext::new().with_path(output_path);

    let mut input = File::open(input_path).map_err(|source| CryptoCoreError::FileOpen { source, context: in_ctx() })?;
    let total_len =
        input.metadata().map_err(|source| CryptoCoreError::FileRead { source, context: in_ctx() })?.len();

    let mut output =
        File::create(output_path).map_err(|source| CryptoCoreError::FileOpen { source, context: out_ctx() })?;

    let header_bytes = header.to_bytes();
    let mut mac = HmacSha512Context::new(&keys.hmac_key);
    mac.update(&header_bytes);

    output.write_all(&header_bytes).map_err(|source| CryptoCoreError::FileWrite { source, context: out_ctx() })?;
    // Placeholder HMAC slot, patched once the real value is known.
    output
        .write_all(&[0u8; HMAC_SIZE])
        .map_err(|source| CryptoCoreError::FileWrite { source, context: out_ctx() })?;
    let hmac_offset = (HEADER_SIZE) as u64;

    let mut plaintext = vec![0u8; chunk_size];
    let mut ciphertext = vec![0u8; chunk_size];
    let mut done: u64 = 0;
    loop {
        let n = input.read(&mut plaintext).map_err(|source| CryptoCoreError::FileRead { source, context: in_ctx() })?;
        if n == 0 {
            break;
        }
        mac.update(&plaintext[..n]);
        ctr::ctr_crypt(&cipher, &plaintext[..n], &mut ciphertext[..n], &mut counter)?;
        output
            .write_all(&ciphertext[..n])
            .map_err(|source| CryptoCoreError::FileWrite { source, context: out_ctx() })?;
        done += n as u64;
        if let Some(cb) = progress.as_deref_mut() {
            cb(done, total_len);
        }
    }
    plaintext.zeroize();

    let mut digest = [0u8; HMAC_SIZE];
    mac.finalize(&mut digest)?;

    output
        .seek(SeekFrom::Start(hmac_offset))
        .map_err(|source| CryptoCoreError::FileWrite { source, context: out_ctx() })?;
    output.write_all(&digest).map_err(|source| CryptoCoreError::FileWrite { source, context: out_ctx() })?;
    digest.zeroize();

    debug!(bytes = total_len, "encrypted file");
    Ok(())
}

/// Reads only the header of a container and reports the AES key length it
/// was encrypted with, without deriving any keys or touching the ciphertext.
#[instrument(skip_all, fields(input = %path.as_ref().display()))]
pub fn read_key_length(path: impl AsRef<Path>) -> Result<KeyLength> {
    let path = path.as_ref();
    let ctx = OpContext::new().with_path(path);
    let mut file = File::open(path).map_err(|source| CryptoCoreError::FileOpen { source, context: ctx.clone() })?;
    let mut header_bytes = [0u8; HEADER_SIZE];
    file.read_exact(&mut header_bytes).map_err(|source| CryptoCoreError::FileRead { source, context: ctx.clone() })?;
    Ok(ContainerHeader::from_bytes(&header_bytes, &ctx)?.key_length)
}

/// Decrypts `input_path` into `output_path` under `password`.
///
/// Decryption runs in two passes: the candidate plaintext is written to a
/// scratch file alongside `output_path`, the stored HMAC is checked against
/// one recomputed over the header and that scratch content, and only a
/// match causes the scratch file to replace `output_path`. A wrong
/// passphrase or a tampered file therefore leaves `output_path` untouched
/// and no scratch file behind.
///
/// The extension recorded in the container's header, if any, is appended to
/// `output_path` unconditionally -- even if `output_path` already carries an
/// extension of its own.
///
/// `options` carries the streaming chunk size and the PBKDF2 iteration count
/// the container was encrypted with; the header does not store either, so a
/// caller that overrode [`EncryptOptions`]'s defaults must pass matching
/// [`DecryptOptions`] here.
#[instrument(skip(password, options, progress), fields(input = %input_path.as_ref().display()))]
pub fn decrypt_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    password: &[u8],
    options: &DecryptOptions,
    mut progress: Option<&mut ProgressCallback<'_>>,
) -> Result<PathBuf> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    let chunk_size = options.shared.chunk_size;
    let in_ctx = || OpContext::new().with_path(input_path);

    let mut input = File::open(input_path).map_err(|source| CryptoCoreError::FileOpen { source, context: in_ctx() })?;
    let file_len =
        input.metadata().map_err(|source| CryptoCoreError::FileRead { source, context: in_ctx() })?.len();

    if file_len < (HEADER_SIZE + HMAC_SIZE) as u64 {
        return Err(CryptoCoreError::FileSize {
            reason: "file is smaller than header plus HMAC slot",
            context: in_ctx(),
        });
    }

    let mut header_bytes = [0u8; HEADER_SIZE];
    input.read_exact(&mut header_bytes).map_err(|source| CryptoCoreError::FileRead { source, context: in_ctx() })?;
    let header = ContainerHeader::from_bytes(&header_bytes, &in_ctx())?;

    let mut stored_mac = [0u8; HMAC_SIZE];
    input.read_exact(&mut stored_mac).map_err(|source| CryptoCoreError::FileRead { source, context: in_ctx() })?;

    let ciphertext_len = file_len - (HEADER_SIZE + HMAC_SIZE) as u64;

    let keys = DerivedKeys::derive(password, &header.salt, header.key_length, options.shared.pbkdf2_iterations)?;
    let mut cipher = AesContext::new();
    cipher.set_key(keys.aes_key(), header.key_length.bits())?;
    let mut counter = ctr::initial_counter_block(&header.nonce);

    let scratch_dir = output_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut scratch = tempfile::NamedTempFile::new_in(scratch_dir)
        .map_err(|source| CryptoCoreError::TempFileCreate { source })?;

    let mut mac = HmacSha512Context::new(&keys.hmac_key);
    mac.update(&header_bytes);

    let mut ciphertext = vec![0u8; chunk_size];
    let mut plaintext = vec![0u8; chunk_size];
    let mut remaining = ciphertext_len;
    let mut done: u64 = 0;
    while remaining > 0 {
        let chunk = remaining.min(chunk_size as u64) as usize;
        input
            .read_exact(&mut ciphertext[..chunk])
            .map_err(|source| CryptoCoreError::FileRead { source, context: in_ctx() })?;
        ctr::ctr_crypt(&cipher, &ciphertext[..chunk], &mut plaintext[..chunk], &mut counter)?;
        mac.update(&plaintext[..chunk]);
        scratch
            .write_all(&plaintext[..chunk])
            .map_err(|source| CryptoCoreError::FileWrite { source, context: OpContext::new() })?;
        remaining -= chunk as u64;
        done += chunk as u64;
        if let Some(cb) = progress.as_deref_mut() {
            cb(done, ciphertext_len);
        }
    }
    plaintext.zeroize();

    let mut computed_mac = [0u8; HMAC_SIZE];
    mac.finalize(&mut computed_mac)?;

    let matches: bool = computed_mac.ct_eq(&stored_mac).into();
    computed_mac.zeroize();
    stored_mac.zeroize();

    if !matches {
        warn!("HMAC verification failed, discarding scratch output");
        return Err(CryptoCoreError::IntegrityFailure { context: in_ctx() });
    }

    let final_path = if header.extension().is_empty() {
        output_path.to_path_buf()
    } else {
        let mut with_ext = output_path.as_os_str().to_owned();
        with_ext.push(header.extension());
        PathBuf::from(with_ext)
    };

    scratch
        .persist(&final_path)
        .map_err(|e| CryptoCoreError::FileWrite { source: e.error, context: OpContext::new().with_path(&final_path) })?;

    trace!(bytes = ciphertext_len, path = %final_path.display(), "decrypted file");
    Ok(final_path)
}
