//! FIPS-197 AES block cipher with T-table acceleration (C1).
//!
//! Round structure, key schedule, and state/byte-order conventions follow
//! FIPS 197 directly; the T-tables fold `SubBytes` and `MixColumns` into a
//! single table lookup per column, the standard software-acceleration
//! technique for this cipher.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoCoreError, Result};

/// Size of an AES block, in bytes.
pub const BLOCK_SIZE: usize = 16;

const MAX_ROUND_KEY_BYTES: usize = 240; // 4 * (14 + 1) * 4, the 256-bit case

const S_BOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

const INV_S_BOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

// Rcon[0] is an unused placeholder so that `Rcon[i]` lines up with the
// 1-indexed round constant used by the key schedule, matching the source
// table this is ported from.
const RCON: [u8; 11] = [0x8d, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// Multiplication by 2 in GF(2^8), reduced modulo the AES polynomial.
const fn xtimes(b: u8) -> u8 { (b << 1) ^ ((b >> 7).wrapping_mul(0x1b)) }

/// General GF(2^8) multiplication, used only at key-schedule time to build
/// the decryption round keys (the T-tables handle every per-block multiply).
fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut result = 0u8;
    for _ in 0..8 {
        if b & 1 != 0 {
            result ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    result
}

/// `InvMixColumns` applied to a single round-key column (one 4-byte word).
fn inv_mix_column_word(w: &mut [u8; 4]) {
    let [a0, a1, a2, a3] = *w;
    w[0] = gf_mul(a0, 14) ^ gf_mul(a1, 11) ^ gf_mul(a2, 13) ^ gf_mul(a3, 9);
    w[1] = gf_mul(a0, 9) ^ gf_mul(a1, 14) ^ gf_mul(a2, 11) ^ gf_mul(a3, 13);
    w[2] = gf_mul(a0, 13) ^ gf_mul(a1, 9) ^ gf_mul(a2, 14) ^ gf_mul(a3, 11);
    w[3] = gf_mul(a0, 11) ^ gf_mul(a1, 13) ^ gf_mul(a2, 9) ^ gf_mul(a3, 14);
}

struct Tables {
    enc: [[u32; 256]; 4],
    dec: [[u32; 256]; 4],
}

/// Builds the four encryption and four decryption T-tables from the S-box.
///
/// Pure and deterministic, so it is computed once into a `OnceLock` rather
/// than guarded by a runtime "already initialized" flag.
fn build_tables() -> Tables {
    let mut enc = [[0u32; 256]; 4];
    let mut dec = [[0u32; 256]; 4];

    for i in 0..256 {
        let s = S_BOX[i];
        let s2 = xtimes(s);
        let s3 = s2 ^ s;
        enc[0][i] = u32::from(s2) | (u32::from(s) << 8) | (u32::from(s) << 16) | (u32::from(s3) << 24);
        enc[1][i] = u32::from(s3) | (u32::from(s2) << 8) | (u32::from(s) << 16) | (u32::from(s) << 24);
        enc[2][i] = u32::from(s) | (u32::from(s3) << 8) | (u32::from(s2) << 16) | (u32::from(s) << 24);
        enc[3][i] = u32::from(s) | (u32::from(s) << 8) | (u32::from(s3) << 16) | (u32::from(s2) << 24);

        let is = INV_S_BOX[i];
        let is2 = xtimes(is);
        let is4 = xtimes(is2);
        let is8 = xtimes(is4);
        let s9 = is8 ^ is;
        let s11 = is8 ^ is2 ^ is;
        let s13 = is8 ^ is4 ^ is;
        let s14 = is8 ^ is4 ^ is2;
        dec[0][i] = u32::from(s14) | (u32::from(s9) << 8) | (u32::from(s13) << 16) | (u32::from(s11) << 24);
        dec[1][i] = u32::from(s11) | (u32::from(s14) << 8) | (u32::from(s9) << 16) | (u32::from(s13) << 24);
        dec[2][i] = u32::from(s13) | (u32::from(s11) << 8) | (u32::from(s14) << 16) | (u32::from(s9) << 24);
        dec[3][i] = u32::from(s9) | (u32::from(s13) << 8) | (u32::from(s11) << 16) | (u32::from(s14) << 24);
    }

    Tables { enc, dec }
}

fn tables() -> &'static Tables {
    static TABLES: std::sync::OnceLock<Tables> = std::sync::OnceLock::new();
    TABLES.get_or_init(build_tables)
}

fn rot_word(word: &mut [u8; 4]) { word.rotate_left(1); }

fn sub_word(word: &mut [u8; 4]) {
    for b in word.iter_mut() {
        *b = S_BOX[*b as usize];
    }
}

/// A key-scheduled AES context, sized for the largest supported variant.
///
/// `Nr`/`Nk` are zero until [`AesContext::set_key`] succeeds; every cipher
/// operation checks this and fails with [`CryptoCoreError::NotInitialized`]
/// otherwise.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AesContext {
    round_keys: [u8; MAX_ROUND_KEY_BYTES],
    /// Decryption round keys: identical to `round_keys` for rounds `0` and
    /// `Nr`, but with `InvMixColumns` applied to each middle round (`1..Nr`)
    /// so `decrypt_block` can use the same `InvSubBytes`+`InvMixColumns`
    /// T-tables as the forward cipher's T-tables (FIPS 197 §5.3.5's
    /// "equivalent inverse cipher").
    inv_round_keys: [u8; MAX_ROUND_KEY_BYTES],
    #[zeroize(skip)]
    nr: usize,
    #[zeroize(skip)]
    nk: usize,
    #[zeroize(skip)]
    key_bits: u32,
}

impl Default for AesContext {
    fn default() -> Self {
        Self {
            round_keys: [0u8; MAX_ROUND_KEY_BYTES],
            inv_round_keys: [0u8; MAX_ROUND_KEY_BYTES],
            nr: 0,
            nk: 0,
            key_bits: 0,
        }
    }
}

impl AesContext {
    /// Creates an uninitialized context. Call [`Self::set_key`] before use.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Runs the FIPS-197 key schedule for a 128/192/256-bit key.
    ///
    /// # Errors
    /// Returns [`CryptoCoreError::InvalidArgument`] if `bits` is not one of
    /// 128, 192, or 256.
    pub fn set_key(&mut self, key: &[u8], bits: u32) -> Result<()> {
        let nk = match bits {
            128 | 192 | 256 => (bits / 32) as usize,
            _ => return Err(CryptoCoreError::InvalidArgument("AES key width must be 128, 192, or 256 bits")),
        };
        if key.len() != nk * 4 {
            return Err(CryptoCoreError::InvalidArgument("AES key material length does not match key width"));
        }
        let nr = match bits {
            128 => 10,
            192 => 12,
            256 => 14,
            _ => unreachable!(),
        };

        self.nk = nk;
        self.nr = nr;
        self.key_bits = bits;
        self.round_keys[..key.len()].copy_from_slice(key);

        let total_words = 4 * (nr + 1);
        for i in nk..total_words {
            let mut temp: [u8; 4] = self.word(i - 1);
            if i % nk == 0 {
                rot_word(&mut temp);
                sub_word(&mut temp);
                temp[0] ^= RCON[i / nk];
            } else if nk > 6 && i % nk == 4 {
                sub_word(&mut temp);
            }
            let prev = self.word(i - nk);
            let new = [prev[0] ^ temp[0], prev[1] ^ temp[1], prev[2] ^ temp[2], prev[3] ^ temp[3]];
            self.round_keys[i * 4..i * 4 + 4].copy_from_slice(&new);
        }

        self.inv_round_keys[..total_words * 4].copy_from_slice(&self.round_keys[..total_words * 4]);
        for r in 1..nr {
            for w in 0..4 {
                let start = r * 16 + w * 4;
                let mut word: [u8; 4] = self.inv_round_keys[start..start + 4].try_into().unwrap();
                inv_mix_column_word(&mut word);
                self.inv_round_keys[start..start + 4].copy_from_slice(&word);
            }
        }

        Ok(())
    }

    fn word(&self, i: usize) -> [u8; 4] {
        let b = &self.round_keys[i * 4..i * 4 + 4];
        [b[0], b[1], b[2], b[3]]
    }

    fn round_key(&self, round: usize) -> &[u8] { &self.round_keys[round * 16..round * 16 + 16] }

    fn inv_round_key(&self, round: usize) -> &[u8] { &self.inv_round_keys[round * 16..round * 16 + 16] }

    fn check_initialized(&self) -> Result<()> {
        if self.nr == 0 || self.nk == 0 || self.key_bits == 0 {
            return Err(CryptoCoreError::NotInitialized);
        }
        Ok(())
    }

    /// Encrypts one 16-byte block in place under the scheduled key.
    ///
    /// # Errors
    /// Returns [`CryptoCoreError::NotInitialized`] if [`Self::set_key`] has
    /// not run, or [`CryptoCoreError::InvalidInput`] if `input`/`output` are
    /// not exactly [`BLOCK_SIZE`] bytes.
    pub fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.check_initialized()?;
        if input.len() != BLOCK_SIZE || output.len() != BLOCK_SIZE {
            return Err(CryptoCoreError::InvalidInput("AES block must be exactly 16 bytes"));
        }
        let tab = tables();

        // state[row][col] = in[col*4 + row]
        let mut state = [0u8; 16];
        for col in 0..4 {
            for row in 0..4 {
                state[row * 4 + col] = input[col * 4 + row];
            }
        }

        add_round_key(&mut state, self.round_key(0));

        for r in 1..self.nr {
            shift_rows(&mut state);
            sub_bytes_and_mix_columns(&mut state, &tab.enc);
            add_round_key(&mut state, self.round_key(r));
        }

        shift_rows(&mut state);
        for b in state.iter_mut() {
            *b = S_BOX[*b as usize];
        }
        add_round_key(&mut state, self.round_key(self.nr));

        for col in 0..4 {
            for row in 0..4 {
                output[col * 4 + row] = state[row * 4 + col];
            }
        }
        Ok(())
    }

    /// Decrypts one 16-byte block in place under the scheduled key.
    ///
    /// # Errors
    /// Same failure modes as [`Self::encrypt_block`].
    pub fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.check_initialized()?;
        if input.len() != BLOCK_SIZE || output.len() != BLOCK_SIZE {
            return Err(CryptoCoreError::InvalidInput("AES block must be exactly 16 bytes"));
        }
        let tab = tables();

        let mut state = [0u8; 16];
        for col in 0..4 {
            for row in 0..4 {
                state[row * 4 + col] = input[col * 4 + row];
            }
        }

        add_round_key(&mut state, self.round_key(self.nr));

        for r in (1..self.nr).rev() {
            inv_shift_rows(&mut state);
            sub_bytes_and_mix_columns(&mut state, &tab.dec);
            add_round_key(&mut state, self.inv_round_key(r));
        }

        inv_shift_rows(&mut state);
        for b in state.iter_mut() {
            *b = INV_S_BOX[*b as usize];
        }
        add_round_key(&mut state, self.round_key(0));

        for col in 0..4 {
            for row in 0..4 {
                output[col * 4 + row] = state[row * 4 + col];
            }
        }
        Ok(())
    }
}

fn add_round_key(state: &mut [u8; 16], round_key: &[u8]) {
    for i in 0..4 {
        for j in 0..4 {
            state[j * 4 + i] ^= round_key[i * 4 + j];
        }
    }
}

fn shift_rows(state: &mut [u8; 16]) {
    let row = |s: &[u8; 16], r: usize| [s[r * 4], s[r * 4 + 1], s[r * 4 + 2], s[r * 4 + 3]];
    let r1 = row(state, 1);
    state[4] = r1[1];
    state[5] = r1[2];
    state[6] = r1[3];
    state[7] = r1[0];
    let r2 = row(state, 2);
    state[8] = r2[2];
    state[9] = r2[3];
    state[10] = r2[0];
    state[11] = r2[1];
    let r3 = row(state, 3);
    state[12] = r3[3];
    state[13] = r3[0];
    state[14] = r3[1];
    state[15] = r3[2];
}

fn inv_shift_rows(state: &mut [u8; 16]) {
    let row = |s: &[u8; 16], r: usize| [s[r * 4], s[r * 4 + 1], s[r * 4 + 2], s[r * 4 + 3]];
    let r1 = row(state, 1);
    state[4] = r1[3];
    state[5] = r1[0];
    state[6] = r1[1];
    state[7] = r1[2];
    let r2 = row(state, 2);
    state[8] = r2[2];
    state[9] = r2[3];
    state[10] = r2[0];
    state[11] = r2[1];
    let r3 = row(state, 3);
    state[12] = r3[1];
    state[13] = r3[2];
    state[14] = r3[3];
    state[15] = r3[0];
}

/// Combines `SubBytes`/`InvSubBytes` with `MixColumns`/`InvMixColumns` via a
/// single T-table lookup per column, applied after `ShiftRows`.
fn sub_bytes_and_mix_columns(state: &mut [u8; 16], table: &[[u32; 256]; 4]) {
    for j in 0..4 {
        let s0 = state[j] as usize;
        let s1 = state[4 + j] as usize;
        let s2 = state[8 + j] as usize;
        let s3 = state[12 + j] as usize;
        let result = table[0][s0] ^ table[1][s1] ^ table[2][s2] ^ table[3][s3];
        state[j] = (result & 0xFF) as u8;
        state[4 + j] = ((result >> 8) & 0xFF) as u8;
        state[8 + j] = ((result >> 16) & 0xFF) as u8;
        state[12 + j] = ((result >> 24) & 0xFF) as u8;
    }
}
