//! FIPS 180-4 SHA-512 streaming digest (C2).

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoCoreError, Result};

/// Length of a SHA-512 digest, in bytes.
pub const DIGEST_SIZE: usize = 64;
/// Size of a SHA-512 input block, in bytes. Also HMAC-SHA512's pad length (RFC 2104).
pub(crate) const BLOCK_SIZE: usize = 128;

const H0: [u64; 8] = [
    0x6a09_e667_f3bc_c908,
    0xbb67_ae85_84ca_a73b,
    0x3c6e_f372_fe94_f82b,
    0xa54f_f53a_5f1d_36f1,
    0x510e_527f_ade6_82d1,
    0x9b05_688c_2b3e_6c1f,
    0x1f83_d9ab_fb41_bd6b,
    0x5be0_cd19_137e_2179,
];

const K: [u64; 80] = [
    0x428a_2f98_d728_ae22, 0x7137_4491_23ef_65cd, 0xb5c0_fbcf_ec4d_3b2f, 0xe9b5_dba5_8189_dbbc,
    0x3956_c25b_f348_b538, 0x59f1_11f1_b605_d019, 0x923f_82a4_af19_4f9b, 0xab1c_5ed5_da6d_8118,
    0xd807_aa98_a303_0242, 0x1283_5b01_4570_6fbe, 0x2431_85be_4ee4_b28c, 0x550c_7dc3_d5ff_b4e2,
    0x72be_5d74_f27b_896f, 0x80de_b1fe_3b16_96b1, 0x9bdc_06a7_25c7_1235, 0xc19b_f174_cf69_2694,
    0xe49b_69c1_9ef1_4ad2, 0xefbe_4786_384f_25e3, 0x0fc1_9dc6_8b8c_d5b5, 0x240c_a1cc_77ac_9c65,
    0x2de9_2c6f_592b_0275, 0x4a74_84aa_6ea6_e483, 0x5cb0_a9dc_bd41_fbd4, 0x76f9_88da_8311_53b5,
    0x983e_5152_ee66_dfab, 0xa831_c66d_2db4_3210, 0xb003_27c8_98fb_213f, 0xbf59_7fc7_beef_0ee4,
    0xc6e0_0bf3_3da8_8fc2, 0xd5a7_9147_930a_a725, 0x06ca_6351_e003_826f, 0x1429_2967_0a0e_6e70,
    0x27b7_0a85_46d2_2ffc, 0x2e1b_2138_5c26_c926, 0x4d2c_6dfc_5ac4_2aed, 0x5338_0d13_9d95_b3df,
    0x650a_7354_8baf_63de, 0x766a_0abb_3c77_b2a8, 0x81c2_c92e_47ed_aee6, 0x9272_2c85_1482_353b,
    0xa2bf_e8a1_4cf1_0364, 0xa81a_664b_bc42_3001, 0xc24b_8b70_d0f8_9791, 0xc76c_51a3_0654_be30,
    0xd192_e819_d6ef_5218, 0xd699_0624_5565_a910, 0xf40e_3585_5771_202a, 0x106a_a070_32bb_d1b8,
    0x19a4_c116_b8d2_d0c8, 0x1e37_6c08_5141_ab53, 0x2748_774c_df8e_eb99, 0x34b0_bcb5_e19b_48a8,
    0x391c_0cb3_c5c9_5a63, 0x4ed8_aa4a_e341_8acb, 0x5b9c_ca4f_7763_e373, 0x682e_6ff3_d6b2_b8a3,
    0x748f_82ee_5def_b2fc, 0x78a5_636f_4317_2f60, 0x84c8_7814_a1f0_ab72, 0x8cc7_0208_1a64_39ec,
    0x90be_fffa_2363_1e28, 0xa450_6ceb_de82_bde9, 0xbef9_a3f7_b2c6_7915, 0xc671_78f2_e372_532b,
    0xca27_3ece_ea26_619c, 0xd186_b8c7_21c0_c207, 0xeada_7dd6_cde0_eb1e, 0xf57d_4f7f_ee6e_d178,
    0x06f0_67aa_7217_6fba, 0x0a63_7dc5_a2c8_98a6, 0x113f_9804_bef9_0dae, 0x1b71_0b35_131c_471b,
    0x28db_77f5_2304_7d84, 0x32ca_ab7b_40c7_2493, 0x3c9e_be0a_15c9_bebc, 0x431d_67c4_9c10_0d4c,
    0x4cc5_d4be_cb3e_42b6, 0x597f_299c_fc65_7e2a, 0x5fcb_6fab_3ad6_faec, 0x6c44_198c_4a47_5817,
];

fn rotr(x: u64, n: u32) -> u64 { x.rotate_right(n) }
fn ch(x: u64, y: u64, z: u64) -> u64 { (x & y) ^ (!x & z) }
fn maj(x: u64, y: u64, z: u64) -> u64 { (x & y) ^ (x & z) ^ (y & z) }
fn big_sigma0(x: u64) -> u64 { rotr(x, 28) ^ rotr(x, 34) ^ rotr(x, 39) }
fn big_sigma1(x: u64) -> u64 { rotr(x, 14) ^ rotr(x, 18) ^ rotr(x, 41) }
fn small_sigma0(x: u64) -> u64 { rotr(x, 1) ^ rotr(x, 8) ^ (x >> 7) }
fn small_sigma1(x: u64) -> u64 { rotr(x, 19) ^ rotr(x, 61) ^ (x >> 6) }

fn transform(state: &mut [u64; 8], block: &[u8; BLOCK_SIZE]) {
    let mut w = [0u64; 80];
    for (i, word) in w.iter_mut().take(16).enumerate() {
        let b = &block[i * 8..i * 8 + 8];
        *word = u64::from_be_bytes(b.try_into().unwrap());
    }
    for i in 16..80 {
        w[i] = w[i - 16]
            .wrapping_add(small_sigma0(w[i - 15]))
            .wrapping_add(w[i - 7])
            .wrapping_add(small_sigma1(w[i - 2]));
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for i in 0..80 {
        let t1 = h
            .wrapping_add(big_sigma1(e))
            .wrapping_add(ch(e, f, g))
            .wrapping_add(K[i])
            .wrapping_add(w[i]);
        let t2 = big_sigma0(a).wrapping_add(maj(a, b, c));
        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
    state[4] = state[4].wrapping_add(e);
    state[5] = state[5].wrapping_add(f);
    state[6] = state[6].wrapping_add(g);
    state[7] = state[7].wrapping_add(h);
}

/// A streaming SHA-512 context.
///
/// The total message length is tracked as a true 128-bit counter (high/low
/// 64-bit halves with carry) so inputs longer than 2^64 bits hash correctly,
/// as required by FIPS 180-4.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Sha512Context {
    state: [u64; 8],
    buffer: [u8; BLOCK_SIZE],
    #[zeroize(skip)]
    datalen: usize,
    bitlen_high: u64,
    bitlen_low: u64,
}

impl Default for Sha512Context {
    fn default() -> Self {
        Self { state: H0, buffer: [0u8; BLOCK_SIZE], datalen: 0, bitlen_high: 0, bitlen_low: 0 }
    }
}

impl Sha512Context {
    /// Initializes a fresh context with the FIPS 180-4 initial hash values.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    fn add_bitlen(&mut self, len: usize) {
        let bits = (len as u64).wrapping_mul(8);
        let (sum, carried) = self.bitlen_low.overflowing_add(bits);
        self.bitlen_low = sum;
        if carried {
            self.bitlen_high = self.bitlen_high.wrapping_add(1);
        }
    }

    /// Feeds `data` into the running digest. May be called any number of times.
    pub fn update(&mut self, data: &[u8]) {
        let mut data = data;
        if self.datalen > 0 {
            let fill = BLOCK_SIZE - self.datalen;
            if data.len() < fill {
                self.buffer[self.datalen..self.datalen + data.len()].copy_from_slice(data);
                self.datalen += data.len();
                return;
            }
            self.buffer[self.datalen..BLOCK_SIZE].copy_from_slice(&data[..fill]);
            let block = self.buffer;
            transform(&mut self.state, &block);
            self.add_bitlen(BLOCK_SIZE);
            data = &data[fill..];
            self.datalen = 0;
        }

        while data.len() >= BLOCK_SIZE {
            let block: [u8; BLOCK_SIZE] = data[..BLOCK_SIZE].try_into().unwrap();
            transform(&mut self.state, &block);
            self.add_bitlen(BLOCK_SIZE);
            data = &data[BLOCK_SIZE..];
        }

        if !data.is_empty() {
            self.buffer[..data.len()].copy_from_slice(data);
            self.datalen = data.len();
        }
    }

    /// Finalizes the digest, writing 64 bytes to `out`. The context must not
    /// be used again afterwards (its state is zeroized by this call).
    ///
    /// # Errors
    /// Returns [`CryptoCoreError::BufferTooSmall`] if `out` is shorter than
    /// [`DIGEST_SIZE`].
    pub fn finalize(mut self, out: &mut [u8]) -> Result<()> {
        if out.len() < DIGEST_SIZE {
            return Err(CryptoCoreError::BufferTooSmall { needed: DIGEST_SIZE, available: out.len() });
        }

        let mut i = self.datalen;
        if i > 0 {
            self.add_bitlen(i);
        }
        self.buffer[i] = 0x80;
        i += 1;

        if i > 112 {
            if i < BLOCK_SIZE {
                self.buffer[i..].fill(0);
            }
            let block = self.buffer;
            transform(&mut self.state, &block);
            i = 0;
        }
        if i < 112 {
            self.buffer[i..112].fill(0);
        }

        self.buffer[112..120].copy_from_slice(&self.bitlen_high.to_be_bytes());
        self.buffer[120..128].copy_from_slice(&self.bitlen_low.to_be_bytes());
        let block = self.buffer;
        transform(&mut self.state, &block);

        for (j, word) in self.state.iter().enumerate() {
            out[j * 8..j * 8 + 8].copy_from_slice(&word.to_be_bytes());
        }
        Ok(())
    }
}

/// One-shot convenience wrapper: `SHA-512(data)`.
#[must_use]
pub fn sha512(data: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut ctx = Sha512Context::new();
    ctx.update(data);
    let mut out = [0u8; DIGEST_SIZE];
    ctx.finalize(&mut out).expect("DIGEST_SIZE buffer is always large enough");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_hex(data: &[u8]) -> String { hex::encode(sha512(data)) }

    #[test]
    fn fips_180_4_empty_string() {
        assert_eq!(
            digest_hex(b""),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3"
        );
    }

    #[test]
    fn fips_180_4_abc() {
        assert_eq!(
            digest_hex(b"abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49"
        );
    }

    #[test]
    fn fips_180_4_56_byte_message() {
        assert_eq!(
            digest_hex(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq"),
            "204a8fc6dda82f0a0ced7beb8e08a41657c16ef468b228a8279be331a703c33596fd15c13b1b07f9aa1d3bea57789ca031ad85c7a71dd70354ec631238ca3445"
        );
    }

    #[test]
    fn fips_180_4_112_byte_message() {
        let msg = b"abcdefghbcdefghicdefghijdefghijkefghijklfghijklmghijklmnhijklmnoijklmnopjklmnopqklmnopqrlmnopqrsmnopqrstnopqrstu";
        assert_eq!(
            digest_hex(msg),
            "8e959b75dae313da8cf4f72814fc143f8f7779c6eb9f7fa17299aeadb6889018501d289e4900f7e4331b99dec4b5433ac7d329eeb6dd26545e96e55b874be909"
        );
    }

    #[test]
    fn fips_180_4_one_million_a() {
        let msg = vec![b'a'; 1_000_000];
        assert_eq!(
            digest_hex(&msg),
            "e718483d0ce769644e2e42c7bc15b4638e1f98b13b2044285632a803afa973ebde0ff244877ea60a4cb0432ce577c31beb009c5c2c49aa2e4eadb217ad8cc09"
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = vec![0x5au8; 5000];
        let mut streamed = Sha512Context::new();
        for chunk in data.chunks(137) {
            streamed.update(chunk);
        }
        let mut out = [0u8; DIGEST_SIZE];
        streamed.finalize(&mut out).unwrap();
        assert_eq!(out, sha512(&data));
    }
}
