#![deny(missing_debug_implementations)]

//! `PrgAes128` (spec component C3): the seed-expanding pseudorandom
//! generator `Prio3` builds its per-share and per-measurement randomness
//! from.
//!
//! Construction (spec.md §4.3/§6): `key = AES128-CMAC(seed, info)`,
//! `stream = AES128-CTR(key, IV = 0^16)`. `next(n)` draws the next `n` bytes
//! of that stream. Sequential `next(a)` then `next(b)` must equal a single
//! `next(a + b)` — this falls out for free here because [`ctr::Ctr128BE`]
//! is a genuine stateful stream cipher: each call to `apply_keystream`
//! continues the counter from where the previous call left off, so there is
//! no separate "regenerate the cumulative stream" step to get right.
//!
//! The teacher's own crates have no block-cipher dependency (a SNARK prover
//! has no use for one); `aes`/`cmac`/`ctr`/`cipher` are pulled in from the
//! wider pack as the standard RustCrypto way to get this primitive.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use cmac::{Cmac, Mac};
use ctr::Ctr128BE;

use prio3_field::Field;

/// Size of a `PrgAes128` seed, in bytes.
pub const SEED_SIZE: usize = 16;

/// An opaque, fixed-size pseudorandom seed.
///
/// Not `Serialize`/`Deserialize` on purpose: seeds are secret key material
/// (blinds, hints, per-share keys) that the wrapper is responsible for
/// transporting over its own (excluded, per spec.md §1) secure channel —
/// this crate only defines their byte layout, not how to move them around.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Seed(pub [u8; SEED_SIZE]);

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print seed material, even in debug output.
        write!(f, "Seed(..)")
    }
}

impl Seed {
    /// Draws a uniformly random seed from `rng`.
    pub fn random<R: rand::RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SEED_SIZE];
        rng.fill_bytes(&mut bytes);
        Seed(bytes)
    }

    pub fn from_bytes(bytes: [u8; SEED_SIZE]) -> Self {
        Seed(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.0
    }

    /// `self XOR other`, used to combine/recover `k_joint_rand` from the
    /// per-share blind/hint seeds (spec.md §4.6 step 2).
    pub fn xor(&self, other: &Seed) -> Seed {
        let mut out = [0u8; SEED_SIZE];
        for i in 0..SEED_SIZE {
            out[i] = self.0[i] ^ other.0[i];
        }
        Seed(out)
    }
}

type Aes128Ctr = Ctr128BE<Aes128>;

/// A keyed `PrgAes128` stream, ready to be drawn from via [`Prg::next`].
pub struct Prg {
    stream: Aes128Ctr,
}

impl std::fmt::Debug for Prg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Prg(..)")
    }
}

impl Prg {
    /// `key = AES128-CMAC(seed, info)`; `stream` is then an AES-128-CTR
    /// keystream under that key with a zero IV.
    pub fn new(seed: &Seed, info: &[u8]) -> Self {
        let mut mac = Cmac::<Aes128>::new_from_slice(&seed.0)
            .expect("AES-128 CMAC key size is fixed at 16 bytes");
        mac.update(info);
        let key = mac.finalize().into_bytes();
        let iv = [0u8; 16];
        let stream = Aes128Ctr::new(&key, &iv.into());
        Prg { stream }
    }

    /// Draws the next `length` bytes of the keystream. Calling `next(a)`
    /// then `next(b)` yields the same bytes as a single `next(a + b)`.
    pub fn next(&mut self, length: usize) -> Vec<u8> {
        let mut buf = vec![0u8; length];
        self.stream.apply_keystream(&mut buf);
        buf
    }

    /// `Prg(seed, info).next(SEED_SIZE)`, used to derive a fresh seed from
    /// an existing one (share keys, joint-randomness hints, query-randomness
    /// seeds; spec.md §4.6).
    pub fn derive_seed(seed: &Seed, info: &[u8]) -> Seed {
        let mut prg = Prg::new(seed, info);
        let bytes = prg.next(SEED_SIZE);
        let mut out = [0u8; SEED_SIZE];
        out.copy_from_slice(&bytes);
        Seed(out)
    }

    /// spec.md §4.3: expands `seed` into `length` field elements by
    /// streaming `F::ENCODED_SIZE` bytes at a time, decoding each chunk
    /// little-endian, masking off any bits above `bitlen(p) - 1`, and
    /// accepting the result iff it is `< p` (rejection sampling).
    pub fn expand_into_vec<F: Field>(seed: &Seed, info: &[u8], length: usize) -> Vec<F> {
        let mut prg = Prg::new(seed, info);
        let p = F::modulus();
        let mask = field_mask(p);
        let mut out = Vec::with_capacity(length);
        while out.len() < length {
            let bytes = prg.next(F::ENCODED_SIZE);
            let mut buf = [0u8; 16];
            buf[..bytes.len()].copy_from_slice(&bytes);
            let x = u128::from_le_bytes(buf) & mask;
            if x < p {
                out.push(F::from_u128(x));
            }
        }
        out
    }
}

/// `next_pow2(p) - 1`: a mask covering exactly `bitlen(p)` low bits.
fn field_mask(p: u128) -> u128 {
    let bitlen = 128 - p.leading_zeros();
    if bitlen >= 128 {
        u128::MAX
    } else {
        (1u128 << bitlen) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio3_field::Field64;

    fn seed_of(byte: u8) -> Seed {
        Seed([byte; SEED_SIZE])
    }

    #[test]
    fn test_next_is_deterministic() {
        let seed = seed_of(0x01);
        let mut a = Prg::new(&seed, b"info");
        let mut b = Prg::new(&seed, b"info");
        assert_eq!(a.next(37), b.next(37));
    }

    #[test]
    fn test_next_concatenation_matches_single_call() {
        let seed = seed_of(0x02);
        let mut split = Prg::new(&seed, b"ctx");
        let first = split.next(5);
        let second = split.next(11);
        let mut whole = Prg::new(&seed, b"ctx");
        let combined = whole.next(16);
        assert_eq!([first, second].concat(), combined);
    }

    #[test]
    fn test_derive_seed_deterministic() {
        let seed = seed_of(0x03);
        let a = Prg::derive_seed(&seed, b"x");
        let b = Prg::derive_seed(&seed, b"x");
        assert_eq!(a.0, b.0);
        let c = Prg::derive_seed(&seed, b"y");
        assert_ne!(a.0, c.0);
    }

    #[test]
    fn test_expand_into_vec_elements_below_modulus() {
        let seed = seed_of(0x04);
        let vec: Vec<Field64> = Prg::expand_into_vec(&seed, b"dst", 50);
        assert_eq!(vec.len(), 50);
        for x in vec {
            assert!(x.as_unsigned() < Field64::modulus());
        }
    }

    #[test]
    fn test_seed_xor_self_is_zero() {
        let a = seed_of(0xAB);
        let b = seed_of(0x13);
        let z = a.xor(&b).xor(&b);
        assert_eq!(z.0, a.0);
    }
}
