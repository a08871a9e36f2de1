use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use rand::RngCore;

/// Errors surfaced by decoding a field element or a field vector.
///
/// Corresponds to spec.md §7's `DECODE_ERROR` kind; the `prio3` crate widens
/// this into its own `VdafError` at the VDAF boundary.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("field vector byte length {len} is not a multiple of the element size {elem_size}")]
    WrongLength { len: usize, elem_size: usize },

    #[error("decoded integer is not a canonical field element (>= modulus)")]
    NotCanonical,
}

/// A non-negative-integer-valued field element, sampled and serialized the
/// way spec.md §3/§4.1 describes: a residue in `[0, p)`, little-endian
/// fixed-width encoded to exactly `ENCODED_SIZE` bytes.
///
/// Deliberately not generic over field extensions, unlike the teacher's
/// `Field` trait — `Prio3`'s validity circuits only ever need the two
/// concrete prime fields `Field64` and `Field128`.
pub trait Field:
    'static
    + Sized
    + Copy
    + Clone
    + Debug
    + Default
    + PartialEq
    + Eq
    + Add<Self, Output = Self>
    + AddAssign<Self>
    + Sub<Self, Output = Self>
    + SubAssign<Self>
    + Neg<Output = Self>
    + Mul<Self, Output = Self>
    + MulAssign<Self>
{
    /// Number of bytes in the little-endian encoding of one element.
    const ENCODED_SIZE: usize;

    /// Order of the multiplicative subgroup used for FFT/interpolation.
    /// Always a power of two.
    const GEN_ORDER: u128;

    const ZERO: Self;
    const ONE: Self;

    /// The field's modulus `p`. Exposed so the PRG (spec.md §4.3) can mask
    /// and reject-sample raw bytes into `[0, p)` without the field crate
    /// depending on the PRG crate.
    fn modulus() -> u128;

    /// Constructs a field element from a non-negative integer, reducing mod
    /// the field's modulus.
    fn from_u128(n: u128) -> Self;

    /// The unique representative of this element in `[0, p)`.
    fn as_unsigned(&self) -> u128;

    /// Multiplicative inverse. Fails (returns `None`) for zero.
    fn inv(&self) -> Option<Self>;

    /// `self^n` by repeated squaring. `n` is `u128` because `GEN_ORDER` (and
    /// thus the exponents the FLP needs, e.g. `Field128`'s `2^66`) can
    /// exceed `u64::MAX`.
    fn pow(&self, mut n: u128) -> Self {
        let mut base = *self;
        let mut acc = Self::ONE;
        while n > 0 {
            if n & 1 == 1 {
                acc *= base;
            }
            base *= base;
            n >>= 1;
        }
        acc
    }

    /// A generator of the full-order `GEN_ORDER` multiplicative subgroup.
    fn gen() -> Self;

    /// A generator of the order-`p_order` subgroup, for `p_order` a power of
    /// two dividing `GEN_ORDER`. Used by the FLP to build per-gadget roots
    /// of unity `ω_i = gen()^(GEN_ORDER / P_i)`.
    fn primitive_root_of_unity(p_order: u128) -> Self {
        assert!(
            p_order.is_power_of_two() && Self::GEN_ORDER % p_order == 0,
            "{p_order} does not divide the subgroup order {}",
            Self::GEN_ORDER
        );
        Self::gen().pow(Self::GEN_ORDER / p_order)
    }

    /// Samples a uniformly random element of the field.
    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self;

    /// Little-endian fixed-width encoding, exactly `ENCODED_SIZE` bytes.
    fn encode(&self) -> Vec<u8>;

    /// Inverse of [`Field::encode`]. Fails if `bytes.len() != ENCODED_SIZE`
    /// or the decoded integer is not in `[0, p)`.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;

    /// Encodes a vector of field elements by concatenating their encodings.
    fn encode_vec(v: &[Self]) -> Vec<u8> {
        let mut out = Vec::with_capacity(v.len() * Self::ENCODED_SIZE);
        for x in v {
            out.extend_from_slice(&x.encode());
        }
        out
    }

    /// Inverse of [`Field::encode_vec`]. Fails if `bytes.len()` is not a
    /// multiple of `ENCODED_SIZE`, or any chunk fails to decode.
    fn decode_vec(bytes: &[u8]) -> Result<Vec<Self>, DecodeError> {
        if bytes.len() % Self::ENCODED_SIZE != 0 {
            return Err(DecodeError::WrongLength {
                len: bytes.len(),
                elem_size: Self::ENCODED_SIZE,
            });
        }
        bytes
            .chunks_exact(Self::ENCODED_SIZE)
            .map(Self::decode)
            .collect()
    }
}

/// Vector of zeros of the given length.
pub fn zeros<F: Field>(len: usize) -> Vec<F> {
    vec![F::ZERO; len]
}

/// Elementwise addition. Fails if the operand lengths differ.
pub fn vec_add<F: Field>(a: &[F], b: &[F]) -> Result<Vec<F>, VectorError> {
    check_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(&x, &y)| x + y).collect())
}

/// Elementwise subtraction. Fails if the operand lengths differ.
pub fn vec_sub<F: Field>(a: &[F], b: &[F]) -> Result<Vec<F>, VectorError> {
    check_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(&x, &y)| x - y).collect())
}

/// `Σ a_i * b_i`. Fails if the operand lengths differ.
pub fn inner_product<F: Field>(a: &[F], b: &[F]) -> Result<F, VectorError> {
    check_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(&x, &y)| x * y).fold(F::ZERO, |s, t| s + t))
}

fn check_same_len<F>(a: &[F], b: &[F]) -> Result<(), VectorError> {
    if a.len() != b.len() {
        Err(VectorError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        })
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}
