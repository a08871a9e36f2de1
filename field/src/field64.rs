//! `F64`, the field backing `Prio3Count`: `p64 = 2^64 - 2^32 + 1`.
//!
//! This happens to be exactly the "Goldilocks" prime the teacher's
//! `GoldilocksField` is built around, so the reduction technique below
//! (`reduce128`) follows `goldilocks_field.rs::reduce128` closely, minus its
//! `x86_64`-specific inline assembly fast path — constant-time/peak
//! throughput is explicitly a non-goal here (spec.md §1).

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::types::{DecodeError, Field};

/// `2^32 - 1`; `p64 = 2^64 - EPSILON`.
const EPSILON: u64 = (1 << 32) - 1;
const ORDER: u64 = 0xFFFF_FFFF_0000_0001;

/// Generator of the full order-`2^32` multiplicative subgroup,
/// `7^4294967295 mod p64`.
const GENERATOR: u64 = 1753635133440165772;

/// An element of `GF(2^64 - 2^32 + 1)`, stored in canonical form
/// (`0 <= value < ORDER`).
#[derive(Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Field64(u64);

impl Field64 {
    /// Builds from a `u64` known to already be `< ORDER`. Internal helper;
    /// external callers go through [`Field::from_u128`].
    const fn from_canonical_u64(n: u64) -> Self {
        Field64(n)
    }

    fn to_canonical_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for Field64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Field for Field64 {
    const ENCODED_SIZE: usize = 8;
    const GEN_ORDER: u128 = 1 << 32;
    const ZERO: Self = Field64(0);
    const ONE: Self = Field64(1);

    fn modulus() -> u128 {
        ORDER as u128
    }

    fn from_u128(n: u128) -> Self {
        Field64((n % ORDER as u128) as u64)
    }

    fn as_unsigned(&self) -> u128 {
        self.0 as u128
    }

    fn inv(&self) -> Option<Self> {
        if self.0 == 0 {
            None
        } else {
            // Fermat: a^(p-2) = a^-1.
            Some(self.pow((ORDER - 2) as u128))
        }
    }

    fn gen() -> Self {
        Field64(GENERATOR)
    }

    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let x = rng.next_u64();
            if x < ORDER {
                return Field64(x);
            }
        }
    }

    fn encode(&self) -> Vec<u8> {
        self.0.to_le_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != Self::ENCODED_SIZE {
            return Err(DecodeError::WrongLength {
                len: bytes.len(),
                elem_size: Self::ENCODED_SIZE,
            });
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        let x = u64::from_le_bytes(buf);
        if x >= ORDER {
            return Err(DecodeError::NotCanonical);
        }
        Ok(Field64(x))
    }
}

impl std::ops::Add for Field64 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let (sum, over) = self.0.overflowing_add(rhs.0);
        let mut sum = sum;
        if over {
            sum = sum.wrapping_add(EPSILON);
        }
        if sum >= ORDER {
            sum -= ORDER;
        }
        Field64(sum)
    }
}

impl std::ops::AddAssign for Field64 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Field64 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let (diff, under) = self.0.overflowing_sub(rhs.0);
        let mut diff = diff;
        if under {
            diff = diff.wrapping_sub(EPSILON);
        }
        Field64(diff)
    }
}

impl std::ops::SubAssign for Field64 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::Neg for Field64 {
    type Output = Self;
    fn neg(self) -> Self {
        Field64::ZERO - self
    }
}

impl std::ops::Mul for Field64 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        reduce128((self.0 as u128) * (rhs.0 as u128))
    }
}

impl std::ops::MulAssign for Field64 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl std::fmt::Display for Field64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reduces a 128-bit product modulo `p64 = 2^64 - EPSILON`, using the prime's
/// special shape: `2^64 ≡ EPSILON (mod p64)` and `2^96 ≡ -1 (mod p64)`.
fn reduce128(x: u128) -> Field64 {
    let x_lo = x as u64;
    let x_hi = (x >> 64) as u64;
    let x_hi_hi = x_hi >> 32;
    let x_hi_lo = x_hi & EPSILON;

    let (mut t0, borrow) = x_lo.overflowing_sub(x_hi_hi);
    if borrow {
        t0 = t0.wrapping_sub(EPSILON);
    }
    let t1 = x_hi_lo * EPSILON;
    let (mut t2, carry) = t0.overflowing_add(t1);
    if carry {
        t2 = t2.wrapping_add(EPSILON);
    }
    if t2 >= ORDER {
        t2 -= ORDER;
    }
    Field64(t2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_goldilocks() {
        assert_eq!(ORDER, 2u64.wrapping_pow(64).wrapping_sub(1 << 32).wrapping_add(1));
        // p64 = 2^32 * (2^32 - 1) + 1, as spec.md §3 defines it.
        assert_eq!(ORDER, (1u64 << 32).wrapping_mul(u32::MAX as u64).wrapping_add(1));
    }

    #[test]
    fn test_field_laws() {
        let a = Field64::from_u128(123456789);
        let b = Field64::from_u128(987654321);
        let c = Field64::from_u128(42);

        assert_eq!(a + b, b + a);
        assert_eq!(a * b, b * a);
        assert_eq!((a + b) + c, a + (b + c));
        assert_eq!((a * b) * c, a * (b * c));
        assert_eq!(a * (b + c), a * b + a * c);
        assert_eq!(a + Field64::ZERO, a);
        assert_eq!(a * Field64::ONE, a);
        assert_eq!(a + (-a), Field64::ZERO);
        assert_eq!(a * a.inv().unwrap(), Field64::ONE);
        assert!(Field64::ZERO.inv().is_none());
    }

    #[test]
    fn test_gen_order() {
        let g = Field64::gen();
        assert_eq!(g.pow(1u128 << 32), Field64::ONE);
        assert_ne!(g.pow(1u128 << 31), Field64::ONE);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let a = Field64::from_u128(0xdead_beef_cafe_1234);
        let bytes = a.encode();
        assert_eq!(bytes.len(), Field64::ENCODED_SIZE);
        assert_eq!(Field64::decode(&bytes).unwrap(), a);
    }

    #[test]
    fn test_decode_rejects_noncanonical_and_wrong_length() {
        let mut bytes = ORDER.to_le_bytes().to_vec();
        assert_eq!(Field64::decode(&bytes), Err(DecodeError::NotCanonical));
        bytes.push(0);
        assert!(matches!(
            Field64::decode(&bytes),
            Err(DecodeError::WrongLength { .. })
        ));
    }

    #[test]
    fn test_decode_vec_rejects_bad_length() {
        assert!(Field64::decode_vec(&[0u8; 7]).is_err());
        assert!(Field64::decode_vec(&[0u8; 16]).is_ok());
    }

    #[test]
    fn test_as_unsigned_range() {
        let a = Field64::from_u128(ORDER as u128 + 5);
        assert_eq!(a.as_unsigned(), 5);
    }

    #[test]
    fn test_canonical_roundtrip() {
        let a = Field64::from_canonical_u64(7);
        assert_eq!(a.to_canonical_u64(), 7);
    }
}
