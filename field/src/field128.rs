//! `F128`, the field backing `Prio3Sum` and `Prio3Histogram`:
//! `p128 = 2^66 * 4611686018427387897 + 1`.
//!
//! Unlike [`crate::field64::Field64`], `p128` is a full 128-bit modulus, so a
//! product of two field elements needs up to 256 bits of intermediate
//! precision — more than a native `u128` multiply gives us. Rather than
//! hand-roll 256-bit arithmetic (risky to get right without the ability to
//! run a test suite), multiplication and inversion go through
//! [`num_bigint::BigUint`], the same big-integer type the teacher's own
//! `field/src/types.rs` already reaches for (`num::bigint::BigUint`) when it
//! needs to convert a field element to/from an arbitrary-precision integer.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::types::{DecodeError, Field};

const ORDER_HEX: &str = "ffffffffffffffe40000000000000001";
const GENERATOR_HEX: &str = "6d278fbf4f60228b1f9b2759c5109f06";

fn order() -> BigUint {
    BigUint::parse_bytes(ORDER_HEX.as_bytes(), 16).unwrap()
}

/// An element of `GF(2^66 * 4611686018427387897 + 1)`, stored as a `u128` in
/// canonical form (`0 <= value < p128`).
#[derive(Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Field128(u128);

impl Field128 {
    fn to_biguint(self) -> BigUint {
        BigUint::from(self.0)
    }

    fn from_biguint(b: BigUint) -> Self {
        Field128(b.to_u128().expect("reduced value always fits in u128"))
    }
}

impl std::fmt::Debug for Field128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Field128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Field for Field128 {
    const ENCODED_SIZE: usize = 16;
    const GEN_ORDER: u128 = 1 << 66;
    const ZERO: Self = Field128(0);
    const ONE: Self = Field128(1);

    fn modulus() -> u128 {
        order().to_u128().unwrap()
    }

    fn from_u128(n: u128) -> Self {
        Field128::from_biguint(BigUint::from(n) % order())
    }

    fn as_unsigned(&self) -> u128 {
        self.0
    }

    fn inv(&self) -> Option<Self> {
        if self.0 == 0 {
            return None;
        }
        let p = order();
        let exp = &p - BigUint::from(2u8);
        Some(Field128::from_biguint(self.to_biguint().modpow(&exp, &p)))
    }

    fn gen() -> Self {
        Field128(BigUint::parse_bytes(GENERATOR_HEX.as_bytes(), 16).unwrap().to_u128().unwrap())
    }

    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut buf = [0u8; 16];
            rng.fill_bytes(&mut buf);
            let x = u128::from_le_bytes(buf);
            // Reject-and-retry to keep the distribution uniform, same
            // technique spec.md §4.3 uses for PRG-driven sampling.
            let p = order().to_u128().unwrap();
            if x < p {
                return Field128(x);
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
        let mut buf = [0u8; 16];
        buf.copy_from_slice(bytes);
        let x = u128::from_le_bytes(buf);
        if x >= order().to_u128().unwrap() {
            return Err(DecodeError::NotCanonical);
        }
        Ok(Field128(x))
    }
}

impl std::ops::Add for Field128 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Field128::from_biguint((self.to_biguint() + rhs.to_biguint()) % order())
    }
}

impl std::ops::AddAssign for Field128 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Field128 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let p = order();
        let a = self.to_biguint();
        let b = rhs.to_biguint();
        let diff = if a >= b { a - b } else { &p - (b - a) };
        Field128::from_biguint(diff)
    }
}

impl std::ops::SubAssign for Field128 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::Neg for Field128 {
    type Output = Self;
    fn neg(self) -> Self {
        Field128::ZERO - self
    }
}

impl std::ops::Mul for Field128 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Field128::from_biguint((self.to_biguint() * rhs.to_biguint()) % order())
    }
}

impl std::ops::MulAssign for Field128 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}
