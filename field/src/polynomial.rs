//! Polynomial utilities (spec component C2): coefficient-vector polynomials
//! over a [`Field`], stripped of trailing zeros, with schoolbook
//! multiplication and Horner evaluation.
//!
//! Mirrors the shape of the teacher's `PolynomialCoeffs` / `PolynomialValues`
//! split (`field/src/polynomial/mod.rs`), trimmed to the single
//! coefficient-form representation the FLP engine needs — `Prio3` never
//! needs a standalone point-value type, since `interp_pow2` (see
//! [`crate::fft`]) goes straight from samples to coefficients.

use crate::types::Field;

/// A polynomial as an ordered, low-degree-first coefficient vector. The
/// empty vector represents the zero polynomial.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Polynomial<F: Field> {
    pub coeffs: Vec<F>,
}

impl<F: Field> Polynomial<F> {
    pub fn new(coeffs: Vec<F>) -> Self {
        Polynomial { coeffs }.strip()
    }

    /// Degree-bound-preserving constructor: does not trim trailing zeros.
    /// Used internally when a fixed length (e.g. `PROOF_LEN`) must be kept
    /// even if the high coefficients happen to vanish (spec.md §4.5's
    /// "trailing high-order coefficients... MUST be serialized explicitly").
    pub fn from_coeffs_exact(coeffs: Vec<F>) -> Self {
        Polynomial { coeffs }
    }

    pub fn zero() -> Self {
        Polynomial { coeffs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Removes trailing zero coefficients.
    pub fn strip(mut self) -> Self {
        while matches!(self.coeffs.last(), Some(c) if *c == F::ZERO) {
            self.coeffs.pop();
        }
        self
    }

    /// Schoolbook multiplication: `|p*q| = |p| + |q| - 1` (or `0` if either
    /// operand is the zero polynomial).
    pub fn mul(&self, other: &Self) -> Self {
        if self.coeffs.is_empty() || other.coeffs.is_empty() {
            return Polynomial::zero();
        }
        let mut out = vec![F::ZERO; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == F::ZERO {
                continue;
            }
            for (j, &b) in other.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }

    /// Horner evaluation; `eval([], x) = 0`.
    pub fn eval(&self, x: F) -> F {
        self.coeffs
            .iter()
            .rev()
            .fold(F::ZERO, |acc, &c| acc * x + c)
    }

    /// Coefficientwise subtraction, padding the shorter operand with zeros.
    pub fn sub(&self, other: &Self) -> Self {
        let len = self.coeffs.len().max(other.coeffs.len());
        let mut out = vec![F::ZERO; len];
        for (i, &c) in self.coeffs.iter().enumerate() {
            out[i] += c;
        }
        for (i, &c) in other.coeffs.iter().enumerate() {
            out[i] -= c;
        }
        Polynomial::new(out)
    }
}

/// The unique polynomial of degree `< xs.len()` with `eval(p, xs[i]) ==
/// ys[i]` for every `i`, computed by Lagrange interpolation. `xs` must be
/// pairwise distinct.
pub fn interp<F: Field>(xs: &[F], ys: &[F]) -> Polynomial<F> {
    assert_eq!(xs.len(), ys.len(), "interp: xs/ys length mismatch");
    let n = xs.len();
    if n == 0 {
        return Polynomial::zero();
    }

    // result = Σ_i ys[i] * L_i(x), L_i(x) = Π_{j≠i} (x - xs[j]) / (xs[i] - xs[j])
    let mut result = vec![F::ZERO; n];
    for i in 0..n {
        let mut numerator = vec![F::ONE]; // polynomial "1"
        let mut denom = F::ONE;
        for j in 0..n {
            if i == j {
                continue;
            }
            // numerator *= (x - xs[j])
            numerator = poly_mul_linear(&numerator, xs[j]);
            denom *= xs[i] - xs[j];
        }
        let scale = ys[i] * denom.inv().expect("xs must be pairwise distinct");
        for (k, &c) in numerator.iter().enumerate() {
            result[k] += c * scale;
        }
    }
    Polynomial::new(result)
}

/// Multiplies a coefficient vector by the linear factor `(x - root)`.
fn poly_mul_linear<F: Field>(coeffs: &[F], root: F) -> Vec<F> {
    let mut out = vec![F::ZERO; coeffs.len() + 1];
    for (i, &c) in coeffs.iter().enumerate() {
        out[i + 1] += c;
        out[i] -= c * root;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field64::Field64;

    fn f(n: u128) -> Field64 {
        Field64::from_u128(n)
    }

    #[test]
    fn test_strip() {
        let p = Polynomial::new(vec![f(1), f(2), Field64::ZERO, Field64::ZERO]);
        assert_eq!(p.coeffs, vec![f(1), f(2)]);
        let z: Polynomial<Field64> = Polynomial::new(vec![Field64::ZERO]);
        assert!(z.coeffs.is_empty());
    }

    #[test]
    fn test_eval_empty_is_zero() {
        let p: Polynomial<Field64> = Polynomial::zero();
        assert_eq!(p.eval(f(7)), Field64::ZERO);
    }

    #[test]
    fn test_eval_horner() {
        // p(x) = 1 + 2x + 3x^2
        let p = Polynomial::new(vec![f(1), f(2), f(3)]);
        assert_eq!(p.eval(f(2)), f(1 + 2 * 2 + 3 * 4));
    }

    #[test]
    fn test_mul_degree_and_eval() {
        let p = Polynomial::new(vec![f(1), f(2)]); // 1 + 2x
        let q = Polynomial::new(vec![f(3), f(4)]); // 3 + 4x
        let r = p.mul(&q);
        assert_eq!(r.len(), 3);
        let x = f(5);
        assert_eq!(r.eval(x), p.eval(x) * q.eval(x));
    }

    #[test]
    fn test_mul_by_zero() {
        let p = Polynomial::new(vec![f(1), f(2)]);
        let z: Polynomial<Field64> = Polynomial::zero();
        assert_eq!(p.mul(&z), Polynomial::zero());
    }

    #[test]
    fn test_interp_roundtrip() {
        let xs = vec![f(1), f(2), f(3), f(4)];
        let ys = vec![f(10), f(20), f(7), f(0)];
        let p = interp(&xs, &ys);
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_eq!(p.eval(*x), *y);
        }
    }
}
