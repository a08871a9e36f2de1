//! Gadget library (spec component C5): the non-affine sub-circuits the FLP
//! isolates so it only has to prove their evaluation, never the rest of the
//! (affine, free-to-check) circuit.
//!
//! Each gadget is usable two ways, matching spec.md §4.4: as a scalar
//! circuit node (`eval_field`) during `encode`/`truncate`/`eval`, and as a
//! polynomial identity over wire polynomials (`eval_poly`) during
//! `prove`/`query`. This mirrors the split the teacher draws between a
//! gate's `eval_unfiltered` (scalar constraint evaluation) and its
//! extension-field evaluation in `plonky2/src/gates/gate.rs`.

use prio3_field::polynomial::Polynomial;
use prio3_field::Field;

use crate::errors::FlpError;

/// A gadget of arity `ARITY` and degree `DEGREE`, over field `F`.
pub trait Gadget<F: Field>: Clone + std::fmt::Debug {
    const ARITY: usize;
    const DEGREE: usize;

    /// Scalar evaluation, `args.len() == ARITY`.
    fn eval_field(&self, args: &[F]) -> Result<F, FlpError>;

    /// The same identity applied to wire polynomials instead of field
    /// elements; `args.len() == ARITY`. Result degree is `<=
    /// DEGREE * max(deg(args))`.
    fn eval_poly(&self, args: &[Polynomial<F>]) -> Result<Polynomial<F>, FlpError>;
}

fn check_arity(got: usize, want: usize) -> Result<(), FlpError> {
    if got != want {
        return Err(FlpError::InvalidInput(format!(
            "gadget arity mismatch: got {got}, want {want}"
        )));
    }
    Ok(())
}

/// `(x, y) -> x * y`. Arity 2, degree 2.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mul;

impl<F: Field> Gadget<F> for Mul {
    const ARITY: usize = 2;
    const DEGREE: usize = 2;

    fn eval_field(&self, args: &[F]) -> Result<F, FlpError> {
        check_arity(args.len(), Self::ARITY)?;
        Ok(args[0] * args[1])
    }

    fn eval_poly(&self, args: &[Polynomial<F>]) -> Result<Polynomial<F>, FlpError> {
        check_arity(args.len(), Self::ARITY)?;
        Ok(args[0].mul(&args[1]))
    }
}

/// `x -> x^2 - x`. Arity 1, degree 2. Zero iff `x in {0, 1}` — the
/// building block both `Sum` and `Histogram` use to range-check a bit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Range2;

impl<F: Field> Gadget<F> for Range2 {
    const ARITY: usize = 1;
    const DEGREE: usize = 2;

    fn eval_field(&self, args: &[F]) -> Result<F, FlpError> {
        check_arity(args.len(), Self::ARITY)?;
        let x = args[0];
        Ok(x * x - x)
    }

    fn eval_poly(&self, args: &[Polynomial<F>]) -> Result<Polynomial<F>, FlpError> {
        check_arity(args.len(), Self::ARITY)?;
        let x = &args[0];
        Ok(x.mul(x).sub(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio3_field::field64::Field64;

    fn f(n: u128) -> Field64 {
        Field64::from_u128(n)
    }

    #[test]
    fn test_mul_field_and_poly_agree() {
        let a = Polynomial::new(vec![f(1), f(2)]); // 1 + 2x
        let b = Polynomial::new(vec![f(3), f(4)]); // 3 + 4x
        let poly_result = Mul.eval_poly(&[a.clone(), b.clone()]).unwrap();
        let x = f(7);
        assert_eq!(poly_result.eval(x), a.eval(x) * b.eval(x));
        assert_eq!(Mul.eval_field(&[f(5), f(6)]).unwrap(), f(30));
    }

    #[test]
    fn test_range2_zero_at_bits() {
        assert_eq!(Range2.eval_field(&[Field64::ZERO]).unwrap(), Field64::ZERO);
        assert_eq!(Range2.eval_field(&[Field64::ONE]).unwrap(), Field64::ZERO);
        assert_ne!(Range2.eval_field(&[f(2)]).unwrap(), Field64::ZERO);
    }

    #[test]
    fn test_range2_field_and_poly_agree() {
        let p = Polynomial::new(vec![f(5), f(1)]); // 5 + x
        let poly_result = Range2.eval_poly(&[p.clone()]).unwrap();
        let x = f(9);
        assert_eq!(poly_result.eval(x), Range2.eval_field(&[p.eval(x)]).unwrap());
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(Mul.eval_field(&[f(1)]).is_err());
        assert!(Range2.eval_field(&[f(1), f(2)]).is_err());
    }
}
