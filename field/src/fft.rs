//! FFT/IFFT over a power-of-two subgroup, and the FLP-facing
//! [`interp_pow2`] built on top of it.
//!
//! Structurally follows the teacher's classic decimation-in-time
//! butterfly network (`field/src/fft.rs::fft_classic`), stripped of the
//! SIMD/packed-field dispatch that file layers on top — we only ever run
//! this on plain scalars, and correctness-without-being-able-to-run-cargo
//! matters more here than throughput (spec.md §1 lists constant-time/peak
//! performance as explicit non-goals).

use prio3_util::{log2_strict, reverse_index_bits_in_place};

use crate::polynomial::Polynomial;
use crate::types::Field;

/// In-place radix-2 DIT FFT: turns the coefficient vector `values` (read in
/// natural order) into its evaluations at `1, ω, ω², …, ω^(n-1)` (written in
/// natural order), where `ω` is the supplied `n`-th root of unity and `n =
/// values.len()` is a power of two.
fn fft_in_place<F: Field>(values: &mut [F], omega: F) {
    let n = values.len();
    if n <= 1 {
        return;
    }
    let lg_n = log2_strict(n);
    reverse_index_bits_in_place(values);

    for s in 1..=lg_n {
        let m = 1usize << s;
        let half_m = m / 2;
        let stage_root = omega.pow((n / m) as u128);
        let mut k = 0;
        while k < n {
            let mut w = F::ONE;
            for j in 0..half_m {
                let u = values[k + j];
                let t = w * values[k + j + half_m];
                values[k + j] = u + t;
                values[k + j + half_m] = u - t;
                w *= stage_root;
            }
            k += m;
        }
    }
}

/// Forward transform: coefficients -> evaluations at powers of `omega`.
pub fn fft<F: Field>(coeffs: &Polynomial<F>, omega: F, n: usize) -> Vec<F> {
    let mut buf = coeffs.coeffs.clone();
    buf.resize(n, F::ZERO);
    fft_in_place(&mut buf, omega);
    buf
}

/// Inverse transform: evaluations at powers of `omega` -> coefficients.
/// `values.len()` must be a power of two.
pub fn ifft<F: Field>(values: &[F], omega: F) -> Polynomial<F> {
    let n = values.len();
    let mut buf = values.to_vec();
    let omega_inv = omega.inv().expect("omega must be nonzero");
    fft_in_place(&mut buf, omega_inv);
    let n_inv = F::from_u128(n as u128).inv().expect("n must be nonzero");
    for v in buf.iter_mut() {
        *v *= n_inv;
    }
    Polynomial::new(buf)
}

/// spec.md §4.5/§4.2: the unique polynomial of degree `< p_order` that
/// evaluates to `ys[k]` at `omega^k` for `k in [0, p_order)`, where `omega`
/// is a primitive `p_order`-th root of unity. `ys.len()` must equal
/// `p_order`, a power of two.
pub fn interp_pow2<F: Field>(ys: &[F], omega: F, p_order: usize) -> Polynomial<F> {
    assert_eq!(ys.len(), p_order, "interp_pow2: ys length must equal p_order");
    assert!(p_order.is_power_of_two(), "p_order must be a power of two");
    ifft(ys, omega)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field64::Field64;

    fn f(n: u128) -> Field64 {
        Field64::from_u128(n)
    }

    #[test]
    fn test_fft_ifft_roundtrip() {
        let p_order = 8usize;
        let omega = Field64::primitive_root_of_unity(p_order as u128);
        let coeffs = Polynomial::new(vec![f(1), f(2), f(3), f(4), f(5), f(6), f(7), f(8)]);
        let evals = fft(&coeffs, omega, p_order);
        let back = ifft(&evals, omega);
        assert_eq!(back, coeffs);
    }

    #[test]
    fn test_fft_matches_direct_eval() {
        let p_order = 4usize;
        let omega = Field64::primitive_root_of_unity(p_order as u128);
        let coeffs = Polynomial::new(vec![f(3), f(5), f(7)]);
        let evals = fft(&coeffs, omega, p_order);
        for k in 0..p_order {
            let x = omega.pow(k as u128);
            assert_eq!(evals[k], coeffs.eval(x));
        }
    }

    #[test]
    fn test_interp_pow2_matches_samples() {
        let p_order = 4usize;
        let omega = Field64::primitive_root_of_unity(p_order as u128);
        let ys = vec![f(10), f(20), f(30), f(40)];
        let poly = interp_pow2(&ys, omega, p_order);
        for (k, &y) in ys.iter().enumerate() {
            let x = omega.pow(k as u128);
            assert_eq!(poly.eval(x), y);
        }
    }
}
