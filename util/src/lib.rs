//! Small bit-twiddling helpers shared by `prio3-field` and the FLP engine.
//!
//! Kept deliberately tiny and free of `unsafe`: none of the arithmetic here
//! sits on a hot path that a VDAF aggregator would notice, unlike the SIMD
//! kernels this crate's sibling derives from.

/// Computes `ceil(log_2(n))`.
#[must_use]
pub fn log2_ceil(n: usize) -> usize {
    (usize::BITS - n.saturating_sub(1).leading_zeros()) as usize
}

/// Computes `log_2(n)`, panicking if `n` is not a power of two.
pub fn log2_strict(n: usize) -> usize {
    let res = n.trailing_zeros();
    assert!(n.wrapping_shr(res) == 1, "not a power of two: {n}");
    res as usize
}

/// Smallest power of two `>= n` (`next_pow2(0) == 1`).
pub fn next_pow2(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        1 << log2_ceil(n)
    }
}

/// Permutes `arr` in place so that the element at index `i` moves to the
/// index obtained by reversing the low `log2(arr.len())` bits of `i`.
///
/// Used by the classic Cooley-Tukey FFT/IFFT in [`prio3_field::fft`] to turn
/// its natural-order butterfly network into one that reads in natural order
/// and writes in bit-reversed order (or vice-versa for the inverse).
pub fn reverse_index_bits_in_place<T>(arr: &mut [T]) {
    let n = arr.len();
    if n <= 1 {
        return;
    }
    let lb_n = log2_strict(n);
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS as usize - lb_n);
        if i < j {
            arr.swap(i, j);
        }
    }
}
