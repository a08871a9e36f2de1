#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

//! Prime-field arithmetic and polynomial/FFT machinery (spec components C1,
//! C2): the two normative VDAF fields, [`Field64`] and [`Field128`], plus the
//! polynomial operations the FLP engine builds on.
//!
//! This crate only concerns itself with arithmetic; it knows nothing about
//! gadgets, circuits or the VDAF wire format, the way `plonky2_field` stays
//! free of anything `plonky2`-specific.

pub mod fft;
pub mod field128;
pub mod field64;
pub mod polynomial;
pub mod types;

pub use field128::Field128;
pub use field64::Field64;
pub use types::{DecodeError, Field};
