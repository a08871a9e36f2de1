#![deny(missing_debug_implementations)]

//! `Prio3`: a privacy-preserving verifiable distributed aggregation
//! function (VDAF) built from a Fully Linear Proof (FLP) system.
//!
//! A client shards a measurement into secret shares plus a zero-knowledge
//! style proof of its validity ([`vdaf::Prio3::shard`]); a set of
//! aggregators run a one-round preparation protocol to verify the proof
//! against their shares without reconstructing the measurement
//! ([`vdaf::Prio3::prep_init`]/[`vdaf::Prio3::prep_shares_to_prep`]/
//! [`vdaf::Prio3::prep_next`]); each aggregator locally folds verified
//! output shares into a running aggregate
//! ([`vdaf::Prio3::aggregate`]); a collector sums the aggregate shares to
//! recover the plaintext aggregate statistic ([`vdaf::Prio3::unshard`]).
//!
//! The validity proof itself is supplied by [`flp::FlpGeneric`], a generic
//! FLP engine parameterized by a [`flp::Type`] validity circuit — this
//! crate ships three: [`flp::Count`], [`flp::Sum`], [`flp::Histogram`].
//! Poplar1/IDPF-based aggregation is out of scope.

pub mod errors;
pub mod flp;
pub mod vdaf;

pub use errors::{FlpError, VdafError};
pub use flp::{Count, FlpGeneric, Gadget, GadgetCaller, Histogram, Mul, Range2, Sum, Type};
pub use vdaf::{InputShare, Prio3, PrepMessage, PrepShare, PrepState, VerifyParam};
