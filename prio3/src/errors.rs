//! Typed error kinds (spec.md §7). Nothing here is retried internally;
//! every variant is meant to surface, unchanged, to the wrapper protocol
//! that owns transport and retry policy.

use prio3_field::DecodeError as FieldDecodeError;

/// Errors the FLP engine (C6) can raise. A strict subset of [`VdafError`]:
/// the FLP has no notion of aggregator ids, shares, or the Prio3 wire
/// format, so it cannot raise `InvalidState` or the Prio3-specific shape of
/// `InvalidInput`.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FlpError {
    /// A supplied byte string was malformed (wrong length, leftover bytes).
    #[error("FLP decode error: {0}")]
    Decode(String),

    /// A measurement could not be encoded (out of range for the circuit).
    #[error("FLP encode error: {0}")]
    Encode(String),

    /// `decide()` rejected the verifier, or a gadget check failed.
    #[error("FLP verify error: {0}")]
    Verify(String),

    /// Query randomness coincided with an interpolation point
    /// (`t^(P_i) = 1`): spec.md §4.5. The whole session must be retried
    /// with fresh query randomness; this is never retried inside the core.
    #[error("FLP abort: query randomness collided with an interpolation point")]
    Abort,

    /// A vector operation (add/sub/inner product) saw mismatched lengths.
    #[error("FLP invalid input: {0}")]
    InvalidInput(String),
}

impl From<FieldDecodeError> for FlpError {
    fn from(e: FieldDecodeError) -> Self {
        FlpError::Decode(e.to_string())
    }
}

/// Top-level error type for the `Prio3` VDAF (C8). Widens [`FlpError`] at
/// the boundary the way the teacher's `anyhow::Error` call sites are
/// narrowed back into `util::serialization::IoResult` at its I/O boundary —
/// just in the opposite direction, since here the *wrapper* (not this
/// crate) is the outermost caller and needs a single error enum to match
/// on.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum VdafError {
    /// Malformed byte input: wrong length, leftover bytes, bad vector
    /// length.
    #[error("decode error: {0}")]
    Decode(String),

    /// `encode()` was called with a measurement out of the circuit's
    /// domain.
    #[error("encode error: {0}")]
    Encode(String),

    /// A prep-message check failed: `decide()` returned false, or the
    /// joint-randomness the aggregators computed did not match.
    #[error("verify error: {0}")]
    Verify(String),

    /// Query randomness coincided with an interpolation point; the whole
    /// session must be retried with fresh query randomness.
    #[error("abort: query randomness collided with an interpolation point")]
    Abort,

    /// The prep state machine was stepped out of order (e.g. `prep_next`
    /// called before `prep_init`, or called twice).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// `SHARES` out of range, or a vector-length mismatch in a derived
    /// operation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<FlpError> for VdafError {
    fn from(e: FlpError) -> Self {
        match e {
            FlpError::Decode(s) => VdafError::Decode(s),
            FlpError::Encode(s) => VdafError::Encode(s),
            FlpError::Verify(s) => VdafError::Verify(s),
            FlpError::Abort => VdafError::Abort,
            FlpError::InvalidInput(s) => VdafError::InvalidInput(s),
        }
    }
}

impl From<FieldDecodeError> for VdafError {
    fn from(e: FieldDecodeError) -> Self {
        VdafError::Decode(e.to_string())
    }
}
