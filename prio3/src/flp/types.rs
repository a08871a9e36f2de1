//! Validity-circuit interface (C4) and the three normative circuits (C7):
//! `Count`, `Sum`, `Histogram`.
//!
//! A circuit declares its gadget, its vector lengths, and how to
//! encode/truncate/evaluate a measurement (spec.md §3/§4.4). The lengths are
//! instance methods rather than associated constants because `Sum` and
//! `Histogram` are parameterized at construction time (`bits`, bucket
//! boundaries) the way the teacher's own gates carry instance state (e.g.
//! `ArithmeticGate::num_ops`) rather than hard-coding it in the type.

use prio3_field::{Field, Field128, Field64};

use crate::errors::FlpError;
use crate::flp::gadgets::{Gadget, Mul, Range2};

/// Something a circuit's [`Type::eval_with`] can call in place of directly
/// evaluating its gadget. The FLP engine substitutes a different caller for
/// plain evaluation, proving, and querying (spec.md §4.5) without the
/// circuit itself knowing which one it's talking to.
pub trait GadgetCaller<F: Field> {
    fn call(&mut self, inputs: &[F]) -> Result<F, FlpError>;
}

/// Evaluates the gadget directly; backs [`Type::eval`], the plain
/// (non-FLP) circuit self-check used by tests and by `encode`'s callers to
/// sanity-check a measurement before sharding.
struct DirectCaller<G> {
    gadget: G,
}

impl<F: Field, G: Gadget<F>> GadgetCaller<F> for DirectCaller<G> {
    fn call(&mut self, inputs: &[F]) -> Result<F, FlpError> {
        self.gadget.eval_field(inputs)
    }
}

/// A validity circuit (spec.md §3/§4.4).
pub trait Type: Clone + std::fmt::Debug {
    type Measurement;
    type Field: Field;
    type Gadget: Gadget<Self::Field> + Default;

    /// `INPUT_LEN`.
    fn input_len(&self) -> usize;
    /// `OUTPUT_LEN`.
    fn output_len(&self) -> usize;
    /// `JOINT_RAND_LEN`.
    fn joint_rand_len(&self) -> usize;
    /// `M`: the number of times the circuit calls its gadget.
    fn gadget_calls(&self) -> usize;

    fn gadget(&self) -> Self::Gadget {
        Self::Gadget::default()
    }

    fn encode(&self, measurement: &Self::Measurement) -> Result<Vec<Self::Field>, FlpError>;

    fn truncate(&self, input: Vec<Self::Field>) -> Result<Vec<Self::Field>, FlpError>;

    /// Evaluates the circuit, routing every gadget call through `caller`
    /// instead of calling the gadget directly. `num_shares` compensates
    /// constant terms (e.g. `Histogram`'s `1/num_shares`) for the fact that
    /// the circuit may be evaluated on a single aggregator's share rather
    /// than the reconstructed input (spec.md §4.4).
    fn eval_with<C: GadgetCaller<Self::Field>>(
        &self,
        caller: &mut C,
        input: &[Self::Field],
        joint_rand: &[Self::Field],
        num_shares: usize,
    ) -> Result<Self::Field, FlpError>;

    /// Plain circuit evaluation: calls the gadget directly rather than
    /// going through the FLP's prove/query machinery. `eval(inp,
    /// joint_rand, 1) == 0` iff `inp` is a valid encoding.
    fn eval(
        &self,
        input: &[Self::Field],
        joint_rand: &[Self::Field],
        num_shares: usize,
    ) -> Result<Self::Field, FlpError> {
        let mut caller = DirectCaller {
            gadget: self.gadget(),
        };
        self.eval_with(&mut caller, input, joint_rand, num_shares)
    }
}

fn check_len(what: &str, got: usize, want: usize) -> Result<(), FlpError> {
    if got != want {
        return Err(FlpError::InvalidInput(format!(
            "{what}: expected {want} elements, got {got}"
        )));
    }
    Ok(())
}

/// `Count`: is the measurement `0` or `1`? `Mul`×1, `INPUT_LEN =
/// OUTPUT_LEN = 1`, no joint randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl Type for Count {
    type Measurement = bool;
    type Field = Field64;
    type Gadget = Mul;

    fn input_len(&self) -> usize {
        1
    }
    fn output_len(&self) -> usize {
        1
    }
    fn joint_rand_len(&self) -> usize {
        0
    }
    fn gadget_calls(&self) -> usize {
        1
    }

    fn encode(&self, measurement: &bool) -> Result<Vec<Field64>, FlpError> {
        Ok(vec![Field64::from_u128(*measurement as u128)])
    }

    fn truncate(&self, input: Vec<Field64>) -> Result<Vec<Field64>, FlpError> {
        check_len("Count::truncate", input.len(), self.input_len())?;
        Ok(input)
    }

    fn eval_with<C: GadgetCaller<Field64>>(
        &self,
        caller: &mut C,
        input: &[Field64],
        _joint_rand: &[Field64],
        _num_shares: usize,
    ) -> Result<Field64, FlpError> {
        check_len("Count::eval", input.len(), self.input_len())?;
        let x = input[0];
        let squared = caller.call(&[x, x])?;
        Ok(squared - x)
    }
}

/// `Sum{bits}`: an integer measurement in `[0, 2^bits)`, range-checked bit
/// by bit via `Range2`. `INPUT_LEN = bits`, `OUTPUT_LEN = 1`,
/// `JOINT_RAND_LEN = 1`.
#[derive(Clone, Debug)]
pub struct Sum {
    bits: usize,
}

impl Sum {
    /// `bits` must leave room for `1 << bits` to be representable; `Field128`
    /// itself could hold a few bits more, but `127` is already far beyond
    /// any realistic aggregate-sum range and keeps `1u128 << bits` safe.
    pub fn new(bits: usize) -> Result<Self, FlpError> {
        if bits == 0 || bits > 127 {
            return Err(FlpError::InvalidInput(format!(
                "Sum: bits must be in [1, 127], got {bits}"
            )));
        }
        Ok(Sum { bits })
    }

    pub fn bits(&self) -> usize {
        self.bits
    }
}

impl Type for Sum {
    type Measurement = u128;
    type Field = Field128;
    type Gadget = Range2;

    fn input_len(&self) -> usize {
        self.bits
    }
    fn output_len(&self) -> usize {
        1
    }
    fn joint_rand_len(&self) -> usize {
        1
    }
    fn gadget_calls(&self) -> usize {
        self.bits
    }

    fn encode(&self, measurement: &u128) -> Result<Vec<Field128>, FlpError> {
        if *measurement >= (1u128 << self.bits) {
            return Err(FlpError::Encode(format!(
                "Sum: measurement {measurement} does not fit in {} bits",
                self.bits
            )));
        }
        Ok((0..self.bits)
            .map(|l| Field128::from_u128((*measurement >> l) & 1))
            .collect())
    }

    fn truncate(&self, input: Vec<Field128>) -> Result<Vec<Field128>, FlpError> {
        check_len("Sum::truncate", input.len(), self.input_len())?;
        let mut sum = Field128::ZERO;
        for (l, &b) in input.iter().enumerate() {
            sum += Field128::from_u128(1u128 << l) * b;
        }
        Ok(vec![sum])
    }

    fn eval_with<C: GadgetCaller<Field128>>(
        &self,
        caller: &mut C,
        input: &[Field128],
        joint_rand: &[Field128],
        _num_shares: usize,
    ) -> Result<Field128, FlpError> {
        check_len("Sum::eval", input.len(), self.input_len())?;
        check_len("Sum::eval joint_rand", joint_rand.len(), self.joint_rand_len())?;
        let r = joint_rand[0];
        let mut r_pow = r;
        let mut result = Field128::ZERO;
        for &b in input {
            let check = caller.call(&[b])?;
            result += r_pow * check;
            r_pow *= r;
        }
        Ok(result)
    }
}

/// `Histogram{buckets}`: which bucket does the measurement fall into?
/// `buckets` gives the upper boundary of every bucket but the last
/// (unbounded) one, so `INPUT_LEN = OUTPUT_LEN = buckets.len() + 1`,
/// `JOINT_RAND_LEN = 2`.
#[derive(Clone, Debug)]
pub struct Histogram {
    boundaries: Vec<u128>,
}

impl Histogram {
    pub fn new(boundaries: Vec<u128>) -> Result<Self, FlpError> {
        if boundaries.is_empty() {
            return Err(FlpError::InvalidInput(
                "Histogram: boundaries must be non-empty".into(),
            ));
        }
        if !boundaries.windows(2).all(|w| w[0] < w[1]) {
            return Err(FlpError::InvalidInput(
                "Histogram: boundaries must be strictly increasing".into(),
            ));
        }
        Ok(Histogram { boundaries })
    }

    pub fn num_buckets(&self) -> usize {
        self.boundaries.len() + 1
    }
}

impl Type for Histogram {
    type Measurement = u128;
    type Field = Field128;
    type Gadget = Range2;

    fn input_len(&self) -> usize {
        self.num_buckets()
    }
    fn output_len(&self) -> usize {
        self.num_buckets()
    }
    fn joint_rand_len(&self) -> usize {
        2
    }
    fn gadget_calls(&self) -> usize {
        self.num_buckets()
    }

    fn encode(&self, measurement: &u128) -> Result<Vec<Field128>, FlpError> {
        let idx = self
            .boundaries
            .iter()
            .position(|&boundary| *measurement <= boundary)
            .unwrap_or(self.boundaries.len());
        let mut v = vec![Field128::ZERO; self.num_buckets()];
        v[idx] = Field128::ONE;
        Ok(v)
    }

    fn truncate(&self, input: Vec<Field128>) -> Result<Vec<Field128>, FlpError> {
        check_len("Histogram::truncate", input.len(), self.input_len())?;
        Ok(input)
    }

    fn eval_with<C: GadgetCaller<Field128>>(
        &self,
        caller: &mut C,
        input: &[Field128],
        joint_rand: &[Field128],
        num_shares: usize,
    ) -> Result<Field128, FlpError> {
        check_len("Histogram::eval", input.len(), self.input_len())?;
        check_len(
            "Histogram::eval joint_rand",
            joint_rand.len(),
            self.joint_rand_len(),
        )?;
        let r1 = joint_rand[0];
        let r2 = joint_rand[1];

        let mut r1_pow = r1;
        let mut range_check = Field128::ZERO;
        let mut sum = Field128::ZERO;
        for &x in input {
            let check = caller.call(&[x])?;
            range_check += r1_pow * check;
            r1_pow *= r1;
            sum += x;
        }

        let num_shares_inv = Field128::from_u128(num_shares as u128)
            .inv()
            .ok_or_else(|| FlpError::InvalidInput("num_shares must be nonzero".into()))?;
        let sum_check = sum - num_shares_inv;
        Ok(r2 * range_check + r2 * r2 * sum_check)
    }
}
