//! `FlpGeneric` (C6): the gadget-based Fully Linear Proof engine that
//! `prove`s, `query`s and `decide`s validity of a circuit's input, with
//! `query` itself a linear function of `(input, proof)` — so running it on
//! additive shares yields additive shares of the verifier message
//! (spec.md §4.5). This is the property `Prio3` (C8) builds its distributed
//! verification on.

use prio3_field::fft::interp_pow2;
use prio3_field::polynomial::Polynomial;
use prio3_field::Field;
use prio3_util::next_pow2;

use crate::errors::FlpError;
use crate::flp::gadgets::Gadget;
use crate::flp::types::{GadgetCaller, Type};

type CircuitGadget<T> = <T as Type>::Gadget;
type CircuitField<T> = <T as Type>::Field;

/// Records each gadget call's input wires as the circuit is evaluated, and
/// returns either the gadget's real output (while proving) or a value read
/// off the gadget polynomial carried in the proof (while querying) —
/// spec.md §4.5's "Prove" and "Query" share this one recording pass, since
/// both need the same wire tables to reinterpolate `poly_wire_i[j]`.
struct RecordingCaller<'a, F: Field, G: Gadget<F>> {
    gadget: G,
    wire: Vec<Vec<F>>,
    query: Option<(&'a Polynomial<F>, F)>,
}

impl<'a, F: Field, G: Gadget<F>> RecordingCaller<'a, F, G> {
    fn new(gadget: G, arity: usize, query: Option<(&'a Polynomial<F>, F)>) -> Self {
        RecordingCaller {
            gadget,
            wire: vec![Vec::new(); arity],
            query,
        }
    }
}

impl<'a, F: Field, G: Gadget<F>> GadgetCaller<F> for RecordingCaller<'a, F, G> {
    fn call(&mut self, inputs: &[F]) -> Result<F, FlpError> {
        for (j, &x) in inputs.iter().enumerate() {
            self.wire[j].push(x);
        }
        match self.query {
            None => self.gadget.eval_field(inputs),
            Some((poly_gadget, omega)) => {
                // 1-based: the k-th call (k = 1..M) reads the gadget
                // polynomial at omega^k (spec.md §4.5).
                let k = self.wire[0].len() as u128;
                Ok(poly_gadget.eval(omega.pow(k)))
            }
        }
    }
}

/// The FLP engine, parameterized by a validity circuit.
#[derive(Clone, Debug)]
pub struct FlpGeneric<T: Type> {
    pub circuit: T,
}

impl<T: Type> FlpGeneric<T> {
    pub fn new(circuit: T) -> Self {
        FlpGeneric { circuit }
    }

    /// `P`: the gadget's interpolation-grid size, `next_pow2(M + 1)`.
    fn p(&self) -> usize {
        next_pow2(self.circuit.gadget_calls() + 1)
    }

    fn omega(&self) -> CircuitField<T> {
        CircuitField::<T>::primitive_root_of_unity(self.p() as u128)
    }

    pub fn input_len(&self) -> usize {
        self.circuit.input_len()
    }

    pub fn output_len(&self) -> usize {
        self.circuit.output_len()
    }

    pub fn joint_rand_len(&self) -> usize {
        self.circuit.joint_rand_len()
    }

    /// `PROVE_RAND_LEN = Σ G_i.ARITY`; a single gadget type here, so just
    /// its arity.
    pub fn prove_rand_len(&self) -> usize {
        <CircuitGadget<T> as Gadget<CircuitField<T>>>::ARITY
    }

    /// `QUERY_RAND_LEN = |G|`; exactly one gadget type in every normative
    /// circuit.
    pub fn query_rand_len(&self) -> usize {
        1
    }

    /// `PROOF_LEN = Σ (G_i.ARITY + G_i.DEGREE*(P_i - 1) + 1)`.
    pub fn proof_len(&self) -> usize {
        let arity = <CircuitGadget<T> as Gadget<CircuitField<T>>>::ARITY;
        let degree = <CircuitGadget<T> as Gadget<CircuitField<T>>>::DEGREE;
        arity + degree * (self.p() - 1) + 1
    }

    /// `VERIFIER_LEN = 1 + Σ (G_i.ARITY + 1)`.
    pub fn verifier_len(&self) -> usize {
        1 + <CircuitGadget<T> as Gadget<CircuitField<T>>>::ARITY + 1
    }

    /// spec.md §4.5 "Prove": evaluates the circuit to record wire tables,
    /// interpolates a wire polynomial per gadget input wire (seeded with a
    /// slot of `prove_rand`), applies the gadget identity to get the gadget
    /// polynomial, and serializes `seeds ‖ gadget_poly_coeffs`.
    pub fn prove(
        &self,
        input: &[CircuitField<T>],
        prove_rand: &[CircuitField<T>],
        joint_rand: &[CircuitField<T>],
    ) -> Result<Vec<CircuitField<T>>, FlpError> {
        if input.len() != self.input_len() {
            return Err(FlpError::InvalidInput(format!(
                "FlpGeneric::prove: input length {} != INPUT_LEN {}",
                input.len(),
                self.input_len()
            )));
        }
        if prove_rand.len() != self.prove_rand_len() {
            return Err(FlpError::InvalidInput(format!(
                "FlpGeneric::prove: prove_rand length {} != PROVE_RAND_LEN {}",
                prove_rand.len(),
                self.prove_rand_len()
            )));
        }

        let p = self.p();
        let omega = self.omega();
        let arity = <CircuitGadget<T> as Gadget<CircuitField<T>>>::ARITY;

        let mut caller = RecordingCaller::new(self.circuit.gadget(), arity, None);
        // The prover runs the circuit on the full (reconstructed)
        // measurement, so num_shares is always 1 here.
        let _v = self.circuit.eval_with(&mut caller, input, joint_rand, 1)?;

        let mut poly_wires = Vec::with_capacity(arity);
        for (j, &seed) in prove_rand.iter().enumerate() {
            let mut y = Vec::with_capacity(p);
            y.push(seed);
            y.extend_from_slice(&caller.wire[j]);
            y.resize(p, CircuitField::<T>::ZERO);
            poly_wires.push(interp_pow2(&y, omega, p));
        }
        let poly_gadget = self.circuit.gadget().eval_poly(&poly_wires)?;

        let gadget_chunk_len =
            <CircuitGadget<T> as Gadget<CircuitField<T>>>::DEGREE * (p - 1) + 1;
        let mut coeffs = poly_gadget.coeffs;
        coeffs.resize(gadget_chunk_len, CircuitField::<T>::ZERO);

        let mut proof = Vec::with_capacity(self.proof_len());
        proof.extend_from_slice(prove_rand);
        proof.extend_from_slice(&coeffs);
        Ok(proof)
    }

    /// spec.md §4.5 "Query": re-evaluates the circuit, but every gadget
    /// call is answered by a lookup into the gadget polynomial carried in
    /// `proof` rather than by the gadget itself — the verifier never
    /// evaluates the gadget directly. Fails with [`FlpError::Abort`] if the
    /// supplied query point would coincide with an interpolation point.
    pub fn query(
        &self,
        input: &[CircuitField<T>],
        proof: &[CircuitField<T>],
        query_rand: &[CircuitField<T>],
        joint_rand: &[CircuitField<T>],
        num_shares: usize,
    ) -> Result<Vec<CircuitField<T>>, FlpError> {
        if input.len() != self.input_len() {
            return Err(FlpError::InvalidInput(format!(
                "FlpGeneric::query: input length {} != INPUT_LEN {}",
                input.len(),
                self.input_len()
            )));
        }
        if proof.len() != self.proof_len() {
            return Err(FlpError::InvalidInput(format!(
                "FlpGeneric::query: proof length {} != PROOF_LEN {}",
                proof.len(),
                self.proof_len()
            )));
        }
        if query_rand.len() != self.query_rand_len() {
            return Err(FlpError::InvalidInput(format!(
                "FlpGeneric::query: query_rand length {} != QUERY_RAND_LEN {}",
                query_rand.len(),
                self.query_rand_len()
            )));
        }

        let p = self.p();
        let omega = self.omega();
        let arity = <CircuitGadget<T> as Gadget<CircuitField<T>>>::ARITY;

        let seeds = &proof[..arity];
        let poly_gadget = Polynomial::from_coeffs_exact(proof[arity..].to_vec());

        let t = query_rand[0];
        if t.pow(p as u128) == CircuitField::<T>::ONE {
            return Err(FlpError::Abort);
        }

        let mut caller = RecordingCaller::new(self.circuit.gadget(), arity, Some((&poly_gadget, t)));
        let v = self.circuit.eval_with(&mut caller, input, joint_rand, num_shares)?;

        let mut verifier = Vec::with_capacity(self.verifier_len());
        verifier.push(v);
        for (j, &seed) in seeds.iter().enumerate() {
            let mut y = Vec::with_capacity(p);
            y.push(seed);
            y.extend_from_slice(&caller.wire[j]);
            y.resize(p, CircuitField::<T>::ZERO);
            let poly_wire = interp_pow2(&y, omega, p);
            verifier.push(poly_wire.eval(t));
        }
        verifier.push(poly_gadget.eval(t));
        Ok(verifier)
    }

    /// spec.md §4.5 "Decide": accepts iff the circuit value is zero and
    /// every gadget's claimed output matches its claimed inputs.
    pub fn decide(&self, verifier: &[CircuitField<T>]) -> Result<bool, FlpError> {
        if verifier.len() != self.verifier_len() {
            return Err(FlpError::InvalidInput(format!(
                "FlpGeneric::decide: verifier length {} != VERIFIER_LEN {}",
                verifier.len(),
                self.verifier_len()
            )));
        }
        let v = verifier[0];
        if v != CircuitField::<T>::ZERO {
            return Ok(false);
        }
        let arity = <CircuitGadget<T> as Gadget<CircuitField<T>>>::ARITY;
        let xs = &verifier[1..1 + arity];
        let y = verifier[1 + arity];
        let y_check = self.circuit.gadget().eval_field(xs)?;
        Ok(y_check == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flp::types::{Count, Histogram, Sum};
    use prio3_field::{Field128, Field64};

    fn run_flp<T: Type>(
        flp: &FlpGeneric<T>,
        input: &[CircuitField<T>],
        prove_rand: &[CircuitField<T>],
        query_rand: &[CircuitField<T>],
        joint_rand: &[CircuitField<T>],
    ) -> Result<bool, FlpError> {
        let proof = flp.prove(input, prove_rand, joint_rand)?;
        let verifier = flp.query(input, &proof, query_rand, joint_rand, 1)?;
        flp.decide(&verifier)
    }

    #[test]
    fn test_count_completeness() {
        let flp = FlpGeneric::new(Count);
        for &m in &[false, true] {
            let input = Count.encode(&m).unwrap();
            let prove_rand = vec![Field64::from_u128(7)];
            let query_rand = vec![Field64::from_u128(13)];
            assert!(run_flp(&flp, &input, &prove_rand, &query_rand, &[]).unwrap());
        }
    }

    #[test]
    fn test_count_soundness_rejects_bad_input() {
        let flp = FlpGeneric::new(Count);
        let input = vec![Field64::from_u128(2)]; // not in {0, 1}
        let prove_rand = vec![Field64::from_u128(9)];
        let query_rand = vec![Field64::from_u128(4)];
        assert!(!run_flp(&flp, &input, &prove_rand, &query_rand, &[]).unwrap());
    }

    #[test]
    fn test_sum_completeness_and_soundness() {
        let circuit = Sum::new(8).unwrap();
        let flp = FlpGeneric::new(circuit.clone());
        let input = circuit.encode(&200u128).unwrap();
        let prove_rand: Vec<_> = (0..flp.prove_rand_len())
            .map(|i| Field128::from_u128(100 + i as u128))
            .collect();
        let query_rand = vec![Field128::from_u128(55)];
        let joint_rand = vec![Field128::from_u128(3)];
        assert!(run_flp(&flp, &input, &prove_rand, &query_rand, &joint_rand).unwrap());

        // Flip one bit to an out-of-range value: the circuit is no longer
        // valid, and the FLP should (with overwhelming probability, and
        // certainly for this fixed query point) reject.
        let mut bad_input = input.clone();
        bad_input[0] = Field128::from_u128(2);
        assert!(!run_flp(&flp, &bad_input, &prove_rand, &query_rand, &joint_rand).unwrap());
    }

    #[test]
    fn test_histogram_completeness() {
        let circuit = Histogram::new(vec![1, 10, 100]).unwrap();
        let flp = FlpGeneric::new(circuit.clone());
        let input = circuit.encode(&50u128).unwrap();
        let prove_rand: Vec<_> = (0..flp.prove_rand_len())
            .map(|i| Field128::from_u128(17 + i as u128))
            .collect();
        let query_rand = vec![Field128::from_u128(91)];
        let joint_rand = vec![Field128::from_u128(3), Field128::from_u128(11)];
        assert!(run_flp(&flp, &input, &prove_rand, &query_rand, &joint_rand).unwrap());
    }

    #[test]
    fn test_linearity_query_is_additive_over_shares() {
        // query(inp, proof, qr, jr, 2) == query(inp_0, proof_0, qr, jr, 2) +
        //   query(inp_1, proof_1, qr, jr, 2), for any additive 2-way split.
        let circuit = Sum::new(8).unwrap();
        let flp = FlpGeneric::new(circuit.clone());
        let input = circuit.encode(&42u128).unwrap();
        let prove_rand: Vec<_> = (0..flp.prove_rand_len())
            .map(|i| Field128::from_u128(5 + i as u128))
            .collect();
        let joint_rand = vec![Field128::from_u128(9)];
        let query_rand = vec![Field128::from_u128(123)];
        let proof = flp.prove(&input, &prove_rand, &joint_rand).unwrap();

        let share_1: Vec<_> = input.iter().map(|&x| x + Field128::from_u128(999)).collect();
        let share_0: Vec<_> = input
            .iter()
            .zip(&share_1)
            .map(|(&x, &s1)| x - s1)
            .collect();
        let proof_1: Vec<_> = proof.iter().map(|&x| x + Field128::from_u128(1234)).collect();
        let proof_0: Vec<_> = proof
            .iter()
            .zip(&proof_1)
            .map(|(&x, &p1)| x - p1)
            .collect();

        let full = flp.query(&input, &proof, &query_rand, &joint_rand, 2).unwrap();
        let v0 = flp.query(&share_0, &proof_0, &query_rand, &joint_rand, 2).unwrap();
        let v1 = flp.query(&share_1, &proof_1, &query_rand, &joint_rand, 2).unwrap();
        let summed: Vec<_> = v0.iter().zip(&v1).map(|(&a, &b)| a + b).collect();
        assert_eq!(full, summed);
    }

    #[test]
    fn test_query_rejects_wrong_proof_length() {
        let flp = FlpGeneric::new(Count);
        let input = Count.encode(&true).unwrap();
        let query_rand = vec![Field64::from_u128(4)];
        assert!(flp.query(&input, &[Field64::ZERO; 2], &query_rand, &[], 1).is_err());
    }
}
