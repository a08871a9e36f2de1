//! `Prio3` (C8): sharding, one-round preparation, aggregation and
//! unsharding, built on top of [`crate::flp::FlpGeneric`] (spec.md §4.6).
//!
//! Domain separation follows spec.md §6 exactly: the ASCII tag
//! `"vdaf-00 prio3"` (optionally suffixed by a share index) identifies
//! per-share expansion; `byte(255) ‖ nonce` tags per-measurement query
//! randomness; `byte(j) ‖ encode_vec(input_share)` tags joint-randomness
//! hints.

use prio3_field::Field;
use prio3_prg::{Prg, Seed, SEED_SIZE};
use rand::RngCore;

use crate::errors::VdafError;
use crate::flp::{FlpGeneric, Type};

/// Domain-separation tag for this VDAF, spec.md §6.
const DST: &[u8] = b"vdaf-00 prio3";

fn dst_share(aggregator_id: u8) -> Vec<u8> {
    let mut info = DST.to_vec();
    info.push(aggregator_id);
    info
}

fn hint_info<F: Field>(aggregator_id: u8, share_inp: &[F]) -> Vec<u8> {
    let mut info = vec![aggregator_id];
    info.extend_from_slice(&F::encode_vec(share_inp));
    info
}

fn query_rand_info(nonce: &[u8]) -> Vec<u8> {
    let mut info = vec![255u8];
    info.extend_from_slice(nonce);
    info
}

fn seed_from_slice(bytes: &[u8]) -> Result<Seed, VdafError> {
    if bytes.len() != SEED_SIZE {
        return Err(VdafError::Decode(format!(
            "seed: expected {SEED_SIZE} bytes, got {}",
            bytes.len()
        )));
    }
    let mut buf = [0u8; SEED_SIZE];
    buf.copy_from_slice(bytes);
    Ok(Seed::from_bytes(buf))
}

/// Per-aggregator verification parameter (spec.md §3): secret from clients
/// and the collector. `k_query_init` is shared-ownership across all
/// aggregators in a batch.
#[derive(Clone, Copy)]
pub struct VerifyParam {
    pub aggregator_id: u8,
    pub k_query_init: Seed,
}

impl std::fmt::Debug for VerifyParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyParam")
            .field("aggregator_id", &self.aggregator_id)
            .field("k_query_init", &self.k_query_init)
            .finish()
    }
}

/// A client-generated input share, in the wire shape spec.md §6 defines.
/// Aggregator 0 ("leader") gets the explicit input/proof vectors plus the
/// leftover-share arithmetic; aggregators `>= 1` ("helpers") get only the
/// seeds that expand into their share.
#[derive(Clone, Debug)]
pub enum InputShare<F: Field> {
    Leader {
        input_share: Vec<F>,
        proof_share: Vec<F>,
        blind: Option<Seed>,
        hint: Option<Seed>,
    },
    Helper {
        k_input: Seed,
        k_proof: Seed,
        blind: Option<Seed>,
        hint: Option<Seed>,
    },
}

/// An aggregator's outbound message from `prep_init`: its share of the
/// verifier, plus (if joint randomness is used) its local joint-randomness
/// contribution.
#[derive(Clone, Debug)]
pub struct PrepShare<F: Field> {
    pub verifier_share: Vec<F>,
    pub k_joint_rand_share: Option<Seed>,
}

/// The combined prep message every aggregator consumes in `prep_next`: the
/// verifier shares summed, and the joint-randomness contributions XORed.
#[derive(Clone, Debug)]
pub struct PrepMessage<F: Field> {
    pub verifier: Vec<F>,
    pub k_joint_rand_check: Option<Seed>,
}

/// An aggregator's suspended state between `prep_init` and `prep_next`
/// (spec.md §3/§5): the output share it will emit on success, and the
/// joint randomness it computed from its own share (to cross-check against
/// what the other aggregators saw).
#[derive(Clone, Debug)]
pub struct PrepState<F: Field> {
    out_share: Vec<F>,
    k_joint_rand: Option<Seed>,
}

/// The `Prio3` VDAF (C8), parameterized by a validity circuit. `PrgAes128`
/// is the only normative PRG (spec.md §4.3), so it isn't a type parameter
/// here — unlike the circuit, there is nothing to choose between.
#[derive(Clone, Debug)]
pub struct Prio3<T: Type> {
    flp: FlpGeneric<T>,
    shares: u8,
}

impl<T: Type> Prio3<T> {
    /// `SHARES` must be in `[2, 255)` (spec.md §3).
    pub fn new(shares: u8, circuit: T) -> Result<Self, VdafError> {
        if !(2..255).contains(&shares) {
            return Err(VdafError::InvalidInput(format!(
                "Prio3: SHARES must be in [2, 255), got {shares}"
            )));
        }
        Ok(Prio3 {
            flp: FlpGeneric::new(circuit),
            shares,
        })
    }

    pub fn shares(&self) -> u8 {
        self.shares
    }

    pub fn flp(&self) -> &FlpGeneric<T> {
        &self.flp
    }

    /// spec.md §4.6 "Setup": draws the batch-scoped `k_query_init` seed
    /// shared by every aggregator. There is no public parameter (spec.md
    /// §3, §9 open question).
    pub fn setup<R: RngCore>(&self, rng: &mut R) -> Vec<VerifyParam> {
        let k_query_init = Seed::random(rng);
        (0..self.shares)
            .map(|aggregator_id| VerifyParam {
                aggregator_id,
                k_query_init,
            })
            .collect()
    }

    /// spec.md §4.6 "Shard": the client's one-shot operation, producing one
    /// input share per aggregator.
    pub fn shard<R: RngCore>(
        &self,
        rng: &mut R,
        measurement: &T::Measurement,
    ) -> Result<Vec<InputShare<T::Field>>, VdafError> {
        let inp = self.flp.circuit.encode(measurement).map_err(VdafError::from)?;
        let shares = self.shares as usize;
        let input_len = self.flp.input_len();
        let proof_len = self.flp.proof_len();
        let joint_rand_len = self.flp.joint_rand_len();

        // 1. Input shares: SHARES-1 random helper shares, leader holds the
        // difference.
        let mut helper_k_inputs = Vec::with_capacity(shares - 1);
        let mut leader_inp = inp.clone();
        let mut helper_inps = Vec::with_capacity(shares - 1);
        for j in 1..shares {
            let k_share_j = Seed::random(rng);
            let helper_inp_j: Vec<T::Field> =
                Prg::expand_into_vec(&k_share_j, &dst_share(j as u8), input_len);
            for l in 0..input_len {
                leader_inp[l] -= helper_inp_j[l];
            }
            helper_k_inputs.push(k_share_j);
            helper_inps.push(helper_inp_j);
        }
        let mut share_inps = Vec::with_capacity(shares);
        share_inps.push(leader_inp.clone());
        share_inps.extend(helper_inps);

        // 2. Joint randomness: every share draws a blind, derives a hint
        // from its own share, then the hints are xored and re-blinded so
        // each aggregator can independently recover k_joint_rand.
        let (blinds, hints, joint_rand) = if joint_rand_len > 0 {
            let mut blind_seeds = Vec::with_capacity(shares);
            let mut hint_seeds = Vec::with_capacity(shares);
            for j in 0..shares {
                let blind = Seed::random(rng);
                let hint = Prg::derive_seed(&blind, &hint_info(j as u8, &share_inps[j]));
                blind_seeds.push(blind);
                hint_seeds.push(hint);
            }
            let k_joint_rand = hint_seeds
                .iter()
                .fold(Seed::from_bytes([0u8; SEED_SIZE]), |acc, h| acc.xor(h));
            let stored_hints: Vec<Seed> = hint_seeds.iter().map(|h| h.xor(&k_joint_rand)).collect();
            let joint_rand: Vec<T::Field> = Prg::expand_into_vec(&k_joint_rand, DST, joint_rand_len);
            (
                blind_seeds.into_iter().map(Some).collect::<Vec<_>>(),
                stored_hints.into_iter().map(Some).collect::<Vec<_>>(),
                joint_rand,
            )
        } else {
            (vec![None; shares], vec![None; shares], Vec::new())
        };

        // 3. Proof.
        let prove_seed = Seed::random(rng);
        let prove_rand: Vec<T::Field> =
            Prg::expand_into_vec(&prove_seed, DST, self.flp.prove_rand_len());
        let proof = self.flp.prove(&inp, &prove_rand, &joint_rand)?;

        // 4. Proof shares, split exactly like the input shares.
        let mut helper_k_proofs = Vec::with_capacity(shares - 1);
        let mut leader_proof = proof.clone();
        for j in 1..shares {
            let k_proof_j = Seed::random(rng);
            let helper_proof_j: Vec<T::Field> =
                Prg::expand_into_vec(&k_proof_j, &dst_share(j as u8), proof_len);
            for l in 0..proof_len {
                leader_proof[l] -= helper_proof_j[l];
            }
            helper_k_proofs.push(k_proof_j);
        }

        // 5. Assemble.
        let mut out = Vec::with_capacity(shares);
        out.push(InputShare::Leader {
            input_share: share_inps[0].clone(),
            proof_share: leader_proof,
            blind: blinds[0],
            hint: hints[0],
        });
        for j in 1..shares {
            out.push(InputShare::Helper {
                k_input: helper_k_inputs[j - 1],
                k_proof: helper_k_proofs[j - 1],
                blind: blinds[j],
                hint: hints[j],
            });
        }
        tracing::debug!(shares, "sharded measurement");
        Ok(out)
    }

    /// spec.md §4.6 "Prep init": expands/decodes an aggregator's input
    /// share, truncates its output share, derives query and (if used)
    /// joint randomness, and queries the FLP to get this aggregator's
    /// verifier share.
    pub fn prep_init(
        &self,
        verify_param: &VerifyParam,
        nonce: &[u8],
        input_share: &InputShare<T::Field>,
    ) -> Result<(PrepState<T::Field>, PrepShare<T::Field>), VdafError> {
        let j = verify_param.aggregator_id;
        let (input_share_vec, proof_share_vec, blind, hint) = match input_share {
            InputShare::Leader {
                input_share,
                proof_share,
                blind,
                hint,
            } => (input_share.clone(), proof_share.clone(), *blind, *hint),
            InputShare::Helper {
                k_input,
                k_proof,
                blind,
                hint,
            } => {
                let input_share_vec: Vec<T::Field> =
                    Prg::expand_into_vec(k_input, &dst_share(j), self.flp.input_len());
                let proof_share_vec: Vec<T::Field> =
                    Prg::expand_into_vec(k_proof, &dst_share(j), self.flp.proof_len());
                (input_share_vec, proof_share_vec, *blind, *hint)
            }
        };

        let out_share = self
            .flp
            .circuit
            .truncate(input_share_vec.clone())
            .map_err(VdafError::from)?;

        let k_query_rand = Prg::derive_seed(&verify_param.k_query_init, &query_rand_info(nonce));
        let query_rand: Vec<T::Field> =
            Prg::expand_into_vec(&k_query_rand, DST, self.flp.query_rand_len());

        let (k_joint_rand, k_joint_rand_share, joint_rand) = if self.flp.joint_rand_len() > 0 {
            let blind = blind
                .ok_or_else(|| VdafError::Decode("input share missing blind".to_string()))?;
            let hint =
                hint.ok_or_else(|| VdafError::Decode("input share missing hint".to_string()))?;
            let k_joint_rand_share = Prg::derive_seed(&blind, &hint_info(j, &input_share_vec));
            let k_joint_rand = hint.xor(&k_joint_rand_share);
            let joint_rand: Vec<T::Field> =
                Prg::expand_into_vec(&k_joint_rand, DST, self.flp.joint_rand_len());
            (Some(k_joint_rand), Some(k_joint_rand_share), joint_rand)
        } else {
            (None, None, Vec::new())
        };

        let verifier_share = self.flp.query(
            &input_share_vec,
            &proof_share_vec,
            &query_rand,
            &joint_rand,
            self.shares as usize,
        )?;

        tracing::debug!(aggregator_id = j, "computed verifier share");
        Ok((
            PrepState {
                out_share,
                k_joint_rand,
            },
            PrepShare {
                verifier_share,
                k_joint_rand_share,
            },
        ))
    }

    /// spec.md §4.6 "Prep shares -> prep message": the public, stateless
    /// combination step. Sums verifier shares and xors joint-randomness
    /// contributions.
    pub fn prep_shares_to_prep(
        &self,
        prep_shares: &[PrepShare<T::Field>],
    ) -> Result<PrepMessage<T::Field>, VdafError> {
        if prep_shares.len() != self.shares as usize {
            return Err(VdafError::InvalidInput(format!(
                "prep_shares_to_prep: expected {} prep shares, got {}",
                self.shares,
                prep_shares.len()
            )));
        }
        let mut verifier = vec![T::Field::ZERO; self.flp.verifier_len()];
        let mut k_joint_rand_check: Option<Seed> = None;
        for share in prep_shares {
            if share.verifier_share.len() != self.flp.verifier_len() {
                return Err(VdafError::Decode(
                    "prep share: wrong verifier length".to_string(),
                ));
            }
            for (acc, &s) in verifier.iter_mut().zip(share.verifier_share.iter()) {
                *acc += s;
            }
            k_joint_rand_check = match (k_joint_rand_check, share.k_joint_rand_share) {
                (None, Some(s)) => Some(s),
                (Some(acc), Some(s)) => Some(acc.xor(&s)),
                (None, None) => None,
                (Some(_), None) => {
                    return Err(VdafError::Decode(
                        "prep share: inconsistent joint randomness usage".to_string(),
                    ))
                }
            };
        }
        Ok(PrepMessage {
            verifier,
            k_joint_rand_check,
        })
    }

    /// spec.md §4.6 "Prep next": consumes the combined prep message,
    /// checking joint-randomness agreement (if used) and the FLP decision.
    /// On success returns the output share; state is dropped either way.
    pub fn prep_next(
        &self,
        state: PrepState<T::Field>,
        msg: PrepMessage<T::Field>,
    ) -> Result<Vec<T::Field>, VdafError> {
        if let Some(expected) = state.k_joint_rand {
            let got = msg
                .k_joint_rand_check
                .ok_or_else(|| VdafError::Verify("missing joint randomness check".to_string()))?;
            if got != expected {
                tracing::warn!("joint randomness mismatch");
                return Err(VdafError::Verify(
                    "joint randomness mismatch across aggregators".to_string(),
                ));
            }
        }
        if !self.flp.decide(&msg.verifier)? {
            tracing::warn!("FLP verifier check failed");
            return Err(VdafError::Verify("FLP verifier check failed".to_string()));
        }
        Ok(state.out_share)
    }

    /// spec.md §4.6 "Aggregate": folds one output share into a running
    /// aggregate share. `agg_share` is extended with zeros on first use.
    pub fn aggregate(
        &self,
        agg_share: &mut Vec<T::Field>,
        out_share: &[T::Field],
    ) -> Result<(), VdafError> {
        if agg_share.is_empty() {
            agg_share.resize(self.flp.output_len(), T::Field::ZERO);
        }
        if agg_share.len() != out_share.len() {
            return Err(VdafError::InvalidInput(format!(
                "aggregate: length mismatch {} vs {}",
                agg_share.len(),
                out_share.len()
            )));
        }
        for (a, &o) in agg_share.iter_mut().zip(out_share) {
            *a += o;
        }
        Ok(())
    }

    /// spec.md §4.6 "Unshard": sums the aggregate shares and maps each
    /// element to its unsigned integer representative.
    pub fn unshard(&self, agg_shares: &[Vec<T::Field>]) -> Result<Vec<u128>, VdafError> {
        let output_len = self.flp.output_len();
        let mut result = vec![T::Field::ZERO; output_len];
        for share in agg_shares {
            if share.len() != output_len {
                return Err(VdafError::InvalidInput(format!(
                    "unshard: aggregate share length {} != OUTPUT_LEN {}",
                    share.len(),
                    output_len
                )));
            }
            for (acc, &s) in result.iter_mut().zip(share) {
                *acc += s;
            }
        }
        Ok(result.iter().map(|x| x.as_unsigned()).collect())
    }

    // -- Wire encoding (spec.md §6) -----------------------------------

    pub fn encode_input_share(&self, share: &InputShare<T::Field>) -> Vec<u8> {
        let mut out = Vec::new();
        match share {
            InputShare::Leader {
                input_share,
                proof_share,
                blind,
                hint,
            } => {
                out.extend(T::Field::encode_vec(input_share));
                out.extend(T::Field::encode_vec(proof_share));
                if let Some(b) = blind {
                    out.extend_from_slice(b.as_bytes());
                }
                if let Some(h) = hint {
                    out.extend_from_slice(h.as_bytes());
                }
            }
            InputShare::Helper {
                k_input,
                k_proof,
                blind,
                hint,
            } => {
                out.extend_from_slice(k_input.as_bytes());
                out.extend_from_slice(k_proof.as_bytes());
                if let Some(b) = blind {
                    out.extend_from_slice(b.as_bytes());
                }
                if let Some(h) = hint {
                    out.extend_from_slice(h.as_bytes());
                }
            }
        }
        out
    }

    pub fn decode_leader_input_share(&self, bytes: &[u8]) -> Result<InputShare<T::Field>, VdafError> {
        let input_len_bytes = self.flp.input_len() * T::Field::ENCODED_SIZE;
        let proof_len_bytes = self.flp.proof_len() * T::Field::ENCODED_SIZE;
        let has_jr = self.flp.joint_rand_len() > 0;
        let expected = input_len_bytes + proof_len_bytes + if has_jr { 2 * SEED_SIZE } else { 0 };
        if bytes.len() != expected {
            return Err(VdafError::Decode(format!(
                "leader input share: expected {expected} bytes, got {}",
                bytes.len()
            )));
        }
        let (inp_bytes, rest) = bytes.split_at(input_len_bytes);
        let (proof_bytes, rest) = rest.split_at(proof_len_bytes);
        let input_share = T::Field::decode_vec(inp_bytes)?;
        let proof_share = T::Field::decode_vec(proof_bytes)?;
        let (blind, hint) = if has_jr {
            let (b, h) = rest.split_at(SEED_SIZE);
            (Some(seed_from_slice(b)?), Some(seed_from_slice(h)?))
        } else {
            (None, None)
        };
        Ok(InputShare::Leader {
            input_share,
            proof_share,
            blind,
            hint,
        })
    }

    pub fn decode_helper_input_share(&self, bytes: &[u8]) -> Result<InputShare<T::Field>, VdafError> {
        let has_jr = self.flp.joint_rand_len() > 0;
        let expected = 2 * SEED_SIZE + if has_jr { 2 * SEED_SIZE } else { 0 };
        if bytes.len() != expected {
            return Err(VdafError::Decode(format!(
                "helper input share: expected {expected} bytes, got {}",
                bytes.len()
            )));
        }
        let (k_input, rest) = bytes.split_at(SEED_SIZE);
        let (k_proof, rest) = rest.split_at(SEED_SIZE);
        let k_input = seed_from_slice(k_input)?;
        let k_proof = seed_from_slice(k_proof)?;
        let (blind, hint) = if has_jr {
            let (b, h) = rest.split_at(SEED_SIZE);
            (Some(seed_from_slice(b)?), Some(seed_from_slice(h)?))
        } else {
            (None, None)
        };
        Ok(InputShare::Helper {
            k_input,
            k_proof,
            blind,
            hint,
        })
    }

    pub fn encode_prep_share(&self, share: &PrepShare<T::Field>) -> Vec<u8> {
        let mut out = T::Field::encode_vec(&share.verifier_share);
        if let Some(s) = &share.k_joint_rand_share {
            out.extend_from_slice(s.as_bytes());
        }
        out
    }

    pub fn decode_prep_share(&self, bytes: &[u8]) -> Result<PrepShare<T::Field>, VdafError> {
        let verifier_len_bytes = self.flp.verifier_len() * T::Field::ENCODED_SIZE;
        let has_jr = self.flp.joint_rand_len() > 0;
        let expected = verifier_len_bytes + if has_jr { SEED_SIZE } else { 0 };
        if bytes.len() != expected {
            return Err(VdafError::Decode(format!(
                "prep share: expected {expected} bytes, got {}",
                bytes.len()
            )));
        }
        let (v_bytes, rest) = bytes.split_at(verifier_len_bytes);
        let verifier_share = T::Field::decode_vec(v_bytes)?;
        let k_joint_rand_share = if has_jr { Some(seed_from_slice(rest)?) } else { None };
        Ok(PrepShare {
            verifier_share,
            k_joint_rand_share,
        })
    }

    pub fn encode_prep_message(&self, msg: &PrepMessage<T::Field>) -> Vec<u8> {
        let mut out = T::Field::encode_vec(&msg.verifier);
        if let Some(s) = &msg.k_joint_rand_check {
            out.extend_from_slice(s.as_bytes());
        }
        out
    }

    pub fn decode_prep_message(&self, bytes: &[u8]) -> Result<PrepMessage<T::Field>, VdafError> {
        let verifier_len_bytes = self.flp.verifier_len() * T::Field::ENCODED_SIZE;
        let has_jr = self.flp.joint_rand_len() > 0;
        let expected = verifier_len_bytes + if has_jr { SEED_SIZE } else { 0 };
        if bytes.len() != expected {
            return Err(VdafError::Decode(format!(
                "prep message: expected {expected} bytes, got {}",
                bytes.len()
            )));
        }
        let (v_bytes, rest) = bytes.split_at(verifier_len_bytes);
        let verifier = T::Field::decode_vec(v_bytes)?;
        let k_joint_rand_check = if has_jr { Some(seed_from_slice(rest)?) } else { None };
        Ok(PrepMessage {
            verifier,
            k_joint_rand_check,
        })
    }

    pub fn encode_aggregate_share(share: &[T::Field]) -> Vec<u8> {
        T::Field::encode_vec(share)
    }

    pub fn decode_aggregate_share(&self, bytes: &[u8]) -> Result<Vec<T::Field>, VdafError> {
        let v = T::Field::decode_vec(bytes)?;
        if v.len() != self.flp.output_len() {
            return Err(VdafError::Decode(format!(
                "aggregate share: expected {} elements, got {}",
                self.flp.output_len(),
                v.len()
            )));
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flp::{Count, Histogram, Sum};
    use prio3_field::{Field128, Field64};
    use rand::rngs::OsRng;

    fn run_e2e<T: Type + Clone>(
        vdaf: &Prio3<T>,
        measurements: &[T::Measurement],
        nonces: &[[u8; 16]],
    ) -> Result<Vec<u128>, VdafError> {
        let mut rng = OsRng;
        let verify_params = vdaf.setup(&mut rng);
        let mut agg_shares: Vec<Vec<T::Field>> = vec![Vec::new(); vdaf.shares() as usize];

        for (measurement, nonce) in measurements.iter().zip(nonces) {
            let input_shares = vdaf.shard(&mut rng, measurement)?;
            let mut states = Vec::with_capacity(vdaf.shares() as usize);
            let mut prep_shares = Vec::with_capacity(vdaf.shares() as usize);
            for (vp, share) in verify_params.iter().zip(&input_shares) {
                let (state, prep_share) = vdaf.prep_init(vp, nonce, share)?;
                states.push(state);
                prep_shares.push(prep_share);
            }
            let prep_msg = vdaf.prep_shares_to_prep(&prep_shares)?;
            for (j, state) in states.into_iter().enumerate() {
                let out_share = vdaf.prep_next(state, prep_msg.clone())?;
                vdaf.aggregate(&mut agg_shares[j], &out_share)?;
            }
        }
        vdaf.unshard(&agg_shares)
    }

    #[test]
    fn test_count_end_to_end() {
        let vdaf = Prio3::new(2, Count).unwrap();
        let result = run_e2e(&vdaf, &[true, true, false], &[[1; 16], [2; 16], [3; 16]]).unwrap();
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn test_count_end_to_end_three_shares() {
        let vdaf = Prio3::new(3, Count).unwrap();
        let result = run_e2e(&vdaf, &[true, true, true, false], &[[1; 16], [2; 16], [3; 16], [4; 16]]).unwrap();
        assert_eq!(result, vec![3]);
    }

    #[test]
    fn test_sum_end_to_end() {
        let vdaf = Prio3::new(2, Sum::new(8).unwrap()).unwrap();
        let result = run_e2e(&vdaf, &[100u128, 50, 6], &[[1; 16], [2; 16], [3; 16]]).unwrap();
        assert_eq!(result, vec![156]);
    }

    #[test]
    fn test_histogram_end_to_end() {
        let vdaf = Prio3::new(2, Histogram::new(vec![1, 10, 100]).unwrap()).unwrap();
        let result = run_e2e(&vdaf, &[50u128, 5, 500, 1000], &[[1; 16], [2; 16], [3; 16], [4; 16]]).unwrap();
        assert_eq!(result, vec![0, 1, 1, 2]);
    }

    #[test]
    fn test_shard_rejects_out_of_range_measurement() {
        let vdaf = Prio3::new(2, Sum::new(8).unwrap()).unwrap();
        let mut rng = OsRng;
        assert!(matches!(vdaf.shard(&mut rng, &256u128), Err(VdafError::Encode(_))));
    }

    #[test]
    fn test_tampered_input_share_fails_verification() {
        let vdaf = Prio3::new(2, Count).unwrap();
        let mut rng = OsRng;
        let verify_params = vdaf.setup(&mut rng);
        let nonce = [7u8; 16];
        let mut input_shares = vdaf.shard(&mut rng, &true).unwrap();

        // Flip a bit of the helper's input-share seed.
        if let InputShare::Helper { k_input, .. } = &mut input_shares[1] {
            k_input.0[0] ^= 0x01;
        }

        let (state0, share0) = vdaf.prep_init(&verify_params[0], &nonce, &input_shares[0]).unwrap();
        let (state1, share1) = vdaf.prep_init(&verify_params[1], &nonce, &input_shares[1]).unwrap();
        let prep_msg = vdaf.prep_shares_to_prep(&[share0, share1]).unwrap();

        let r0 = vdaf.prep_next(state0, prep_msg.clone());
        let r1 = vdaf.prep_next(state1, prep_msg);
        assert!(r0.is_err() || r1.is_err());
    }

    #[test]
    fn test_setup_assigns_distinct_aggregator_ids_and_shared_query_init() {
        let vdaf = Prio3::new(3, Count).unwrap();
        let mut rng = OsRng;
        let verify_params = vdaf.setup(&mut rng);
        assert_eq!(verify_params.len(), 3);
        assert_eq!(
            verify_params.iter().map(|v| v.aggregator_id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(verify_params
            .windows(2)
            .all(|w| w[0].k_query_init.0 == w[1].k_query_init.0));
    }

    #[test]
    fn test_wire_roundtrip_input_share_helper() {
        let vdaf = Prio3::new(2, Sum::new(8).unwrap()).unwrap();
        let mut rng = OsRng;
        let input_shares = vdaf.shard(&mut rng, &42u128).unwrap();
        let bytes = vdaf.encode_input_share(&input_shares[1]);
        let decoded = vdaf.decode_helper_input_share(&bytes).unwrap();
        match (&input_shares[1], &decoded) {
            (
                InputShare::Helper { k_input: a, k_proof: b, blind: c, hint: d },
                InputShare::Helper { k_input: e, k_proof: f, blind: g, hint: h },
            ) => {
                assert_eq!(a.0, e.0);
                assert_eq!(b.0, f.0);
                assert_eq!(c.map(|s| s.0), g.map(|s| s.0));
                assert_eq!(d.map(|s| s.0), h.map(|s| s.0));
            }
            _ => panic!("expected helper shares"),
        }
    }

    #[test]
    fn test_wire_roundtrip_input_share_leader() {
        let vdaf = Prio3::new(2, Count).unwrap();
        let mut rng = OsRng;
        let input_shares = vdaf.shard(&mut rng, &true).unwrap();
        let bytes = vdaf.encode_input_share(&input_shares[0]);
        let decoded = vdaf.decode_leader_input_share(&bytes).unwrap();
        match (&input_shares[0], &decoded) {
            (
                InputShare::Leader { input_share: a, proof_share: b, .. },
                InputShare::Leader { input_share: e, proof_share: f, .. },
            ) => {
                assert_eq!(a, e);
                assert_eq!(b, f);
            }
            _ => panic!("expected leader shares"),
        }
    }

    #[test]
    fn test_wire_roundtrip_prep_share_and_message() {
        let vdaf = Prio3::new(2, Sum::new(8).unwrap()).unwrap();
        let mut rng = OsRng;
        let verify_params = vdaf.setup(&mut rng);
        let nonce = [9u8; 16];
        let input_shares = vdaf.shard(&mut rng, &42u128).unwrap();
        let (_, prep_share) = vdaf.prep_init(&verify_params[0], &nonce, &input_shares[0]).unwrap();

        let bytes = vdaf.encode_prep_share(&prep_share);
        let decoded = vdaf.decode_prep_share(&bytes).unwrap();
        assert_eq!(prep_share.verifier_share, decoded.verifier_share);
        assert_eq!(
            prep_share.k_joint_rand_share.map(|s| s.0),
            decoded.k_joint_rand_share.map(|s| s.0)
        );
    }

    #[test]
    fn test_wire_roundtrip_aggregate_share() {
        let vdaf = Prio3::new(2, Count).unwrap();
        let share = vec![Field64::from_u128(3)];
        let bytes = Prio3::<Count>::encode_aggregate_share(&share);
        let decoded = vdaf.decode_aggregate_share(&bytes).unwrap();
        assert_eq!(share, decoded);
    }

    #[test]
    fn test_new_rejects_out_of_range_shares() {
        assert!(Prio3::new(1, Count).is_err());
        assert!(Prio3::new(255, Count).is_err());
    }

    #[test]
    fn test_aggregate_rejects_length_mismatch() {
        let vdaf = Prio3::new(2, Sum::new(8).unwrap()).unwrap();
        let mut agg_share = vec![Field128::ZERO; 1];
        let bad_out_share = vec![Field128::ZERO; 2];
        assert!(vdaf.aggregate(&mut agg_share, &bad_out_share).is_err());
    }
}
