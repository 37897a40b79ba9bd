//! Readout twirling.
//!
//! A twirl draws one uniformly random Pauli per measured qubit and applies it
//! just before measurement. X and Y flip the recorded bit, I and Z do not, so
//! un-twirling a result is an XOR with the binary reduction of the labels.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trex_ir::{Circuit, Instruction, PauliOp, PauliString, QubitId};

use crate::error::{MitigationError, MitigationResult};
use crate::mask::FlipMask;

/// Draw `width` independent uniform Pauli labels.
pub fn random_mask<R: Rng>(width: usize, rng: &mut R) -> PauliString {
    PauliString::from_ops((0..width).map(|_| PauliOp::ALL[rng.gen_range(0..PauliOp::ALL.len())]))
}

/// A circuit with a random Pauli layer inserted before its measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwirledCircuit {
    /// The twirled circuit.
    pub circuit: Circuit,
    /// Twirled qubits, ascending.
    pub qubits: Vec<QubitId>,
    /// One label per twirled qubit, same order as `qubits`.
    pub mask: PauliString,
}

impl TwirledCircuit {
    /// The binary flip mask used to un-twirl results.
    pub fn flip_mask(&self) -> FlipMask {
        FlipMask::from_paulis(&self.mask)
    }

    /// The Pauli layer that undoes the twirl.
    ///
    /// Every Pauli is its own inverse, so this is the twirl layer itself.
    pub fn frame_correction(&self) -> Vec<Instruction> {
        pauli_layer(&self.qubits, &self.mask)
    }
}

fn pauli_layer(qubits: &[QubitId], mask: &PauliString) -> Vec<Instruction> {
    qubits
        .iter()
        .zip(mask.ops())
        .filter_map(|(&q, op)| op.as_gate().map(|g| Instruction::single_qubit_gate(g, q)))
        .collect()
}

/// Twirl `qubits` of `circuit` with a fresh random mask.
///
/// The qubit list is sorted and deduplicated first; identity labels emit no
/// gate. An empty list gives an empty mask and an unchanged circuit.
pub fn twirl_circuit<R: Rng>(
    circuit: &Circuit,
    qubits: &[QubitId],
    rng: &mut R,
) -> MitigationResult<TwirledCircuit> {
    let mut qubits = qubits.to_vec();
    qubits.sort_unstable();
    qubits.dedup();

    let mask = random_mask(qubits.len(), rng);
    let mut twirled = circuit.clone();
    twirled.insert_before_measurements(pauli_layer(&qubits, &mask))?;

    Ok(TwirledCircuit {
        circuit: twirled,
        qubits,
        mask,
    })
}

/// What to twirl: one circuit or a batch of them.
#[derive(Debug, Clone, PartialEq)]
pub enum TwirlTarget {
    /// A single circuit.
    Single(Circuit),
    /// Several independent circuits.
    Batch(Vec<Circuit>),
}

impl TwirlTarget {
    /// Interpret a JSON document: an object is one circuit, an array is a batch.
    pub fn from_json(value: serde_json::Value) -> MitigationResult<Self> {
        match value {
            serde_json::Value::Object(_) => Ok(TwirlTarget::Single(Circuit::from_value(value)?)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(_) => Ok(Circuit::from_value(item)?),
                    other => Err(MitigationError::UnsupportedContainer(
                        json_type_name(&other).to_string(),
                    )),
                })
                .collect::<MitigationResult<Vec<_>>>()
                .map(TwirlTarget::Batch),
            other => Err(MitigationError::UnsupportedContainer(
                json_type_name(&other).to_string(),
            )),
        }
    }

    /// Number of circuits in the target.
    pub fn len(&self) -> usize {
        match self {
            TwirlTarget::Single(_) => 1,
            TwirlTarget::Batch(circuits) => circuits.len(),
        }
    }

    /// True for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Twirled variants, shaped like the [`TwirlTarget`] they came from.
///
/// Serialized as `{"kind": "single" | "batch", "samples": [...]}` so that an
/// empty batch keeps its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "samples", rename_all = "lowercase")]
pub enum TwirlOutput {
    /// Samples of a single circuit.
    Single(Vec<TwirledCircuit>),
    /// Samples per circuit of a batch.
    Batch(Vec<Vec<TwirledCircuit>>),
}

/// Draw `num_samples` independent twirls of every circuit in `target`,
/// each over all of that circuit's qubits.
pub fn apply_readout_twirl<R: Rng>(
    target: &TwirlTarget,
    num_samples: usize,
    rng: &mut R,
) -> MitigationResult<TwirlOutput> {
    let mut sample = |circuit: &Circuit| -> MitigationResult<Vec<TwirledCircuit>> {
        let qubits: Vec<_> = circuit.qubits().collect();
        (0..num_samples)
            .map(|_| twirl_circuit(circuit, &qubits, &mut *rng))
            .collect()
    };

    let output = match target {
        TwirlTarget::Single(circuit) => TwirlOutput::Single(sample(circuit)?),
        TwirlTarget::Batch(circuits) => TwirlOutput::Batch(
            circuits
                .iter()
                .map(&mut sample)
                .collect::<MitigationResult<_>>()?,
        ),
    };
    debug!(circuits = target.len(), num_samples, "generated readout twirls");
    Ok(output)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
