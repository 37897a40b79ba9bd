//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::Instruction;
use crate::qubit::QubitId;

/// A quantum circuit.
///
/// Instructions are kept in program order. Every instruction is validated
/// against the circuit width when it is applied, so a `Circuit` obtained
/// through the builder or [`Circuit::from_json`] is always well formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCircuit")]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Instructions in program order.
    #[serde(default)]
    instructions: Vec<Instruction>,
}

/// Wire form of a [`Circuit`] before its instructions are validated.
#[derive(Deserialize)]
struct RawCircuit {
    name: String,
    num_qubits: u32,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

impl TryFrom<RawCircuit> for Circuit {
    type Error = IrError;

    fn try_from(raw: RawCircuit) -> IrResult<Self> {
        let mut circuit = Circuit::with_size(raw.name, raw.num_qubits);
        for inst in raw.instructions {
            circuit.apply(inst)?;
        }
        Ok(circuit)
    }
}

impl Circuit {
    /// Create a circuit with a given number of qubits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            instructions: vec![],
        }
    }

    /// Name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// All qubits in ascending order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> {
        (0..self.num_qubits).map(QubitId)
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of gate operations (measurements and barriers excluded).
    pub fn num_ops(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_gate()).count()
    }

    /// Check whether the circuit contains any measurement.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// Circuit depth counting gates and measurements (barriers synchronize
    /// their qubits but add no layer).
    pub fn depth(&self) -> usize {
        let mut layer = vec![0_usize; self.num_qubits()];
        for inst in &self.instructions {
            let current = inst
                .qubits
                .iter()
                .map(|q| layer[q.index()])
                .max()
                .unwrap_or(0);
            let next = if inst.is_gate() || inst.is_measure() {
                current + 1
            } else {
                current
            };
            for q in &inst.qubits {
                layer[q.index()] = next;
            }
        }
        layer.into_iter().max().unwrap_or(0)
    }

    /// Append a validated instruction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.validate(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = instruction.as_gate().map(|g| g.name().to_string());
        if let Some(gate) = instruction.as_gate() {
            let got = instruction.qubits.len() as u32;
            if got != gate.num_qubits() {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_qubits(),
                    got,
                });
            }
        }
        for (i, q) in instruction.qubits.iter().enumerate() {
            if q.0 >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit: *q,
                    num_qubits: self.num_qubits,
                    gate_name,
                });
            }
            if instruction.qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: *q,
                    gate_name,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Sdg, qubit))
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply iSWAP gate.
    pub fn iswap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::ISwap, q1, q2))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure every qubit.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = self.qubits().collect();
        self.apply(Instruction::measure(qubits))
    }

    /// Insert instructions immediately before the first measurement, or
    /// append them when the circuit has no measurement.
    pub fn insert_before_measurements(
        &mut self,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> IrResult<&mut Self> {
        let instructions: Vec<_> = instructions.into_iter().collect();
        for inst in &instructions {
            self.validate(inst)?;
        }
        let at = self
            .instructions
            .iter()
            .position(Instruction::is_measure)
            .unwrap_or(self.instructions.len());
        self.instructions.splice(at..at, instructions);
        Ok(self)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize to JSON.
    pub fn to_json(&self) -> IrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from a JSON value, re-validating every instruction.
    pub fn from_value(value: serde_json::Value) -> IrResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Deserialize from JSON text, re-validating every instruction.
    pub fn from_json(json: &str) -> IrResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    // =========================================================================
    // Standard circuits
    // =========================================================================

    /// Bell state preparation with measurement.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Circuit::with_size("bell", 2);
        circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?;
        circuit.measure_all()?;
        Ok(circuit)
    }

    /// GHZ state preparation with measurement.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Circuit::with_size(format!("ghz_{n}"), n);
        if n > 0 {
            circuit.h(QubitId(0))?;
            for i in 1..n {
                circuit.cx(QubitId(i - 1), QubitId(i))?;
            }
        }
        circuit.measure_all()?;
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_circuit() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_ops(), 2);
        assert!(circuit.has_measurements());
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_barrier_adds_no_layer() {
        let mut circuit = Circuit::with_size("test", 2);
        circuit.h(QubitId(0)).unwrap();
        circuit
            .apply(Instruction::barrier([QubitId(0), QubitId(1)]))
            .unwrap();
        circuit.x(QubitId(1)).unwrap();
        assert_eq!(circuit.depth(), 2);
        assert_eq!(circuit.num_ops(), 2);
    }

    #[test]
    fn test_qubit_out_of_range() {
        let mut circuit = Circuit::with_size("test", 2);
        let err = circuit.h(QubitId(2)).unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { num_qubits: 2, .. }));
    }

    #[test]
    fn test_duplicate_qubit() {
        let mut circuit = Circuit::with_size("test", 2);
        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let mut circuit = Circuit::with_size("test", 3);
        let bad = Instruction::gate(StandardGate::CX, [QubitId(0)]);
        assert!(matches!(
            circuit.apply(bad),
            Err(IrError::QubitCountMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_insert_before_measurements() {
        let mut circuit = Circuit::bell().unwrap();
        circuit
            .insert_before_measurements([Instruction::single_qubit_gate(
                StandardGate::X,
                QubitId(1),
            )])
            .unwrap();
        let names: Vec<_> = circuit.instructions().iter().map(Instruction::name).collect();
        assert_eq!(names, vec!["h", "cx", "x", "measure"]);
    }

    #[test]
    fn test_insert_without_measurements_appends() {
        let mut circuit = Circuit::with_size("test", 1);
        circuit.h(QubitId(0)).unwrap();
        circuit
            .insert_before_measurements([Instruction::single_qubit_gate(
                StandardGate::Z,
                QubitId(0),
            )])
            .unwrap();
        assert_eq!(circuit.instructions().last().unwrap().name(), "z");
    }

    #[test]
    fn test_json_roundtrip_revalidates() {
        let circuit = Circuit::ghz(3).unwrap();
        let json = circuit.to_json().unwrap();
        assert_eq!(Circuit::from_json(&json).unwrap(), circuit);

        let bad = r#"{"name":"bad","num_qubits":1,"instructions":[
            {"kind":{"gate":{"gate":"cx"}},"qubits":[0,1]}]}"#;
        assert!(Circuit::from_json(bad).is_err());
    }

    #[test]
    fn test_serde_deserialize_validates() {
        let out_of_range = r#"{"name":"bad","num_qubits":1,"instructions":[
            {"kind":{"gate":{"gate":"x"}},"qubits":[3]}]}"#;
        assert!(serde_json::from_str::<Circuit>(out_of_range).is_err());

        let bell = Circuit::bell().unwrap();
        let json = serde_json::to_string(&bell).unwrap();
        assert_eq!(serde_json::from_str::<Circuit>(&json).unwrap(), bell);
    }
}
