//! Property-based tests for circuit construction.

use proptest::prelude::*;
use trex_ir::{Circuit, Instruction, PauliOp, PauliString, QubitId, StandardGate};

/// Gate operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Rz(u32, f64),
    CX(u32, u32),
}

impl GateOp {
    fn apply(self, circuit: &mut Circuit) {
        // Invalid draws (e.g. CX with equal qubits) are rejected by the builder.
        let _ = match self {
            GateOp::H(q) => circuit.h(QubitId(q)).map(|_| ()),
            GateOp::X(q) => circuit.x(QubitId(q)).map(|_| ()),
            GateOp::Rz(q, theta) => circuit.rz(theta, QubitId(q)).map(|_| ()),
            GateOp::CX(a, b) => circuit.cx(QubitId(a), QubitId(b)).map(|_| ()),
        };
    }
}

fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    prop_oneof![
        (0..num_qubits).prop_map(GateOp::H),
        (0..num_qubits).prop_map(GateOp::X),
        (0..num_qubits, -3.0_f64..3.0).prop_map(|(q, t)| GateOp::Rz(q, t)),
        (0..num_qubits, 0..num_qubits).prop_map(|(a, b)| GateOp::CX(a, b)),
    ]
}

fn arb_measured_circuit() -> impl Strategy<Value = Circuit> {
    (1_u32..=5).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 0..=12).prop_map(move |ops| {
            let mut circuit = Circuit::with_size("prop", num_qubits);
            for op in ops {
                op.apply(&mut circuit);
            }
            circuit.measure_all().unwrap();
            circuit
        })
    })
}

proptest! {
    #[test]
    fn depth_never_exceeds_instruction_count(circuit in arb_measured_circuit()) {
        prop_assert!(circuit.depth() <= circuit.instructions().len());
    }

    #[test]
    fn inserted_layer_stays_in_front_of_measurement(circuit in arb_measured_circuit()) {
        let mut twirled = circuit.clone();
        let layer: Vec<_> = circuit
            .qubits()
            .map(|q| Instruction::single_qubit_gate(StandardGate::X, q))
            .collect();
        twirled.insert_before_measurements(layer).unwrap();

        prop_assert_eq!(twirled.num_ops(), circuit.num_ops() + circuit.num_qubits());
        prop_assert!(twirled.instructions().last().unwrap().is_measure());
    }

    #[test]
    fn pauli_text_is_stable(labels in prop::collection::vec(0_usize..4, 0..16)) {
        let p = PauliString::from_ops(labels.iter().map(|&i| PauliOp::ALL[i]));
        let parsed: PauliString = p.to_string().parse().unwrap();
        prop_assert_eq!(parsed, p);
    }
}
