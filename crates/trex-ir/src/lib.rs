//! TREX Circuit Intermediate Representation
//!
//! This crate provides the circuit and Pauli-string types the readout
//! mitigation stack operates on. Circuits are flat, validated instruction
//! lists; twirling only ever appends single-qubit Pauli layers in front of
//! the measurements, so no DAG is needed.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use trex_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Bit ordering
//!
//! Qubit `j` maps to character `j` of measured bitstrings and of
//! [`PauliString`]s (leftmost character is qubit 0).
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I`, `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H` | 1 | Hadamard gate |
//! | `S`, `Sdg` | 1 | S and S-dagger gates |
//! | `SX` | 1 | sqrt(X) |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `CX`, `CZ` | 2 | Controlled-X and Controlled-Z |
//! | `Swap`, `ISwap` | 2 | SWAP and iSWAP |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod pauli;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use pauli::{PauliOp, PauliString};
pub use qubit::QubitId;
