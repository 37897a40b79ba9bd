//! Dense unitary construction for small circuits.
//!
//! These are free functions over an immutable [`Circuit`]; they are used to
//! check that a twirled circuit implements the same operator as the original
//! once its Pauli frame is undone.

use num_complex::Complex64;

use trex_ir::Circuit;

use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;

/// Widest circuit for which a dense unitary is built (4^n entries).
pub const MAX_UNITARY_QUBITS: usize = 12;

/// A dense `2^n × 2^n` matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Unitary {
    dim: usize,
    entries: Vec<Complex64>,
}

impl Unitary {
    /// Matrix dimension (`2^n`).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.entries[row * self.dim + col]
    }

    /// The conjugate transpose.
    pub fn adjoint(&self) -> Unitary {
        let mut entries = vec![Complex64::new(0.0, 0.0); self.entries.len()];
        for row in 0..self.dim {
            for col in 0..self.dim {
                entries[col * self.dim + row] = self.get(row, col).conj();
            }
        }
        Unitary {
            dim: self.dim,
            entries,
        }
    }
}

/// Build the unitary implemented by the gates of `circuit`.
///
/// Measurements and barriers are ignored. Column `c` is the image of the
/// basis state `|c⟩`.
pub fn circuit_unitary(circuit: &Circuit) -> SimResult<Unitary> {
    let num_qubits = circuit.num_qubits();
    if num_qubits > MAX_UNITARY_QUBITS {
        return Err(SimError::TooManyQubits {
            num_qubits,
            max_qubits: MAX_UNITARY_QUBITS,
        });
    }

    let dim = 1 << num_qubits;
    let mut entries = vec![Complex64::new(0.0, 0.0); dim * dim];
    for col in 0..dim {
        let mut sv = Statevector::basis(num_qubits, col);
        for inst in circuit.instructions() {
            sv.apply(inst);
        }
        for (row, amp) in sv.amplitudes().iter().enumerate() {
            entries[row * dim + col] = *amp;
        }
    }

    Ok(Unitary { dim, entries })
}

/// `|Tr(U·V†)|`. Equals the dimension exactly when `U` and `V` agree up to a
/// global phase.
pub fn trace_overlap(u: &Unitary, v: &Unitary) -> SimResult<f64> {
    if u.dim != v.dim {
        return Err(SimError::DimensionMismatch {
            left: u.dim,
            right: v.dim,
        });
    }
    // Tr(U V†) = Σ_ij U_ij · conj(V_ij)
    let trace: Complex64 = u
        .entries
        .iter()
        .zip(&v.entries)
        .map(|(a, b)| a * b.conj())
        .sum();
    Ok(trace.norm())
}
