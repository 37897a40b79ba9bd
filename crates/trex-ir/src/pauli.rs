//! Pauli labels and dense Pauli strings.
//!
//! A [`PauliString`] stores one label per measured qubit, in the same order
//! as measured bitstrings: character `j` acts on qubit `j`.
//!
//! ```rust
//! use trex_ir::{PauliOp, PauliString};
//!
//! let p: PauliString = "ZIXI".parse().unwrap();
//! assert_eq!(p.len(), 4);
//! assert_eq!(p.non_trivial_positions(), vec![0, 2]);
//! assert_eq!(p[2], PauliOp::X);
//! ```

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl PauliOp {
    /// All four labels, in the order used for uniform sampling.
    pub const ALL: [PauliOp; 4] = [PauliOp::I, PauliOp::X, PauliOp::Y, PauliOp::Z];

    /// Parse a label character (`I`, `X`, `Y`, `Z`, case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(PauliOp::I),
            'X' => Some(PauliOp::X),
            'Y' => Some(PauliOp::Y),
            'Z' => Some(PauliOp::Z),
            _ => None,
        }
    }

    /// The label character.
    pub fn as_char(self) -> char {
        match self {
            PauliOp::I => 'I',
            PauliOp::X => 'X',
            PauliOp::Y => 'Y',
            PauliOp::Z => 'Z',
        }
    }

    /// Whether applying this Pauli right before a Z-basis measurement flips
    /// the recorded bit.
    #[inline]
    pub fn flips_readout(self) -> bool {
        matches!(self, PauliOp::X | PauliOp::Y)
    }

    /// The gate implementing this Pauli, or `None` for the identity.
    pub fn as_gate(self) -> Option<StandardGate> {
        match self {
            PauliOp::I => None,
            PauliOp::X => Some(StandardGate::X),
            PauliOp::Y => Some(StandardGate::Y),
            PauliOp::Z => Some(StandardGate::Z),
        }
    }
}

impl fmt::Display for PauliOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A dense tensor product of Pauli operators, one per measured qubit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PauliString {
    ops: Vec<PauliOp>,
}

impl PauliString {
    /// Construct from explicit labels.
    pub fn from_ops(ops: impl IntoIterator<Item = PauliOp>) -> Self {
        Self {
            ops: ops.into_iter().collect(),
        }
    }

    /// The all-identity string of the given width.
    pub fn identity(width: usize) -> Self {
        Self {
            ops: vec![PauliOp::I; width],
        }
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True for a zero-width string.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Labels in position order.
    pub fn ops(&self) -> &[PauliOp] {
        &self.ops
    }

    /// True if every label is the identity.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| *op == PauliOp::I)
    }

    /// Positions whose label is not the identity, ascending.
    pub fn non_trivial_positions(&self) -> Vec<usize> {
        self.ops
            .iter()
            .enumerate()
            .filter(|(_, op)| **op != PauliOp::I)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of non-identity labels.
    pub fn weight(&self) -> usize {
        self.ops.iter().filter(|op| **op != PauliOp::I).count()
    }

    /// Qubit-wise commutation: at every position the labels are equal or at
    /// least one of them is the identity. Strings of different width never
    /// commute qubit-wise.
    pub fn qubit_wise_commutes(&self, other: &PauliString) -> bool {
        self.len() == other.len()
            && self
                .ops
                .iter()
                .zip(&other.ops)
                .all(|(a, b)| *a == PauliOp::I || *b == PauliOp::I || a == b)
    }
}

impl Index<usize> for PauliString {
    type Output = PauliOp;

    fn index(&self, index: usize) -> &PauliOp {
        &self.ops[index]
    }
}

impl FromStr for PauliString {
    type Err = IrError;

    fn from_str(s: &str) -> IrResult<Self> {
        s.chars()
            .enumerate()
            .map(|(position, label)| {
                PauliOp::from_char(label).ok_or(IrError::InvalidPauliLabel { label, position })
            })
            .collect::<IrResult<Vec<_>>>()
            .map(|ops| Self { ops })
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}", op.as_char())?;
        }
        Ok(())
    }
}

impl Serialize for PauliString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PauliString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
