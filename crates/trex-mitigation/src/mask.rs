//! Binary flip masks recorded by readout twirls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use trex_ir::{PauliOp, PauliString};

use crate::error::{MitigationError, MitigationResult};

/// Which measured bits a twirl flipped.
///
/// Bit `j` is set when the Pauli applied to qubit `j` was X or Y. Masks parse
/// from either raw twirl labels (`"IXYZ"`) or an already binary string
/// (`"0110"`); both spellings of the same twirl compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlipMask {
    bits: Vec<bool>,
}

impl FlipMask {
    /// The all-zero mask of the given width.
    pub fn zeros(width: usize) -> Self {
        Self {
            bits: vec![false; width],
        }
    }

    /// Build from explicit flip flags.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            bits: bits.into_iter().collect(),
        }
    }

    /// Reduce twirl labels to flip flags.
    pub fn from_paulis(paulis: &PauliString) -> Self {
        Self::from_bits(paulis.ops().iter().map(|op| op.flips_readout()))
    }

    /// Number of bits.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// The flip flags.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// True if no bit is flipped.
    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|b| !b)
    }

    /// XOR a bitstring with this mask.
    pub fn apply(&self, bitstring: &str) -> MitigationResult<String> {
        if bitstring.len() != self.width() {
            return Err(MitigationError::shape(
                format!("twirl mask applied to '{bitstring}'"),
                self.width(),
                bitstring.len(),
            ));
        }
        bitstring
            .chars()
            .zip(&self.bits)
            .map(|(c, &flip)| match (c, flip) {
                ('0', false) | ('1', true) => Ok('0'),
                ('1', false) | ('0', true) => Ok('1'),
                _ => Err(MitigationError::InvalidBitstring(bitstring.to_string())),
            })
            .collect()
    }
}

impl From<&PauliString> for FlipMask {
    fn from(paulis: &PauliString) -> Self {
        Self::from_paulis(paulis)
    }
}

impl FromStr for FlipMask {
    type Err = MitigationError;

    fn from_str(s: &str) -> MitigationResult<Self> {
        s.chars()
            .enumerate()
            .map(|(position, label)| match label {
                '0' => Ok(false),
                '1' => Ok(true),
                other => PauliOp::from_char(other)
                    .map(PauliOp::flips_readout)
                    .ok_or(MitigationError::InvalidMaskLabel { label, position }),
            })
            .collect::<MitigationResult<Vec<_>>>()
            .map(|bits| Self { bits })
    }
}

impl fmt::Display for FlipMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl Serialize for FlipMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FlipMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
