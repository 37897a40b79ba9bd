//! Weighted distributions over fixed-width bitstrings.
//!
//! The same type carries raw counts, probability distributions and signed
//! quasi-distributions. Character `j` of every key is measured bit `j`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trex_hal::Counts;

use crate::error::{MitigationError, MitigationResult};
use crate::mask::FlipMask;

/// A map from equal-width bitstrings to real weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Distribution {
    width: usize,
    weights: BTreeMap<String, f64>,
}

impl Distribution {
    /// An empty distribution over `width`-bit keys.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            weights: BTreeMap::new(),
        }
    }

    /// Unit mass on a single key.
    pub fn point(key: &str) -> MitigationResult<Self> {
        Self::from_weights([(key, 1.0)])
    }

    /// Build from `(key, weight)` pairs. Repeated keys accumulate.
    ///
    /// The width is taken from the first key; an empty input yields an empty
    /// width-0 distribution.
    pub fn from_weights<K: AsRef<str>>(
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> MitigationResult<Self> {
        let mut dist: Option<Distribution> = None;
        for (key, weight) in pairs {
            let key = key.as_ref();
            check_bitstring(key)?;
            let dist = dist.get_or_insert_with(|| Distribution::new(key.len()));
            if key.len() != dist.width {
                return Err(MitigationError::shape(
                    format!("distribution key '{key}'"),
                    dist.width,
                    key.len(),
                ));
            }
            dist.accumulate(key.to_string(), weight);
        }
        Ok(dist.unwrap_or_default())
    }

    /// Convert measured counts to weights.
    pub fn from_counts(counts: &Counts) -> MitigationResult<Self> {
        Self::from_weights(counts.iter().map(|(k, &v)| (k, v as f64)))
    }

    /// Key width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight of a key (0 if absent).
    pub fn get(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    /// Iterate over keys in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Sum of absolute weights (the 1-norm).
    pub fn one_norm(&self) -> f64 {
        self.weights.values().map(|v| v.abs()).sum()
    }

    /// Add `weight` to `key`. The key must already be a valid bitstring of
    /// this width.
    pub(crate) fn accumulate(&mut self, key: String, weight: f64) {
        debug_assert_eq!(key.len(), self.width);
        *self.weights.entry(key).or_insert(0.0) += weight;
    }

    /// Scale so the weights sum to one.
    pub fn normalized(&self) -> MitigationResult<Self> {
        let total = self.total();
        if total == 0.0 || !total.is_finite() {
            return Err(MitigationError::EmptyDistribution);
        }
        Ok(Self {
            width: self.width,
            weights: self
                .weights
                .iter()
                .map(|(k, v)| (k.clone(), v / total))
                .collect(),
        })
    }

    /// XOR every key with a flip mask.
    pub fn xor_mask(&self, mask: &FlipMask) -> MitigationResult<Self> {
        if mask.width() != self.width {
            return Err(MitigationError::shape(
                "twirl mask width",
                self.width,
                mask.width(),
            ));
        }
        let mut out = Distribution::new(self.width);
        for (key, weight) in self.iter() {
            out.accumulate(mask.apply(key)?, weight);
        }
        Ok(out)
    }

    /// Sum out every bit except `positions`, keeping them in the given order.
    pub fn marginal(&self, positions: &[usize]) -> MitigationResult<Self> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.width) {
            return Err(MitigationError::shape(
                "marginal position",
                self.width,
                bad,
            ));
        }
        let mut out = Distribution::new(positions.len());
        for (key, weight) in self.iter() {
            let bytes = key.as_bytes();
            let sub: String = positions.iter().map(|&p| bytes[p] as char).collect();
            out.accumulate(sub, weight);
        }
        Ok(out)
    }

    /// Total weight on keys whose bit `position` is '0'.
    pub fn bit_zero_probability(&self, position: usize) -> f64 {
        self.iter()
            .filter(|(key, _)| key.as_bytes().get(position) == Some(&b'0'))
            .map(|(_, weight)| weight)
            .sum()
    }

    /// XOR-convolution: every pair of keys contributes the product of their
    /// weights to the bucket keyed by their bitwise XOR.
    pub fn xor_convolve(&self, other: &Distribution) -> MitigationResult<Self> {
        if self.width != other.width {
            return Err(MitigationError::shape(
                "xor convolution",
                self.width,
                other.width,
            ));
        }
        let mut out = Distribution::new(self.width);
        for (a, va) in self.iter() {
            for (b, vb) in other.iter() {
                out.accumulate(xor_keys(a, b), va * vb);
            }
        }
        Ok(out)
    }

    /// `Σ w·(-1)^popcount(key)`: the Z-parity expectation over all bits.
    pub fn parity_expectation(&self) -> f64 {
        self.iter()
            .map(|(key, weight)| {
                if key.bytes().filter(|&b| b == b'1').count() % 2 == 0 {
                    weight
                } else {
                    -weight
                }
            })
            .sum()
    }
}

impl TryFrom<BTreeMap<String, f64>> for Distribution {
    type Error = MitigationError;

    fn try_from(map: BTreeMap<String, f64>) -> MitigationResult<Self> {
        Self::from_weights(map)
    }
}

impl From<Distribution> for BTreeMap<String, f64> {
    fn from(dist: Distribution) -> Self {
        dist.weights
    }
}

fn check_bitstring(key: &str) -> MitigationResult<()> {
    if key.bytes().all(|b| b == b'0' || b == b'1') {
        Ok(())
    } else {
        Err(MitigationError::InvalidBitstring(key.to_string()))
    }
}

fn xor_keys(a: &str, b: &str) -> String {
    a.bytes()
        .zip(b.bytes())
        .map(|(x, y)| if x == y { '0' } else { '1' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(pairs: &[(&str, f64)]) -> Distribution {
        Distribution::from_weights(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_from_weights_accumulates() {
        let d = dist(&[("01", 1.0), ("01", 2.0), ("10", 1.0)]);
        assert_eq!(d.width(), 2);
        assert_eq!(d.get("01"), 3.0);
        assert_eq!(d.get("11"), 0.0);
        assert_eq!(d.total(), 4.0);
    }

    #[test]
    fn test_rejects_mixed_widths() {
        let err = Distribution::from_weights([("01", 1.0), ("011", 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            MitigationError::ShapeMismatch {
                expected: 2,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_non_binary_key() {
        assert!(matches!(
            Distribution::from_weights([("0a", 1.0)]),
            Err(MitigationError::InvalidBitstring(_))
        ));
    }

    #[test]
    fn test_normalized() {
        let d = dist(&[("0", 3.0), ("1", 1.0)]).normalized().unwrap();
        assert!((d.get("0") - 0.75).abs() < 1e-12);
        assert!(matches!(
            Distribution::new(2).normalized(),
            Err(MitigationError::EmptyDistribution)
        ));
    }

    #[test]
    fn test_marginal_keeps_requested_order() {
        let d = dist(&[("011", 0.5), ("110", 0.25), ("000", 0.25)]);
        let m = d.marginal(&[0, 2]).unwrap();
        assert_eq!(m.width(), 2);
        assert_eq!(m.get("01"), 0.5);
        assert_eq!(m.get("10"), 0.25);
        assert_eq!(m.get("00"), 0.25);

        assert!(d.marginal(&[3]).is_err());
    }

    #[test]
    fn test_bit_zero_probability() {
        let d = dist(&[("00", 0.6), ("10", 0.3), ("11", 0.1)]);
        assert!((d.bit_zero_probability(0) - 0.6).abs() < 1e-12);
        assert!((d.bit_zero_probability(1) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_xor_convolve_with_delta_zero() {
        let d = dist(&[("01", 0.7), ("11", 0.3)]);
        let delta = Distribution::point("00").unwrap();
        assert_eq!(d.xor_convolve(&delta).unwrap(), d);
    }

    #[test]
    fn test_xor_convolve_buckets() {
        let a = dist(&[("0", 0.9), ("1", 0.1)]);
        let b = dist(&[("0", 0.8), ("1", 0.2)]);
        let c = a.xor_convolve(&b).unwrap();
        assert!((c.get("0") - (0.72 + 0.02)).abs() < 1e-12);
        assert!((c.get("1") - (0.18 + 0.08)).abs() < 1e-12);
    }

    #[test]
    fn test_parity_expectation() {
        let d = dist(&[("00", 0.5), ("01", 0.25), ("11", 0.25)]);
        assert!((d.parity_expectation() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let d = dist(&[("01", 0.5), ("10", 0.5)]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(serde_json::from_str::<Distribution>(&json).unwrap(), d);
        assert!(serde_json::from_str::<Distribution>(r#"{"0":1.0,"01":1.0}"#).is_err());
    }
}
