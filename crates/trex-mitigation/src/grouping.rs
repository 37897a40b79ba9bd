//! Grouping of Pauli strings into shared measurement settings.
//!
//! Strings that qubit-wise commute can be estimated from the same basis
//! measurement. The conflict graph has an edge between every pair that does
//! not commute qubit-wise; a greedy colouring of that graph (largest degree
//! first) gives the groups.

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use trex_ir::{PauliOp, PauliString};

use crate::error::{MitigationError, MitigationResult};

/// Pauli strings measurable with one basis setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PauliGroup {
    /// Positions of the members in the input slice, ascending.
    pub members: Vec<usize>,
    /// The member strings, in the same order as `members`.
    pub paulis: Vec<PauliString>,
}

impl PauliGroup {
    /// The merged basis: per position the members' non-identity label, or
    /// `I` if every member is the identity there.
    pub fn measurement_basis(&self) -> PauliString {
        let width = self.paulis.first().map_or(0, PauliString::len);
        PauliString::from_ops((0..width).map(|j| {
            self.paulis
                .iter()
                .map(|p| p[j])
                .find(|&op| op != PauliOp::I)
                .unwrap_or(PauliOp::I)
        }))
    }
}

/// Partition `paulis` into qubit-wise commuting groups.
///
/// Groups are ordered by colour, i.e. the group holding the highest-degree
/// string comes first. All strings must have the same width.
pub fn group_qubit_wise_commuting(paulis: &[PauliString]) -> MitigationResult<Vec<PauliGroup>> {
    if let Some(first) = paulis.first() {
        if let Some(bad) = paulis.iter().find(|p| p.len() != first.len()) {
            return Err(MitigationError::shape(
                "pauli strings for grouping",
                first.len(),
                bad.len(),
            ));
        }
    }

    let mut graph: UnGraph<usize, ()> = UnGraph::with_capacity(paulis.len(), 0);
    let nodes: Vec<NodeIndex> = (0..paulis.len()).map(|i| graph.add_node(i)).collect();
    for i in 0..paulis.len() {
        for j in (i + 1)..paulis.len() {
            if !paulis[i].qubit_wise_commutes(&paulis[j]) {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }

    let mut order = nodes.clone();
    order.sort_by_key(|&n| std::cmp::Reverse(graph.neighbors(n).count()));

    let mut colour: Vec<Option<usize>> = vec![None; paulis.len()];
    let mut num_colours = 0;
    for node in order {
        let taken: Vec<usize> = graph
            .neighbors(node)
            .filter_map(|m| colour[graph[m]])
            .collect();
        let c = (0..).find(|c| !taken.contains(c)).unwrap_or(num_colours);
        colour[graph[node]] = Some(c);
        num_colours = num_colours.max(c + 1);
    }

    let mut groups: Vec<PauliGroup> = (0..num_colours)
        .map(|_| PauliGroup {
            members: vec![],
            paulis: vec![],
        })
        .collect();
    for (i, c) in colour.into_iter().enumerate() {
        if let Some(c) = c {
            groups[c].members.push(i);
            groups[c].paulis.push(paulis[i].clone());
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paulis(labels: &[&str]) -> Vec<PauliString> {
        labels.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_commuting_strings_share_a_group() {
        let input = paulis(&["ZI", "IZ", "ZZ"]);
        let groups = group_qubit_wise_commuting(&input).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 1, 2]);
        assert_eq!(groups[0].measurement_basis().to_string(), "ZZ");
    }

    #[test]
    fn test_conflicting_strings_split() {
        let input = paulis(&["ZZ", "XX", "ZI", "IX"]);
        let groups = group_qubit_wise_commuting(&input).unwrap();
        assert_eq!(groups.len(), 2);

        for group in &groups {
            for (a, pa) in group.paulis.iter().enumerate() {
                for pb in &group.paulis[a + 1..] {
                    assert!(pa.qubit_wise_commutes(pb));
                }
            }
        }
        let mut all: Vec<usize> = groups.iter().flat_map(|g| g.members.clone()).collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_measurement_basis_merges_labels() {
        let group = PauliGroup {
            members: vec![0, 1],
            paulis: paulis(&["XII", "IIY"]),
        };
        assert_eq!(group.measurement_basis().to_string(), "XIY");
    }

    #[test]
    fn test_width_mismatch() {
        assert!(matches!(
            group_qubit_wise_commuting(&paulis(&["ZZ", "Z"])),
            Err(MitigationError::ShapeMismatch { expected: 2, got: 1, .. })
        ));
        assert!(group_qubit_wise_commuting(&[]).unwrap().is_empty());
    }
}
