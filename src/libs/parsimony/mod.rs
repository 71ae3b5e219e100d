//! Rectilinear small-parsimony over breakpoint profiles.
//!
//! A tree under optimization lives in a `StableDiGraph` whose vertex indices
//! survive the edge surgery performed by NNI moves. Each vertex carries the
//! per-dimension interval `[start, end]` of subtree-optimal integer labels,
//! a cumulative score, and the `visited` flag driving incremental rescoring.

pub mod labeling;
pub mod nni;
pub mod sankoff;

use crate::libs::phylo::Tree;
use crate::libs::profile::{BreakpointProfile, GenomicBin};
use anyhow::bail;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::collections::BTreeMap;

/// Vertex payload for the scoring tree.
///
/// `start`/`end` hold the interval vector once the vertex has been scored
/// (for leaves, the degenerate point interval of the observed profile).
#[derive(Debug, Clone, Default)]
pub struct RectVertex {
    pub name: String,
    pub start: Option<Vec<i32>>,
    pub end: Option<Vec<i32>>,
    /// Cumulative subtree parsimony cost; meaningful only when `visited`
    pub score: i64,
    pub visited: bool,
}

pub type RectTree = StableDiGraph<RectVertex, ()>;

/// Vertex payload for an ancestrally labeled tree.
#[derive(Debug, Clone)]
pub struct LabeledVertex {
    pub name: String,
    pub profile: BreakpointProfile,
    /// L1 distance to the parent's profile; `None` at the root
    pub in_branch_length: Option<i64>,
}

pub type LabeledTree = StableDiGraph<LabeledVertex, ()>;

pub fn successors(t: &RectTree, v: NodeIndex) -> Vec<NodeIndex> {
    t.neighbors_directed(v, Direction::Outgoing).collect()
}

pub fn is_leaf(t: &RectTree, v: NodeIndex) -> bool {
    t.neighbors_directed(v, Direction::Outgoing).next().is_none()
}

/// Build a scoring tree from a parsed Newick tree and per-leaf breakpoint
/// profiles.
///
/// Each leaf must be named and carry a profile; all profiles must share one
/// bin sequence. Returns the graph, its root, and the shared bins.
pub fn attach_profiles(
    tree: &Tree,
    profiles: &BTreeMap<String, BreakpointProfile>,
) -> anyhow::Result<(RectTree, NodeIndex, Vec<GenomicBin>)> {
    let Some(phylo_root) = tree.get_root() else {
        bail!("cannot score an empty tree");
    };

    let mut t = RectTree::default();
    let mut bins: Option<Vec<GenomicBin>> = None;

    // (phylo node, parent in the new graph)
    let mut stack: Vec<(usize, Option<NodeIndex>)> = vec![(phylo_root, None)];
    let mut root = None;

    while let Some((id, parent)) = stack.pop() {
        let node = tree
            .get_node(id)
            .ok_or_else(|| anyhow::anyhow!("dangling node id {}", id))?;
        let name = node.name.clone().unwrap_or_default();

        let mut data = RectVertex {
            name: name.clone(),
            ..Default::default()
        };

        if node.is_leaf() {
            if name.is_empty() {
                bail!("leaves must be named to match them with profiles");
            }
            let Some(profile) = profiles.get(&name) else {
                bail!("no profile for leaf '{}'", name);
            };
            match &bins {
                None => bins = Some(profile.bins.clone()),
                Some(reference) => {
                    if *reference != profile.bins {
                        bail!("leaf '{}' has a different bin sequence", name);
                    }
                }
            }
            data.start = Some(profile.profile.clone());
            data.end = Some(profile.profile.clone());
        }

        let idx = t.add_node(data);
        match parent {
            Some(p) => {
                t.add_edge(p, idx, ());
            }
            None => root = Some(idx),
        }

        for &child in node.children.iter().rev() {
            stack.push((child, Some(idx)));
        }
    }

    let Some(bins) = bins else {
        bail!("tree has no leaves");
    };

    Ok((t, root.unwrap(), bins))
}

/// Convert a scoring tree back to the arena representation for Newick output.
pub fn to_phylo_tree(t: &RectTree, root: NodeIndex) -> Tree {
    let mut tree = Tree::new();

    let mut stack: Vec<(NodeIndex, Option<usize>)> = vec![(root, None)];
    while let Some((idx, parent)) = stack.pop() {
        let id = tree.add_node();
        if !t[idx].name.is_empty() {
            tree.get_node_mut(id).unwrap().set_name(&t[idx].name);
        }
        match parent {
            Some(p) => {
                // `id` was created above, the arena accepts it.
                tree.add_child(p, id).unwrap();
            }
            None => tree.set_root(id),
        }

        // graph successor order is reversed relative to insertion
        for child in t.neighbors_directed(idx, Direction::Outgoing) {
            stack.push((child, Some(id)));
        }
    }

    tree
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::libs::profile::GenomicBin;

    /// One bin per value; handy for interval-DP tests.
    pub fn bp(values: &[i32]) -> BreakpointProfile {
        let bins = (0..values.len())
            .map(|i| GenomicBin::new("chr1", "a", 10 * i as i32, 10 * (i + 1) as i32))
            .collect();
        BreakpointProfile {
            bins,
            profile: values.to_vec(),
        }
    }

    pub fn build(
        newick: &str,
        leaf_profiles: &[(&str, &[i32])],
    ) -> (RectTree, NodeIndex, Vec<GenomicBin>) {
        let tree = Tree::from_newick(newick).unwrap();
        let profiles: BTreeMap<String, BreakpointProfile> = leaf_profiles
            .iter()
            .map(|(name, values)| (name.to_string(), bp(values)))
            .collect();
        attach_profiles(&tree, &profiles).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::build;
    use super::*;

    #[test]
    fn test_attach_profiles() {
        let (t, root, bins) = build("((A,B)X,C)R;", &[("A", &[0]), ("B", &[2]), ("C", &[1])]);

        assert_eq!(t.node_count(), 5);
        assert_eq!(t.edge_count(), 4);
        assert_eq!(bins.len(), 1);
        assert_eq!(t[root].name, "R");
        assert!(t[root].start.is_none());

        let leaves: Vec<_> = t
            .node_indices()
            .filter(|&v| is_leaf(&t, v))
            .map(|v| t[v].name.clone())
            .collect();
        assert_eq!(leaves.len(), 3);
        for v in t.node_indices().filter(|&v| is_leaf(&t, v)) {
            assert_eq!(t[v].start, t[v].end);
        }
    }

    #[test]
    fn test_attach_profiles_missing_leaf() {
        let tree = Tree::from_newick("(A,B);").unwrap();
        let profiles: BTreeMap<String, BreakpointProfile> =
            [("A".to_string(), test_support::bp(&[0]))].into();
        assert!(attach_profiles(&tree, &profiles).is_err());
    }

    #[test]
    fn test_attach_profiles_mismatched_bins() {
        let tree = Tree::from_newick("(A,B);").unwrap();
        let mut profiles: BTreeMap<String, BreakpointProfile> = BTreeMap::new();
        profiles.insert("A".to_string(), test_support::bp(&[0]));
        let mut other = test_support::bp(&[0]);
        other.bins[0].chromosome = "chr2".to_string();
        profiles.insert("B".to_string(), other);
        assert!(attach_profiles(&tree, &profiles).is_err());
    }

    #[test]
    fn test_round_trip_to_phylo() {
        let (t, root, _) = build("((A,B)X,C)R;", &[("A", &[0]), ("B", &[2]), ("C", &[1])]);
        let tree = to_phylo_tree(&t, root);
        assert_eq!(tree.to_newick(), "((A,B)X,C)R;");
    }
}
