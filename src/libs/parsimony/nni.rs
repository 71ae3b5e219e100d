use super::sankoff::{small_rectilinear, unvisit_all, unvisit_path};
use super::RectTree;
use anyhow::Result;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// One nearest-neighbor interchange: `w` is a child of `u` other than `v`,
/// `z` a child of `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NniMove {
    pub u: NodeIndex,
    pub w: NodeIndex,
    pub v: NodeIndex,
    pub z: NodeIndex,
}

fn remove_edge_between(t: &mut RectTree, a: NodeIndex, b: NodeIndex) {
    // the caller passes edges it enumerated from the live tree
    let edge = t.find_edge(a, b).expect("edge vanished from the tree");
    t.remove_edge(edge);
}

/// Swap the subtrees `w` and `z` across the internal edge (u, v).
/// Binarity and rootedness are preserved.
pub fn nni(t: &mut RectTree, mv: NniMove) {
    let NniMove { u, w, v, z } = mv;
    remove_edge_between(t, u, w);
    remove_edge_between(t, v, z);
    t.add_edge(v, w, ());
    t.add_edge(u, z, ());
}

/// Inverse of `nni`; applying both leaves the edge set unchanged.
pub fn undo_nni(t: &mut RectTree, mv: NniMove) {
    let NniMove { u, w, v, z } = mv;
    t.add_edge(u, w, ());
    t.add_edge(v, z, ());
    remove_edge_between(t, v, w);
    remove_edge_between(t, u, z);
}

/// Evaluate the NNI neighborhood of a scored tree and return a strictly
/// improving move, or `None`.
///
/// Candidate edges are taken from `index_to_edge` in the order given by
/// `order`. With `greedy` the first improving move is returned immediately;
/// otherwise the whole neighborhood is searched for the best one. Every
/// trial move is rolled back before the next is tried, so the edge set is
/// unchanged on return; ancestors of the last trial are left unvisited and
/// the next scoring pass repairs them.
pub fn neighborhood_search(
    t: &mut RectTree,
    root: NodeIndex,
    index_to_edge: &BTreeMap<usize, (NodeIndex, NodeIndex)>,
    order: &[usize],
    greedy: bool,
) -> Result<Option<NniMove>> {
    let mut best_score = t[root].score;
    let mut best_move = None;

    for idx in order {
        let (u, v) = index_to_edge[idx];

        if super::is_leaf(t, v) {
            continue;
        }

        let u_children: Vec<NodeIndex> = t
            .neighbors_directed(u, Direction::Outgoing)
            .filter(|&w| w != v)
            .collect();
        let v_children: Vec<NodeIndex> = t.neighbors_directed(v, Direction::Outgoing).collect();

        for &w in &u_children {
            for &z in &v_children {
                let mv = NniMove { u, w, v, z };

                nni(t, mv);
                unvisit_path(t, root, v)?;
                small_rectilinear(t, root)?;

                let score = t[root].score;
                if score < best_score {
                    best_score = score;
                    best_move = Some(mv);

                    if greedy {
                        undo_nni(t, mv);
                        unvisit_path(t, root, v)?;
                        return Ok(best_move);
                    }
                }

                undo_nni(t, mv);
                unvisit_path(t, root, v)?;
            }
        }
    }

    Ok(best_move)
}

/// Hill-climb the tree topology under the rectilinear score.
///
/// The edge list is indexed once and shuffled; each applied move replaces
/// (u,w) and (v,z) at their indices with (v,w) and (u,z), so the traversal
/// order is stable across iterations. The climb stops when no move improves
/// the score, including plateaus.
///
/// Requires a scored tree. The returned tree carries unvisited vertices
/// from the last rejected trials; run `small_rectilinear` before reading
/// its score.
pub fn hill_climb(mut t: RectTree, root: NodeIndex, rng: &mut StdRng, greedy: bool) -> Result<RectTree> {
    let mut index_to_edge: BTreeMap<usize, (NodeIndex, NodeIndex)> = BTreeMap::new();
    let mut edge_to_index: BTreeMap<(NodeIndex, NodeIndex), usize> = BTreeMap::new();
    let mut order: Vec<usize> = Vec::new();

    for (idx, edge) in t.edge_references().enumerate() {
        let pair = (edge.source(), edge.target());
        index_to_edge.insert(idx, pair);
        edge_to_index.insert(pair, idx);
        order.push(idx);
    }

    order.shuffle(rng);

    let mut current_score = t[root].score;
    loop {
        let Some(mv) = neighborhood_search(&mut t, root, &index_to_edge, &order, greedy)? else {
            break;
        };

        let NniMove { u, w, v, z } = mv;
        nni(&mut t, mv);

        // keep the index bijection in step with the applied move
        let i1 = edge_to_index.remove(&(u, w)).expect("edge (u,w) not indexed");
        let i2 = edge_to_index.remove(&(v, z)).expect("edge (v,z) not indexed");
        index_to_edge.insert(i1, (v, w));
        edge_to_index.insert((v, w), i1);
        index_to_edge.insert(i2, (u, z));
        edge_to_index.insert((u, z), i2);

        unvisit_path(&mut t, root, v)?;
        small_rectilinear(&mut t, root)?;

        let new_score = t[root].score;
        if current_score <= new_score {
            break;
        }
        current_score = new_score;
    }

    Ok(t)
}

fn internal_edges(t: &RectTree) -> Vec<(NodeIndex, NodeIndex)> {
    t.edge_references()
        .filter(|edge| !super::is_leaf(t, edge.target()))
        .map(|edge| (edge.source(), edge.target()))
        .collect()
}

/// Perturb the tree with `floor(aggression * |internal edges|)` random NNI
/// moves, without score checks.
///
/// All `visited` flags are invalidated afterwards; the caller owns the full
/// rescoring pass.
// TODO: maintain the internal-edge list across swaps instead of
// re-enumerating it every iteration
pub fn stochastic_nni(t: &RectTree, rng: &mut StdRng, aggression: f32) -> RectTree {
    let mut perturbed = t.clone();

    let num_perturbations = (internal_edges(&perturbed).len() as f32 * aggression) as usize;
    for _ in 0..num_perturbations {
        let edges = internal_edges(&perturbed);
        let (u, v) = edges[rng.gen_range(0..edges.len())];

        let u_children: Vec<NodeIndex> = perturbed
            .neighbors_directed(u, Direction::Outgoing)
            .filter(|&w| w != v)
            .collect();
        let v_children: Vec<NodeIndex> =
            perturbed.neighbors_directed(v, Direction::Outgoing).collect();

        let w = u_children[rng.gen_range(0..u_children.len())];
        let z = v_children[rng.gen_range(0..v_children.len())];

        nni(&mut perturbed, NniMove { u, w, v, z });
    }

    unvisit_all(&mut perturbed);
    perturbed
}

#[cfg(test)]
mod tests {
    use super::super::test_support::build;
    use super::super::to_phylo_tree;
    use super::*;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn edge_set(t: &RectTree) -> BTreeSet<(NodeIndex, NodeIndex)> {
        t.edge_references()
            .map(|e| (e.source(), e.target()))
            .collect()
    }

    fn find(t: &RectTree, name: &str) -> NodeIndex {
        t.node_indices().find(|&v| t[v].name == name).unwrap()
    }

    #[test]
    fn test_nni_and_undo() {
        let (mut t, _root, _) = build(
            "((A,B)X,(C,D)Y)R;",
            &[("A", &[0]), ("B", &[0]), ("C", &[0]), ("D", &[0])],
        );
        let before = edge_set(&t);

        let (r, x, y, c) = (find(&t, "R"), find(&t, "X"), find(&t, "Y"), find(&t, "C"));
        let mv = NniMove { u: r, w: x, v: y, z: c };

        nni(&mut t, mv);
        let after = edge_set(&t);
        assert!(after.contains(&(y, x)));
        assert!(after.contains(&(r, c)));
        assert!(!after.contains(&(r, x)));
        assert!(!after.contains(&(y, c)));
        assert_eq!(after.len(), before.len());

        undo_nni(&mut t, mv);
        assert_eq!(edge_set(&t), before);
    }

    #[test]
    fn test_neighborhood_search_finds_improvement() {
        // the caterpillar splits the equal leaves across two gaps and
        // scores 4; swapping B and C closes one of them
        let (mut t, root, _) = build(
            "(((A,C)X,B)Y,D)R;",
            &[("A", &[0]), ("B", &[0]), ("C", &[2]), ("D", &[2])],
        );
        small_rectilinear(&mut t, root).unwrap();
        assert_eq!(t[root].score, 4);

        let mut index_to_edge = BTreeMap::new();
        let mut order = Vec::new();
        for (idx, edge) in t.edge_references().enumerate() {
            index_to_edge.insert(idx, (edge.source(), edge.target()));
            order.push(idx);
        }

        let mv = neighborhood_search(&mut t, root, &index_to_edge, &order, false)
            .unwrap()
            .expect("an improving move exists");

        nni(&mut t, mv);
        unvisit_path(&mut t, root, mv.v).unwrap();
        small_rectilinear(&mut t, root).unwrap();
        assert_eq!(t[root].score, 2);
    }

    #[test]
    fn test_neighborhood_search_none_on_optimum() {
        let (mut t, root, _) = build(
            "((A,B)X,(C,D)Y)R;",
            &[("A", &[0]), ("B", &[0]), ("C", &[2]), ("D", &[2])],
        );
        small_rectilinear(&mut t, root).unwrap();
        assert_eq!(t[root].score, 2);

        let mut index_to_edge = BTreeMap::new();
        let mut order = Vec::new();
        for (idx, edge) in t.edge_references().enumerate() {
            index_to_edge.insert(idx, (edge.source(), edge.target()));
            order.push(idx);
        }

        let mv = neighborhood_search(&mut t, root, &index_to_edge, &order, false).unwrap();
        assert!(mv.is_none());

        // rollbacks leave the edge set unchanged
        small_rectilinear(&mut t, root).unwrap();
        assert_eq!(t[root].score, 2);
    }

    #[test]
    fn test_hill_climb_improves() {
        let (mut t, root, _) = build(
            "(((A,C)X,B)Y,D)R;",
            &[("A", &[0]), ("B", &[0]), ("C", &[2]), ("D", &[2])],
        );
        small_rectilinear(&mut t, root).unwrap();
        let initial = t[root].score;
        assert_eq!(initial, 4);

        let mut rng = StdRng::seed_from_u64(42);
        let mut t = hill_climb(t, root, &mut rng, false).unwrap();
        small_rectilinear(&mut t, root).unwrap();

        // 2 is the lower bound: the leaf values span a gap of 2
        assert!(t[root].score < initial);
        assert_eq!(t[root].score, 2);
    }

    #[test]
    fn test_hill_climb_deterministic() {
        let leaves: [(&str, &[i32]); 6] = [
            ("A", &[0, 1, 4]),
            ("B", &[3, 1, 0]),
            ("C", &[0, 2, 4]),
            ("D", &[3, 0, 0]),
            ("E", &[1, 1, 4]),
            ("F", &[3, 1, 1]),
        ];
        let newick = "(((A,D)1,(E,B)2)3,(C,F)4)R;";

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let (mut t, root, _) = build(newick, &leaves);
            small_rectilinear(&mut t, root).unwrap();
            let initial = t[root].score;

            let mut rng = StdRng::seed_from_u64(42);
            let mut t = hill_climb(t, root, &mut rng, true).unwrap();
            small_rectilinear(&mut t, root).unwrap();

            assert!(t[root].score <= initial);
            outputs.push((t[root].score, to_phylo_tree(&t, root).to_newick()));
        }

        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn test_stochastic_nni() {
        let leaves: [(&str, &[i32]); 6] = [
            ("A", &[0]),
            ("B", &[1]),
            ("C", &[2]),
            ("D", &[3]),
            ("E", &[4]),
            ("F", &[5]),
        ];
        let newick = "(((A,B)1,(C,D)2)3,(E,F)4)R;";
        let (mut t, root, _) = build(newick, &leaves);
        small_rectilinear(&mut t, root).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let mut perturbed = stochastic_nni(&t, &mut rng, 1.0);

        // all flags invalidated, shape still binary and scorable
        assert!(perturbed.node_indices().all(|v| !perturbed[v].visited));
        small_rectilinear(&mut perturbed, root).unwrap();

        // leaves are untouched by topology moves
        let mut names: Vec<String> = perturbed
            .node_indices()
            .filter(|&v| super::super::is_leaf(&perturbed, v))
            .map(|v| perturbed[v].name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["A", "B", "C", "D", "E", "F"]);

        // same seed, same perturbation
        let mut rng2 = StdRng::seed_from_u64(7);
        let perturbed2 = stochastic_nni(&t, &mut rng2, 1.0);
        assert_eq!(edge_set(&perturbed), edge_set(&perturbed2));
    }
}
