use super::{LabeledTree, LabeledVertex, RectTree};
use crate::libs::profile::{BreakpointProfile, GenomicBin};
use anyhow::bail;
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;

/// Pick the optimal child label given the parent's label and the child's
/// interval of optimal labels.
///
/// Per dimension the parent label is kept when it falls inside the child
/// interval; otherwise the nearer interval endpoint is taken.
pub fn local_labeling(parent: &[i32], child_start: &[i32], child_end: &[i32]) -> Vec<i32> {
    let mut labeling = vec![0; parent.len()];
    for i in 0..labeling.len() {
        if child_start[i] <= parent[i] && parent[i] <= child_end[i] {
            labeling[i] = parent[i];
        } else {
            let dist1 = (parent[i] - child_start[i]).abs();
            let dist2 = (parent[i] - child_end[i]).abs();
            // ties go to the interval start
            labeling[i] = if dist1 <= dist2 {
                child_start[i]
            } else {
                child_end[i]
            };
        }
    }

    labeling
}

/// Fix one optimal breakpoint profile per vertex of a scored tree.
///
/// The root takes its `start` vector (any point of the root interval is
/// optimal); every other vertex is labeled top-down against its parent via
/// `local_labeling`. The induced branch length is the breakpoint magnitude
/// of the difference to the parent profile.
pub fn ancestral_labeling(
    t: &RectTree,
    root: NodeIndex,
    bins: &[GenomicBin],
) -> anyhow::Result<(LabeledTree, NodeIndex)> {
    let mut bt = LabeledTree::default();
    let mut anonymous = 0;

    let mut stack: Vec<(NodeIndex, Option<NodeIndex>)> = vec![(root, None)];
    let mut new_root = None;

    while let Some((node, parent)) = stack.pop() {
        let data = &t[node];
        let (Some(start), Some(end)) = (&data.start, &data.end) else {
            bail!(
                "vertex '{}' is unscored; run the rectilinear pass first",
                data.name
            );
        };

        let name = if data.name.is_empty() {
            anonymous += 1;
            format!("internal_{}", anonymous - 1)
        } else {
            data.name.clone()
        };

        let (profile, in_branch_length) = match parent {
            None => {
                let profile = BreakpointProfile {
                    bins: bins.to_vec(),
                    profile: start.clone(),
                };
                (profile, None)
            }
            Some(p) => {
                let parent_profile = &bt[p].profile;
                let profile = BreakpointProfile {
                    bins: bins.to_vec(),
                    profile: local_labeling(&parent_profile.profile, start, end),
                };
                let length = profile.distance(parent_profile);
                (profile, Some(length))
            }
        };

        let new_node = bt.add_node(LabeledVertex {
            name,
            profile,
            in_branch_length,
        });
        if let Some(p) = parent {
            bt.add_edge(p, new_node, ());
        } else {
            new_root = Some(new_node);
        }

        for child in t.neighbors_directed(node, Direction::Outgoing) {
            stack.push((child, Some(new_node)));
        }
    }

    Ok((bt, new_root.unwrap()))
}
