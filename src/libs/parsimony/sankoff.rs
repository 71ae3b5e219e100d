use super::{RectTree, RectVertex};
use anyhow::bail;
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;

/// Intersection of two closed integer intervals, or `None` when disjoint.
/// Touching intervals intersect in a single point.
fn overlap(s1: i32, e1: i32, s2: i32, e2: i32) -> Option<(i32, i32)> {
    if s1 <= e2 && s1 >= s2 {
        Some((s1, e1.min(e2)))
    } else if s2 <= e1 && s2 >= s1 {
        Some((s2, e1.min(e2)))
    } else {
        None
    }
}

/// Combine two scored children into the parent's interval vector.
///
/// Per dimension: overlapping child intervals intersect at cost zero;
/// disjoint intervals leave the gap between them as the parent interval and
/// charge its length.
pub fn sankoff(u: &RectVertex, v: &RectVertex) -> anyhow::Result<(Vec<i32>, Vec<i32>, i64)> {
    let (Some(us), Some(ue)) = (&u.start, &u.end) else {
        bail!("vertex '{}' has no interval data", u.name);
    };
    let (Some(vs), Some(ve)) = (&v.start, &v.end) else {
        bail!("vertex '{}' has no interval data", v.name);
    };
    if us.len() != vs.len() {
        bail!(
            "interval vectors disagree in length: {} vs {}",
            us.len(),
            vs.len()
        );
    }

    let mut start = vec![0; us.len()];
    let mut end = vec![0; us.len()];
    let mut distance: i64 = 0;

    for i in 0..us.len() {
        match overlap(us[i], ue[i], vs[i], ve[i]) {
            Some((s, e)) => {
                start[i] = s;
                end[i] = e;
            }
            None => {
                if us[i] < vs[i] {
                    start[i] = ue[i];
                    end[i] = vs[i];
                } else {
                    start[i] = ve[i];
                    end[i] = us[i];
                }

                distance += (end[i] - start[i]) as i64;
            }
        }
    }

    Ok((start, end, distance))
}

/// Score the tree bottom-up, filling interval vectors and cumulative scores.
///
/// The traversal is an explicit work stack rather than recursion, so trees
/// with thousands of leaves cannot exhaust the call stack: a vertex with
/// unvisited children is requeued behind them and computed on the second
/// visit. Vertices already marked `visited` keep their state, which is what
/// makes rescoring after `unvisit_path` incremental.
pub fn small_rectilinear(t: &mut RectTree, root: NodeIndex) -> anyhow::Result<()> {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let children = super::successors(t, node);

        if children.is_empty() {
            if t[node].start.is_none() {
                bail!("leaf '{}' has no profile attached", t[node].name);
            }
            t[node].visited = true;
            continue;
        }

        if children.len() != 2 {
            bail!(
                "internal vertex '{}' has {} children, expected exactly two",
                t[node].name,
                children.len()
            );
        }

        if children.iter().all(|&c| t[c].visited) {
            let (u, v) = (children[0], children[1]);
            let (start, end, cost) = sankoff(&t[u], &t[v])?;
            let score = cost + t[u].score + t[v].score;

            let data = &mut t[node];
            data.score = score;
            data.start = Some(start);
            data.end = Some(end);
            data.visited = true;
            continue;
        }

        stack.push(node);
        for &child in &children {
            if !t[child].visited {
                stack.push(child);
            }
        }
    }

    Ok(())
}

/// Clear `visited` along the path from `v` up to (but excluding) the root,
/// so the next scoring pass recomputes exactly the vertices an edge change
/// at `v` can affect.
pub fn unvisit_path(t: &mut RectTree, root: NodeIndex, v: NodeIndex) -> anyhow::Result<()> {
    let mut current = v;
    loop {
        t[current].visited = false;
        let Some(parent) = t
            .neighbors_directed(current, Direction::Incoming)
            .next()
        else {
            bail!(
                "vertex '{}' has no parent on the way to the root",
                t[current].name
            );
        };
        if parent == root {
            break;
        }
        current = parent;
    }

    Ok(())
}

/// Clear `visited` on every vertex; the next scoring pass is a full pass.
pub fn unvisit_all(t: &mut RectTree) {
    for data in t.node_weights_mut() {
        data.visited = false;
    }
}
