//! Single nearest-neighbour search.

use super::{left_child, right_child, KdNode, KdTree, Observation};

/// Find the observation closest to `(target_x, target_y)` by Euclidean
/// distance in the projected plane. Time is ignored.
///
/// Returns `None` only if the tree holds no observations.
pub fn nearest_neighbour(tree: &KdTree, target_x: f32, target_y: f32) -> Option<&Observation> {
    if tree.num_observations() == 0 {
        return None;
    }
    let target = [target_x, target_y];
    Some(search(tree, &target, 0))
}

fn squared_distance(observation: &Observation, target: &[f32; 2]) -> f32 {
    let dx = observation.dimensions[super::X] - target[0];
    let dy = observation.dimensions[super::Y] - target[1];
    dx * dx + dy * dy
}

fn search<'t>(tree: &'t KdTree, target: &[f32; 2], node_index: usize) -> &'t Observation {
    match tree.nodes()[node_index] {
        KdNode::Terminal { observation_index } => &tree.observations()[observation_index as usize],
        KdNode::Internal { axis, discriminator } => {
            let pivot_target_distance = discriminator - target[axis as usize];
            let near_first = pivot_target_distance > 0.0;

            let mut best = search(
                tree,
                target,
                if near_first {
                    left_child(node_index)
                } else {
                    right_child(node_index)
                },
            );

            // Only descend into the far branch if it could possibly hold
            // something closer than the current best: the perpendicular
            // distance to the splitting plane lower-bounds any point on
            // the far side.
            let best_squared = squared_distance(best, target);
            if best_squared > pivot_target_distance * pivot_target_distance {
                let candidate = search(
                    tree,
                    target,
                    if near_first {
                        right_child(node_index)
                    } else {
                        left_child(node_index)
                    },
                );
                if squared_distance(candidate, target) < best_squared {
                    best = candidate;
                }
            }
            best
        }
        KdNode::Uninitialised => {
            unreachable!(
                "nearest-neighbour search reached an uninitialised node; every path \
                 reachable from the root is populated by construction"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdtree::build::build_range;

    fn build(points: &[(f32, f32)]) -> KdTree {
        let n = points.len() as u32;
        let mut nodes = vec![KdNode::Uninitialised; super::super::tree_num_nodes(n) as usize];
        let mut observations: Vec<Observation> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Observation {
                dimensions: [x, y, 0.0],
                record_index: i as u32,
            })
            .collect();
        build_range(&mut nodes, &mut observations, 0, 0, None);
        KdTree::from_parts(nodes, observations)
    }

    #[test]
    fn finds_the_closest_point() {
        let tree = build(&[(0.0, 0.0), (10.0, 10.0), (3.0, 4.0), (-20.0, 5.0)]);
        let nearest = nearest_neighbour(&tree, 3.1, 4.1).unwrap();
        assert_eq!(nearest.record_index, 2);
    }

    #[test]
    fn empty_tree_yields_none() {
        let tree = KdTree::from_parts(vec![], vec![]);
        assert!(nearest_neighbour(&tree, 0.0, 0.0).is_none());
    }

    #[test]
    fn single_point_is_always_nearest() {
        let tree = build(&[(42.0, 42.0)]);
        let nearest = nearest_neighbour(&tree, -1000.0, 1000.0).unwrap();
        assert_eq!(nearest.record_index, 0);
    }
}
