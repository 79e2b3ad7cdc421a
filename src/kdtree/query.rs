//! Range queries: collect every observation within a 3-D (x, y, t) box.

use super::{left_child, right_child, KdNode, KdTree};
use crate::result_set::ResultSet;

/// Inclusive lower/upper bounds on each of the three query dimensions.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub x: (f32, f32),
    pub y: (f32, f32),
    pub t: (f32, f32),
}

impl Bounds {
    fn contains(&self, dims: [f32; 3]) -> bool {
        dims[super::X] >= self.x.0
            && dims[super::X] <= self.x.1
            && dims[super::Y] >= self.y.0
            && dims[super::Y] <= self.y.1
            && dims[super::T] >= self.t.0
            && dims[super::T] <= self.t.1
    }

    fn lower_upper(&self, axis: super::Axis) -> (f32, f32) {
        match axis {
            super::Axis::X => self.x,
            super::Axis::Y => self.y,
        }
    }
}

/// Query `tree` for every observation within `bounds`, returning a fresh
/// [`ResultSet`].
pub fn query_range(tree: &KdTree, bounds: &Bounds) -> ResultSet {
    let results = ResultSet::new();
    if tree.num_nodes() > 0 {
        query_at(tree, bounds, &results, 0);
    }
    results
}

fn query_at(tree: &KdTree, bounds: &Bounds, results: &ResultSet, node_index: usize) {
    match tree.nodes()[node_index] {
        KdNode::Terminal { observation_index } => {
            let observation = &tree.observations()[observation_index as usize];
            if bounds.contains(observation.dimensions) {
                results.insert(
                    observation.dimensions[super::X],
                    observation.dimensions[super::Y],
                    observation.dimensions[super::T],
                    observation.record_index,
                );
            }
        }
        KdNode::Internal { axis, discriminator } => {
            let (lower, upper) = bounds.lower_upper(axis);
            if discriminator >= lower {
                query_at(tree, bounds, results, left_child(node_index));
            }
            if discriminator <= upper {
                query_at(tree, bounds, results, right_child(node_index));
            }
        }
        KdNode::Uninitialised => {}
    }
}
