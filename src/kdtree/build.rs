//! Recursive tree construction, one sibling pair of subtrees at a time.

use std::cell::UnsafeCell;

use rayon::join;

use super::{left_child, right_child, Axis, KdNode, Observation};

/// A shared view over the node array that lets two disjoint subtrees be
/// written from different threads without a lock.
///
/// Left and right recursive calls only ever write indices reachable from
/// their own child pointer, and those index sets never overlap for any
/// binary tree — so concurrent writes through this type are data-race
/// free even though no `&mut` is ever handed to either side.
#[derive(Clone, Copy)]
struct NodeSlots<'a> {
    cells: &'a [UnsafeCell<KdNode>],
}

// SAFETY: `write` is only ever called by `build_range`, which guarantees
// disjoint indices between concurrently running calls.
unsafe impl Sync for NodeSlots<'_> {}

impl<'a> NodeSlots<'a> {
    fn new(nodes: &'a mut [KdNode]) -> Self {
        // SAFETY: `UnsafeCell<T>` is `#[repr(transparent)]` over `T`, so a
        // `&mut [T]` and a `&[UnsafeCell<T>]` of the same length share a
        // layout; reborrowing through a raw pointer here does not create
        // an aliasing `&mut`.
        let cells = unsafe { &*(nodes as *mut [KdNode] as *const [UnsafeCell<KdNode>]) };
        Self { cells }
    }

    /// # Safety
    /// The caller must not call this concurrently with another write or
    /// read to the same `index`.
    unsafe fn write(&self, index: usize, value: KdNode) {
        *self.cells[index].get() = value;
    }
}

/// Build the subtree rooted at `current_tree_index` over `observations`,
/// which occupies global array positions `[first_index, first_index +
/// observations.len())`. `sort_dim` is the axis the slice is already
/// sorted by, or `None` if it has not been sorted yet.
pub(super) fn build_range(
    nodes: &mut [KdNode],
    observations: &mut [Observation],
    first_index: u32,
    current_tree_index: usize,
    sort_dim: Option<Axis>,
) {
    let slots = NodeSlots::new(nodes);
    build_range_inner(slots, observations, first_index, current_tree_index, sort_dim);
}

fn build_range_inner(
    nodes: NodeSlots<'_>,
    observations: &mut [Observation],
    first_index: u32,
    current_tree_index: usize,
    sort_dim: Option<Axis>,
) {
    if observations.len() == 1 {
        // SAFETY: `current_tree_index` belongs exclusively to this call.
        unsafe {
            nodes.write(
                current_tree_index,
                KdNode::Terminal {
                    observation_index: first_index,
                },
            );
        }
        return;
    }

    let (x_min, x_max, y_min, y_max) = bounding_extent(observations, sort_dim);

    let discrimination_dimension = if (y_max - y_min).abs() >= (x_max - x_min).abs() {
        Axis::Y
    } else {
        Axis::X
    };

    if Some(discrimination_dimension) != sort_dim {
        sort_by_axis(observations, discrimination_dimension);
    }

    let n = observations.len();
    let split_local = if n % 2 == 0 { n / 2 - 1 } else { (n - 1) / 2 };
    let dim = discrimination_dimension as usize;
    let discriminator = if n % 2 == 0 {
        (observations[split_local].dimensions[dim] + observations[split_local + 1].dimensions[dim])
            / 2.0
    } else {
        observations[split_local].dimensions[dim]
    };

    // SAFETY: `current_tree_index` belongs exclusively to this call.
    unsafe {
        nodes.write(
            current_tree_index,
            KdNode::Internal {
                axis: discrimination_dimension,
                discriminator,
            },
        );
    }

    let (left_observations, right_observations) = observations.split_at_mut(split_local + 1);
    let right_first_index = first_index + split_local as u32 + 1;

    join(
        || {
            build_range_inner(
                nodes,
                left_observations,
                first_index,
                left_child(current_tree_index),
                Some(discrimination_dimension),
            )
        },
        || {
            build_range_inner(
                nodes,
                right_observations,
                right_first_index,
                right_child(current_tree_index),
                Some(discrimination_dimension),
            )
        },
    );
}

/// Compute the bounding box of `observations` along both axes. When the
/// slice is already sorted by one axis, that axis's extremes are read
/// directly off the ends instead of scanned for.
fn bounding_extent(observations: &[Observation], sort_dim: Option<Axis>) -> (f32, f32, f32, f32) {
    let mut x_min = f32::MAX;
    let mut x_max = f32::MIN;
    let mut y_min = f32::MAX;
    let mut y_max = f32::MIN;

    match sort_dim {
        Some(Axis::X) => {
            x_min = observations[0].dimensions[super::X];
            x_max = observations[observations.len() - 1].dimensions[super::X];
            for obs in observations {
                y_min = y_min.min(obs.dimensions[super::Y]);
                y_max = y_max.max(obs.dimensions[super::Y]);
            }
        }
        Some(Axis::Y) => {
            y_min = observations[0].dimensions[super::Y];
            y_max = observations[observations.len() - 1].dimensions[super::Y];
            for obs in observations {
                x_min = x_min.min(obs.dimensions[super::X]);
                x_max = x_max.max(obs.dimensions[super::X]);
            }
        }
        None => {
            // Unsorted: scan every observation on both axes.
            for obs in observations {
                x_min = x_min.min(obs.dimensions[super::X]);
                x_max = x_max.max(obs.dimensions[super::X]);
                y_min = y_min.min(obs.dimensions[super::Y]);
                y_max = y_max.max(obs.dimensions[super::Y]);
            }
        }
    }

    (x_min, x_max, y_min, y_max)
}

fn sort_by_axis(observations: &mut [Observation], axis: Axis) {
    let dim = axis as usize;
    observations.sort_by(|a, b| a.dimensions[dim].partial_cmp(&b.dimensions[dim]).unwrap());
}
