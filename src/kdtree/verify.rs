//! Structural self-check: confirm every leaf sits on the correct side of
//! every discriminator on its path back to the root.

use super::{parent, KdNode, KdTree};

/// Walk every leaf's ancestry and check that each internal node's
/// discriminator is consistent with the leaf's position relative to it.
///
/// Returns `true` if the tree is internally consistent. Any violation is
/// logged via `tracing::warn!` with enough detail to locate the offending
/// node; this never panics, since a caller verifying an index loaded from
/// disk wants a diagnosis, not a crash.
pub fn verify_tree(tree: &KdTree) -> bool {
    let mut ok = true;
    let start_of_leaves = (tree.num_nodes() as u32 + 1) / 2;

    for leaf_index in start_of_leaves as usize..tree.num_nodes() {
        let observation_index = match tree.nodes()[leaf_index] {
            KdNode::Terminal { observation_index } => observation_index,
            KdNode::Uninitialised => continue,
            KdNode::Internal { .. } => continue,
        };
        let observation = &tree.observations()[observation_index as usize];
        let dims = [observation.dimensions[super::X], observation.dimensions[super::Y]];

        let mut current_index = leaf_index;
        while current_index > 0 {
            let parent_index = parent(current_index);
            let is_left_child = current_index % 2 == 1;

            let (axis, discriminator) = match tree.nodes()[parent_index] {
                KdNode::Internal { axis, discriminator } => (axis, discriminator),
                other => unreachable!("leaf ancestor {parent_index} is not internal: {other:?}"),
            };

            let value = dims[axis as usize];
            let is_correct = if is_left_child {
                discriminator >= value
            } else {
                discriminator <= value
            };

            if !is_correct {
                ok = false;
                tracing::warn!(
                    leaf_index,
                    parent_index,
                    ?axis,
                    discriminator,
                    value,
                    is_left_child,
                    "kd-tree leaf violates its ancestor's discriminator"
                );
            }

            current_index = parent_index;
        }
    }

    ok
}
