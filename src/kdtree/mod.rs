//! The adaptive 2-D kd-tree (spec component E): an implicit binary-heap
//! layout over observations, built once and queried many times.
//!
//! Node `i`'s children live at `2i+1`/`2i+2` and its parent at
//! `(i+1)/2 - 1`; there is no pointer chasing anywhere in the tree.

mod build;
mod nn;
mod query;
mod verify;

pub use nn::nearest_neighbour;
pub use query::{query_range, Bounds};
pub use verify::verify_tree;

use crate::error::Result;
use crate::reader::CoordinateReader;
use bytemuck::{Pod, Zeroable};

/// The axis an internal node discriminates on. Time is never a split axis —
/// only horizontal extent drives tree shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y = 1,
}

/// One slot of the tree's implicit array. Unused slots past the real leaves
/// (the array is sized up to the next power of two) stay `Uninitialised`
/// and are never visited by a traversal that starts at the root.
#[derive(Debug, Clone, Copy)]
pub enum KdNode {
    Internal { axis: Axis, discriminator: f32 },
    Terminal { observation_index: u32 },
    Uninitialised,
}

/// A single indexed point: its projected (x, y, t) and the record index of
/// the original observation it was read from.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct Observation {
    pub dimensions: [f32; 3],
    pub record_index: u32,
}

/// A built kd-tree: the node array plus the (in-place sorted) observation
/// array it indexes into.
pub struct KdTree {
    pub(crate) nodes: Vec<KdNode>,
    pub(crate) observations: Vec<Observation>,
}

const X: usize = 0;
const Y: usize = 1;
const T: usize = 2;

#[inline]
pub(crate) fn left_child(index: usize) -> usize {
    2 * index + 1
}

#[inline]
pub(crate) fn right_child(index: usize) -> usize {
    2 * index + 2
}

#[inline]
pub(crate) fn parent(index: usize) -> usize {
    (index + 1) / 2 - 1
}

/// The number of implicit-array slots needed to store `num_observations`
/// leaves: the leaf count rounded up to the next power of two, doubled
/// minus one for the internal nodes above them.
pub(crate) fn tree_num_nodes(num_observations: u32) -> u32 {
    if num_observations == 0 {
        return 0;
    }
    let leaves = num_observations.next_power_of_two() as u64;
    (2 * leaves - 1).max(1) as u32
}

impl KdTree {
    /// Read every record from `reader` and build the tree over them.
    ///
    /// Construction reads the reader to exhaustion up front (the tree needs
    /// random access to sort and re-sort its observations by axis), then
    /// recursively splits the data, descending both halves in parallel.
    pub fn build_from_reader(reader: &mut dyn CoordinateReader) -> Result<Self> {
        let num_observations = reader.num_records();
        let mut observations = Vec::with_capacity(num_observations as usize);
        let mut record_index = 0u32;
        while let Some((x, y, t)) = reader.read()? {
            observations.push(Observation {
                dimensions: [x, y, t],
                record_index,
            });
            record_index += 1;
        }

        let num_nodes = tree_num_nodes(num_observations) as usize;
        let mut nodes = vec![KdNode::Uninitialised; num_nodes];

        if num_observations > 0 {
            build::build_range(&mut nodes, &mut observations, 0, 0, None);
        }

        Ok(Self { nodes, observations })
    }

    /// Construct a tree directly from an already-read observation set,
    /// primarily for tests and for reassembling a tree loaded from an
    /// index file.
    pub(crate) fn from_parts(nodes: Vec<KdNode>, observations: Vec<Observation>) -> Self {
        Self { nodes, observations }
    }

    pub fn num_observations(&self) -> u32 {
        self.observations.len() as u32
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    pub(crate) fn observations(&self) -> &[Observation] {
        &self.observations
    }
}
