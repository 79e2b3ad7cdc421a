//! Binary index file codec (spec component I): serialize and load a built
//! [`KdTree`] plus the projector it was built with.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! u32   magic/version (= 2)
//! u32   projector definition length, in bytes, including the trailing NUL
//! [u8]  projector definition string, NUL-terminated
//! u32   num_observations
//! u32   tree_num_nodes
//! [PackedNode; tree_num_nodes]
//! [Observation; num_observations]
//! u32   trailing magic/version (= 2)
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::{GridError, Result};
use crate::kdtree::{Axis, KdNode, KdTree, Observation};
use crate::projector::{self, Projector};
use crate::reader::mmap_file;

const INDEX_FILE_FORMAT: u32 = 2;

const TAG_X: i32 = 0;
const TAG_Y: i32 = 1;
const TAG_TERMINAL: i32 = 3;
const TAG_UNINITIALISED: i32 = 4;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PackedNode {
    tag: i32,
    data: u32,
}

impl From<&KdNode> for PackedNode {
    fn from(node: &KdNode) -> Self {
        match *node {
            KdNode::Internal { axis, discriminator } => PackedNode {
                tag: match axis {
                    Axis::X => TAG_X,
                    Axis::Y => TAG_Y,
                },
                data: discriminator.to_bits(),
            },
            KdNode::Terminal { observation_index } => PackedNode {
                tag: TAG_TERMINAL,
                data: observation_index,
            },
            KdNode::Uninitialised => PackedNode {
                tag: TAG_UNINITIALISED,
                data: 0,
            },
        }
    }
}

impl TryFrom<PackedNode> for KdNode {
    type Error = GridError;

    fn try_from(packed: PackedNode) -> Result<Self> {
        Ok(match packed.tag {
            TAG_X => KdNode::Internal {
                axis: Axis::X,
                discriminator: f32::from_bits(packed.data),
            },
            TAG_Y => KdNode::Internal {
                axis: Axis::Y,
                discriminator: f32::from_bits(packed.data),
            },
            TAG_TERMINAL => KdNode::Terminal {
                observation_index: packed.data,
            },
            TAG_UNINITIALISED => KdNode::Uninitialised,
            other => {
                return Err(GridError::CorruptIndex(format!(
                    "unrecognised node tag {other}"
                )))
            }
        })
    }
}

/// Write `tree`, built with `projector`, to `path`.
pub fn save(path: &Path, tree: &KdTree, projector: &dyn Projector) -> Result<()> {
    let file = File::create(path).map_err(|source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let io_err = |source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    };

    writer
        .write_all(&INDEX_FILE_FORMAT.to_le_bytes())
        .map_err(io_err)?;

    let mut definition = projector.definition().as_bytes().to_vec();
    definition.push(0);
    writer
        .write_all(&(definition.len() as u32).to_le_bytes())
        .map_err(io_err)?;
    writer.write_all(&definition).map_err(io_err)?;

    let num_observations = tree.num_observations();
    let tree_num_nodes = tree.num_nodes() as u32;
    writer
        .write_all(&num_observations.to_le_bytes())
        .map_err(io_err)?;
    writer
        .write_all(&tree_num_nodes.to_le_bytes())
        .map_err(io_err)?;

    let packed_nodes: Vec<PackedNode> = tree.nodes().iter().map(PackedNode::from).collect();
    writer
        .write_all(bytemuck::cast_slice(&packed_nodes))
        .map_err(io_err)?;
    writer
        .write_all(bytemuck::cast_slice(tree.observations()))
        .map_err(io_err)?;

    writer
        .write_all(&INDEX_FILE_FORMAT.to_le_bytes())
        .map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    tracing::debug!(
        path = %path.display(),
        num_observations,
        tree_num_nodes,
        "wrote kd-tree index"
    );
    Ok(())
}

/// Load a tree and its projector back from `path`, written previously by
/// [`save`].
pub fn load(path: &Path) -> Result<(KdTree, Box<dyn Projector>)> {
    let mmap = mmap_file(path)?;
    let bytes = &mmap[..];
    let mut offset = 0usize;

    let corrupt = |msg: String| GridError::CorruptIndex(msg);

    let read_u32 = |bytes: &[u8], offset: &mut usize| -> Result<u32> {
        let end = *offset + 4;
        let slice = bytes
            .get(*offset..end)
            .ok_or_else(|| corrupt("unexpected end of file reading a u32 header field".into()))?;
        *offset = end;
        Ok(u32::from_le_bytes(slice.try_into().unwrap()))
    };

    let format = read_u32(bytes, &mut offset)?;
    if format != INDEX_FILE_FORMAT {
        return Err(corrupt(format!(
            "unsupported index file format (read {format}, expected {INDEX_FILE_FORMAT})"
        )));
    }

    let definition_len = read_u32(bytes, &mut offset)? as usize;
    let definition_end = offset + definition_len;
    let definition_bytes = bytes
        .get(offset..definition_end)
        .ok_or_else(|| corrupt("projector definition runs past end of file".into()))?;
    offset = definition_end;
    let definition = std::ffi::CStr::from_bytes_with_nul(definition_bytes)
        .map_err(|_| corrupt("projector definition is not NUL-terminated".into()))?
        .to_str()
        .map_err(|_| corrupt("projector definition is not valid UTF-8".into()))?;
    let input_projector = projector::from_definition(definition)?;

    let num_observations = read_u32(bytes, &mut offset)?;
    let tree_num_nodes = read_u32(bytes, &mut offset)?;

    let expected_num_nodes = crate::kdtree::tree_num_nodes(num_observations);
    if tree_num_nodes != expected_num_nodes {
        return Err(corrupt(format!(
            "mismatch in number of tree nodes (read {tree_num_nodes}, computed {expected_num_nodes})"
        )));
    }

    let nodes_byte_len = tree_num_nodes as usize * std::mem::size_of::<PackedNode>();
    let nodes_end = offset + nodes_byte_len;
    let packed_nodes: &[PackedNode] = bytemuck::try_cast_slice(
        bytes
            .get(offset..nodes_end)
            .ok_or_else(|| corrupt("node array runs past end of file".into()))?,
    )
    .map_err(|e| corrupt(format!("malformed node array: {e}")))?;
    offset = nodes_end;

    let nodes = packed_nodes
        .iter()
        .map(|&packed| KdNode::try_from(packed))
        .collect::<Result<Vec<_>>>()?;

    let observations_byte_len = num_observations as usize * std::mem::size_of::<Observation>();
    let observations_end = offset + observations_byte_len;
    let observations: &[Observation] = bytemuck::try_cast_slice(
        bytes
            .get(offset..observations_end)
            .ok_or_else(|| corrupt("observation array runs past end of file".into()))?,
    )
    .map_err(|e| corrupt(format!("malformed observation array: {e}")))?;
    offset = observations_end;

    let trailing_format = read_u32(bytes, &mut offset)?;
    if trailing_format != INDEX_FILE_FORMAT {
        return Err(corrupt(format!(
            "wrong concluding header (read {trailing_format}, expected {INDEX_FILE_FORMAT})"
        )));
    }

    tracing::debug!(
        path = %path.display(),
        num_observations,
        tree_num_nodes,
        "loaded kd-tree index"
    );

    Ok((KdTree::from_parts(nodes, observations.to_vec()), input_projector))
}
