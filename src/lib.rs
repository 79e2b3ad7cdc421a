//! Caspian grids irregularly-sampled geospatial point observations onto a
//! regular raster, using an adaptive kd-tree index and a pluggable
//! reduction function per cell.

pub mod cli;
pub mod driver;
pub mod dtype;
pub mod error;
pub mod grid;
pub mod index_file;
pub mod kdtree;
pub mod projector;
pub mod reader;
pub mod reduction;
pub mod result_set;

#[cfg(test)]
pub(crate) mod test;

pub use driver::{run, AuxiliaryOutputs};
pub use error::{GridError, Result};
pub use grid::Grid;
pub use kdtree::KdTree;
pub use result_set::{Hit, ResultSet};
