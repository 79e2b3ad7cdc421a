//! The parallel cell loop (spec component H): for every output pixel,
//! query the index and reduce the results into one output sample.
//!
//! Rows are processed in parallel: the output buffer is split into
//! per-row byte chunks up front (rayon's STR sort uses the same
//! chunk-then-`into_par_iter` shape for its vertical slices), so each
//! worker only ever touches the bytes of the row it owns.

use rayon::prelude::*;

use crate::dtype::DType;
use crate::error::Result;
use crate::grid::Grid;
use crate::kdtree::{query_range, KdTree};
use crate::projector::Projector;
use crate::reduction::{ReductionAttrs, ReductionFunction};

/// Optional outputs alongside the reduced data raster.
pub struct AuxiliaryOutputs<'a> {
    pub lats: Option<&'a mut [f32]>,
    pub lons: Option<&'a mut [f32]>,
}

/// Run the gridding job described by `grid`/`tree`/`reduction` over every
/// cell, writing reduced samples into `output` and, if requested, the
/// cell-centre latitude/longitude into `aux`.
#[allow(clippy::too_many_arguments)]
pub fn run(
    grid: &Grid,
    tree: &KdTree,
    projector: &dyn Projector,
    reduction: &dyn ReductionFunction,
    attrs: ReductionAttrs,
    input: &[u8],
    input_dtype: DType,
    output: &mut [u8],
    output_dtype: DType,
    aux: AuxiliaryOutputs<'_>,
) -> Result<()> {
    tracing::debug!(width = grid.width, height = grid.height, "building output image");

    let row_bytes = grid.width as usize * output_dtype.size();
    if output.len() != row_bytes * grid.height as usize {
        return Err(crate::error::GridError::InvalidArguments(format!(
            "output buffer is {} bytes, expected {} for a {}x{} {} raster",
            output.len(),
            row_bytes * grid.height as usize,
            grid.width,
            grid.height,
            output_dtype.name()
        )));
    }

    let aux_row_len = grid.width as usize;
    let lats_rows: Vec<Option<&mut [f32]>> = match aux.lats {
        Some(lats) => lats.chunks_mut(aux_row_len).map(Some).collect(),
        None => (0..grid.height as usize).map(|_| None).collect(),
    };
    let lons_rows: Vec<Option<&mut [f32]>> = match aux.lons {
        Some(lons) => lons.chunks_mut(aux_row_len).map(Some).collect(),
        None => (0..grid.height as usize).map(|_| None).collect(),
    };

    let output_rows: Vec<&mut [u8]> = output.chunks_mut(row_bytes).collect();

    output_rows
        .into_par_iter()
        .zip(lats_rows.into_par_iter())
        .zip(lons_rows.into_par_iter())
        .enumerate()
        .for_each(|(physical_row, ((row_output, lats_row), lons_row))| {
            let v = grid.height - 1 - physical_row as u32;

            process_row(
                grid,
                tree,
                projector,
                reduction,
                attrs,
                input,
                input_dtype,
                row_output,
                output_dtype,
                v,
                lats_row,
                lons_row,
            );
        });

    tracing::debug!("output image built");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn process_row(
    grid: &Grid,
    tree: &KdTree,
    projector: &dyn Projector,
    reduction: &dyn ReductionFunction,
    attrs: ReductionAttrs,
    input: &[u8],
    input_dtype: DType,
    row_output: &mut [u8],
    output_dtype: DType,
    v: u32,
    mut lats_row: Option<&mut [f32]>,
    mut lons_row: Option<&mut [f32]>,
) {
    let elem_size = output_dtype.size();

    for u in 0..grid.width {
        let bounds = grid.cell_bounds(u, v);
        let output_byte_offset = u as usize * elem_size;

        if !input.is_empty() {
            let mut results = query_range(tree, &bounds);
            let output_slice = &mut row_output[output_byte_offset..output_byte_offset + elem_size];
            reduction.reduce(
                &mut results,
                attrs,
                bounds,
                input,
                input_dtype,
                output_slice,
                output_dtype,
                0,
            );
        }

        if lats_row.is_some() || lons_row.is_some() {
            let centre_x = (bounds.x.0 + bounds.x.1) / 2.0;
            let centre_y = (bounds.y.0 + bounds.y.1) / 2.0;
            let (lon, lat) = projector.inverse_project(centre_y, centre_x);
            if let Some(lats) = lats_row.as_deref_mut() {
                lats[u as usize] = lat;
            }
            if let Some(lons) = lons_row.as_deref_mut() {
                lons[u as usize] = lon;
            }
        }
    }
}
