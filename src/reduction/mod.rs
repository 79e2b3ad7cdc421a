//! Reduction functions (spec component F): turn the set of observations
//! that fall in a cell into a single output value.
//!
//! Each function is registered under an exact name; look-ups for any other
//! name fail with [`GridError::UnknownReduction`] rather than silently
//! falling back to a no-op.

mod mean;
mod median;
mod nearest;
mod newest;
mod weighted_mean;

use crate::dtype::{check_style_match, DType, Style, WorkingFloat};
use crate::error::{GridError, Result};
use crate::kdtree::Bounds;
use crate::result_set::ResultSet;

/// Per-job parameters every reduction function needs: the sentinel values
/// that mark "no data" on the input and output sides.
#[derive(Debug, Clone, Copy)]
pub struct ReductionAttrs {
    pub input_fill_value: WorkingFloat,
    pub output_fill_value: WorkingFloat,
}

/// A named, stateless strategy for collapsing a cell's result set into one
/// output sample.
pub trait ReductionFunction: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this function operates on numeric or opaque coded samples;
    /// used to validate compatibility with the job's input/output dtypes.
    fn style(&self) -> Style;

    #[allow(clippy::too_many_arguments)]
    fn reduce(
        &self,
        results: &mut ResultSet,
        attrs: ReductionAttrs,
        bounds: Bounds,
        input: &[u8],
        input_dtype: DType,
        output: &mut [u8],
        output_dtype: DType,
        output_index: usize,
    );
}

/// Resolve a reduction function by its exact registered name, checking it
/// against the requested input/output dtypes' style.
pub fn get_reduction_function(
    name: &str,
    input_dtype: DType,
    output_dtype: DType,
) -> Result<Box<dyn ReductionFunction>> {
    check_style_match(input_dtype, output_dtype)?;

    let function: Box<dyn ReductionFunction> = match name {
        "mean" => Box::new(mean::Mean),
        "weighted_mean" => Box::new(weighted_mean::WeightedMean),
        "median" => Box::new(median::Median),
        "numeric_nearest_neighbour" => Box::new(nearest::NumericNearestNeighbour),
        "coded_nearest_neighbour" => Box::new(nearest::CodedNearestNeighbour),
        "newest" => Box::new(newest::Newest),
        _ => return Err(GridError::UnknownReduction(name.to_string())),
    };

    if function.style() != input_dtype.style() {
        return Err(GridError::StyleMismatch {
            input: input_dtype.name().to_string(),
            output: output_dtype.name().to_string(),
        });
    }

    Ok(function)
}
