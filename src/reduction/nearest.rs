use super::{ReductionAttrs, ReductionFunction};
use crate::dtype::{DType, Style, WorkingFloat};
use crate::kdtree::Bounds;
use crate::result_set::ResultSet;

fn squared_distance(central_x: f32, central_y: f32, hit_x: f32, hit_y: f32) -> f32 {
    let dx = central_x - hit_x;
    let dy = central_y - hit_y;
    dx * dx + dy * dy
}

/// The value of the observation closest to the cell centre, ignoring fill
/// values.
pub struct NumericNearestNeighbour;

impl ReductionFunction for NumericNearestNeighbour {
    fn name(&self) -> &'static str {
        "numeric_nearest_neighbour"
    }

    fn style(&self) -> Style {
        Style::Numeric
    }

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
    ) {
        let central_x = (bounds.x.0 + bounds.x.1) / 2.0;
        let central_y = (bounds.y.0 + bounds.y.1) / 2.0;

        let mut lowest_distance = f32::MAX;
        let mut best_value: WorkingFloat = attrs.output_fill_value;

        while let Some(hit) = results.iterate() {
            let value = input_dtype.get(input, hit.record_index as usize);
            if value == attrs.input_fill_value {
                continue;
            }
            let distance = squared_distance(central_x, central_y, hit.x, hit.y);
            if distance < lowest_distance {
                lowest_distance = distance;
                best_value = value;
            }
        }

        output_dtype.put(output, output_index, best_value);
    }
}

/// The opaque coded value of the observation closest to the cell centre,
/// copied verbatim. Unlike the numeric variant, there is no fill-value
/// concept for coded data — every observation in the result set counts.
pub struct CodedNearestNeighbour;

impl ReductionFunction for CodedNearestNeighbour {
    fn name(&self) -> &'static str {
        "coded_nearest_neighbour"
    }

    fn style(&self) -> Style {
        Style::Coded
    }

    fn reduce(
        &self,
        results: &mut ResultSet,
        _attrs: ReductionAttrs,
        bounds: Bounds,
        input: &[u8],
        input_dtype: DType,
        output: &mut [u8],
        output_dtype: DType,
        output_index: usize,
    ) {
        let central_x = (bounds.x.0 + bounds.x.1) / 2.0;
        let central_y = (bounds.y.0 + bounds.y.1) / 2.0;

        let mut lowest_distance = f32::MAX;
        let mut best_value = vec![0u8; input_dtype.size()];
        let mut value_found = false;
        let mut scratch = vec![0u8; input_dtype.size()];

        while let Some(hit) = results.iterate() {
            let distance = squared_distance(central_x, central_y, hit.x, hit.y);
            if distance < lowest_distance {
                lowest_distance = distance;
                input_dtype.coded_get(input, hit.record_index as usize, &mut scratch);
                best_value.copy_from_slice(&scratch);
                value_found = true;
            }
        }

        if !value_found {
            best_value.iter_mut().for_each(|b| *b = 0);
        }

        output_dtype.coded_put(output, output_index, &best_value);
    }
}
