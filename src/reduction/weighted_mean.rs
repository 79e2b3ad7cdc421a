use super::{ReductionAttrs, ReductionFunction};
use crate::dtype::{DType, Style, WorkingFloat};
use crate::kdtree::Bounds;
use crate::result_set::ResultSet;

/// The mean of every non-fill value, weighted by each observation's
/// distance from the cell centre.
pub struct WeightedMean;

impl ReductionFunction for WeightedMean {
    fn name(&self) -> &'static str {
        "weighted_mean"
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

        let mut weighted_sum: WorkingFloat = 0.0;
        let mut total_distance: WorkingFloat = 0.0;

        while let Some(hit) = results.iterate() {
            let value = input_dtype.get(input, hit.record_index as usize);
            if value == attrs.input_fill_value {
                continue;
            }
            let dx = (central_x - hit.x) as WorkingFloat;
            let dy = (central_y - hit.y) as WorkingFloat;
            let distance = (dx * dx + dy * dy).sqrt();
            weighted_sum += value * distance;
            total_distance += distance;
        }

        let output_value = if total_distance == 0.0 {
            attrs.output_fill_value
        } else {
            weighted_sum / total_distance
        };

        output_dtype.put(output, output_index, output_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_fall_back_to_fill_value() {
        let weighted_mean = WeightedMean;
        let mut results = ResultSet::new();
        results.insert(0.5, 0.5, 0.0, 0);

        let input: Vec<u8> = 10.0f32.to_le_bytes().to_vec();
        let mut output = vec![0u8; 4];

        weighted_mean.reduce(
            &mut results,
            ReductionAttrs {
                input_fill_value: -999.0,
                output_fill_value: -1.0,
            },
            Bounds {
                x: (0.0, 1.0),
                y: (0.0, 1.0),
                t: (0.0, 1.0),
            },
            &input,
            DType::F32,
            &mut output,
            DType::F32,
            0,
        );

        // The only observation sits exactly at the cell centre, so its
        // distance weight is zero: the output falls back to the fill value.
        assert_eq!(DType::F32.get(&output, 0), -1.0);
    }

    #[test]
    fn closer_points_are_weighted_more_heavily() {
        let weighted_mean = WeightedMean;
        let mut results = ResultSet::new();
        results.insert(0.6, 0.5, 0.0, 0);
        results.insert(10.0, 10.0, 0.0, 1);

        let input: Vec<u8> = [100.0f32, 0.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut output = vec![0u8; 4];

        weighted_mean.reduce(
            &mut results,
            ReductionAttrs {
                input_fill_value: -999.0,
                output_fill_value: -1.0,
            },
            Bounds {
                x: (0.0, 1.0),
                y: (0.0, 1.0),
                t: (0.0, 1.0),
            },
            &input,
            DType::F32,
            &mut output,
            DType::F32,
            0,
        );

        let value = DType::F32.get(&output, 0);
        assert!(value > 50.0, "expected the nearer high-value point to dominate, got {value}");
    }
}
