use super::{ReductionAttrs, ReductionFunction};
use crate::dtype::{DType, Style, WorkingFloat};
use crate::kdtree::Bounds;
use crate::result_set::ResultSet;

/// The unweighted arithmetic mean of every non-fill value in the cell.
pub struct Mean;

impl ReductionFunction for Mean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn style(&self) -> Style {
        Style::Numeric
    }

    fn reduce(
        &self,
        results: &mut ResultSet,
        attrs: ReductionAttrs,
        _bounds: Bounds,
        input: &[u8],
        input_dtype: DType,
        output: &mut [u8],
        output_dtype: DType,
        output_index: usize,
    ) {
        let mut sum: WorkingFloat = 0.0;
        let mut count: u32 = 0;

        while let Some(hit) = results.iterate() {
            let value = input_dtype.get(input, hit.record_index as usize);
            if value == attrs.input_fill_value {
                continue;
            }
            sum += value;
            count += 1;
        }

        let output_value = if count == 0 {
            attrs.output_fill_value
        } else {
            sum / count as WorkingFloat
        };

        output_dtype.put(output, output_index, output_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_non_fill_values() {
        let mean = Mean;
        let mut results = ResultSet::new();
        results.insert(0.0, 0.0, 0.0, 0);
        results.insert(0.0, 0.0, 0.0, 1);
        results.insert(0.0, 0.0, 0.0, 2);

        let input: Vec<u8> = [10.0f32, 20.0, -999.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut output = vec![0u8; 4];

        mean.reduce(
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

        assert_eq!(DType::F32.get(&output, 0), 15.0);
    }

    #[test]
    fn empty_cell_yields_fill_value() {
        let mean = Mean;
        let mut results = ResultSet::new();
        let input: Vec<u8> = vec![];
        let mut output = vec![0u8; 4];

        mean.reduce(
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

        assert_eq!(DType::F32.get(&output, 0), -1.0);
    }
}
