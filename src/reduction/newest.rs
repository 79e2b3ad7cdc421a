use super::{ReductionAttrs, ReductionFunction};
use crate::dtype::{DType, Style, WorkingFloat};
use crate::kdtree::Bounds;
use crate::result_set::ResultSet;

/// The value of the observation with the latest time stamp, ignoring fill
/// values.
pub struct Newest;

impl ReductionFunction for Newest {
    fn name(&self) -> &'static str {
        "newest"
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
        let mut latest = f32::MIN;
        let mut newest_value: WorkingFloat = attrs.output_fill_value;

        while let Some(hit) = results.iterate() {
            let value = input_dtype.get(input, hit.record_index as usize);
            if value == attrs.input_fill_value {
                continue;
            }
            if hit.t > latest {
                latest = hit.t;
                newest_value = value;
            }
        }

        output_dtype.put(output, output_index, newest_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_latest_timestamp() {
        let newest = Newest;
        let mut results = ResultSet::new();
        results.insert(0.0, 0.0, 5.0, 0);
        results.insert(0.0, 0.0, 10.0, 1);
        results.insert(0.0, 0.0, 1.0, 2);

        let input: Vec<u8> = [1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut output = vec![0u8; 4];

        newest.reduce(
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

        assert_eq!(DType::F32.get(&output, 0), 2.0);
    }
}
