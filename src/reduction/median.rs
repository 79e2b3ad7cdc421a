use super::{ReductionAttrs, ReductionFunction};
use crate::dtype::{DType, Style, WorkingFloat};
use crate::kdtree::Bounds;
use crate::result_set::ResultSet;

/// The median of every non-fill value in the cell, found by quickselect
/// rather than a full sort.
pub struct Median;

impl ReductionFunction for Median {
    fn name(&self) -> &'static str {
        "median"
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
        let mut values = Vec::new();
        while let Some(hit) = results.iterate() {
            let value = input_dtype.get(input, hit.record_index as usize);
            if value == attrs.input_fill_value {
                continue;
            }
            values.push(value);
        }

        let output_value = if values.is_empty() {
            attrs.output_fill_value
        } else {
            median(&mut values)
        };

        output_dtype.put(output, output_index, output_value);
    }
}

/// Partition `values[first..=last]` around `values[first]`, returning the
/// pivot's final resting index. Mirrors the classic Hoare partition used by
/// quickselect.
fn partition(values: &mut [WorkingFloat], first: usize, last: usize) -> usize {
    if first == last {
        return first;
    }

    let pivot_value = values[first];
    let mut i = first;
    let mut j = last + 1;

    loop {
        loop {
            i += 1;
            if !(values[i] < pivot_value && i != last) {
                break;
            }
        }
        loop {
            j -= 1;
            if !(values[j] > pivot_value && j != first) {
                break;
            }
        }
        if i < j {
            values.swap(i, j);
        } else {
            break;
        }
    }

    values[first] = values[j];
    values[j] = pivot_value;
    j
}

/// Find the value that would sit at index `k` if `values[first..=last]`
/// were sorted ascending, without fully sorting it.
fn single_selection(values: &mut [WorkingFloat], k: usize, first: usize, last: usize) -> WorkingFloat {
    let mut first = first;
    let mut last = last;
    loop {
        let j = partition(values, first, last);
        if k == j {
            return values[j];
        } else if k < j {
            last = j - 1;
        } else {
            first = j + 1;
        }
    }
}

/// Find the mean of the values that would sit at indices `k1` and `k1 + 1`
/// if `values` were sorted ascending.
fn mean_double_selection(values: &mut [WorkingFloat], k1: usize) -> WorkingFloat {
    let k2 = k1 + 1;
    let mut first = 0;
    let mut last = values.len() - 1;

    loop {
        let j = partition(values, first, last);
        if k2 < j {
            last = j - 1;
        } else if k1 > j {
            first = j + 1;
        } else if k1 == j {
            let len = values.len();
            return (values[j] + single_selection(values, j + 1, j + 1, len - 1)) / 2.0;
        } else {
            return (single_selection(values, j - 1, 0, j - 1) + values[j]) / 2.0;
        }
    }
}

/// Compute the median of `values`, reordering them in the process.
fn median(values: &mut [WorkingFloat]) -> WorkingFloat {
    let length = values.len();
    if length == 1 {
        return values[0];
    }
    if length == 2 {
        return (values[0] + values[1]) / 2.0;
    }

    if length % 2 == 0 {
        mean_double_selection(values, length / 2 - 1)
    } else {
        single_selection(values, (length - 1) / 2, 0, length - 1)
    }
}
