//! End-to-end scenarios exercising the full index-build-and-grid pipeline,
//! not just one module at a time.

use crate::dtype::DType;
use crate::error::Result;
use crate::grid::Grid;
use crate::kdtree::{nearest_neighbour, query_range, Bounds, KdTree};
use crate::projector::{EquidistantCylindrical, Projector};
use crate::reader::CoordinateReader;
use crate::reduction::{get_reduction_function, ReductionAttrs};

/// Replays a fixed slice of `(x, y, t)` triples, already in projected space —
/// these tests don't need real lon/lat projection to exercise the pipeline.
struct FixedReader {
    points: Vec<(f32, f32, f32)>,
    next: usize,
}

impl CoordinateReader for FixedReader {
    fn num_records(&self) -> u32 {
        self.points.len() as u32
    }

    fn read(&mut self) -> Result<Option<(f32, f32, f32)>> {
        if self.next >= self.points.len() {
            return Ok(None);
        }
        let point = self.points[self.next];
        self.next += 1;
        Ok(Some(point))
    }
}

fn build_tree(points: Vec<(f32, f32, f32)>) -> KdTree {
    let mut reader = FixedReader { points, next: 0 };
    KdTree::build_from_reader(&mut reader).unwrap()
}

/// Dense grid, mean reduction: every cell's sampling box catches several
/// identically-valued observations, so every output cell equals that value.
#[test]
fn dense_grid_mean_is_uniform() {
    let mut points = Vec::new();
    let mut x = -45.0f32;
    while x <= 45.0 {
        let mut y = -25.0f32;
        while y <= 25.0 {
            points.push((x, y, 0.0));
            y += 2.0;
        }
        x += 2.0;
    }
    let num_points = points.len();
    let tree = build_tree(points);

    let grid = Grid::new(8, 4, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0);
    let input: Vec<u8> = (0..num_points).flat_map(|_| 1.0f32.to_le_bytes()).collect();
    let mut output = vec![0u8; grid.num_cells() * 4];

    let projector: Box<dyn Projector> = Box::new(EquidistantCylindrical::wgs84());
    let reduction = get_reduction_function("mean", DType::F32, DType::F32).unwrap();
    let attrs = ReductionAttrs {
        input_fill_value: -999.0,
        output_fill_value: -999.0,
    };

    crate::driver::run(
        &grid,
        &tree,
        projector.as_ref(),
        reduction.as_ref(),
        attrs,
        &input,
        DType::F32,
        &mut output,
        DType::F32,
        crate::driver::AuxiliaryOutputs { lats: None, lons: None },
    )
    .unwrap();

    for i in 0..grid.num_cells() {
        assert!((DType::F32.get(&output, i) - 1.0).abs() < 1e-6, "cell {i} is not 1.0");
    }
}

/// One cell, four observations including a fill value: each reduction
/// function is expected to treat that quartet differently.
#[test]
fn fill_value_propagation_differs_per_reduction() {
    let bounds = Bounds {
        x: (0.0, 1.0),
        y: (0.0, 1.0),
        t: (f32::NEG_INFINITY, f32::INFINITY),
    };
    let input: Vec<u8> = [1.0f32, 2.0, -999.0, 4.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let attrs = ReductionAttrs {
        input_fill_value: -999.0,
        output_fill_value: -999.0,
    };

    let fresh_hits = || {
        let mut results = crate::result_set::ResultSet::new();
        results.insert(0.0, 0.0, 0.0, 0);
        results.insert(0.0, 1.0, 1.0, 1);
        results.insert(1.0, 0.0, 2.0, 2);
        results.insert(1.0, 1.0, 3.0, 3);
        results
    };

    let mean = get_reduction_function("mean", DType::F32, DType::F32).unwrap();
    let mut results = fresh_hits();
    let mut output = vec![0u8; 4];
    mean.reduce(&mut results, attrs, bounds, &input, DType::F32, &mut output, DType::F32, 0);
    assert!((DType::F32.get(&output, 0) - 7.0 / 3.0).abs() < 1e-6);

    let median = get_reduction_function("median", DType::F32, DType::F32).unwrap();
    let mut results = fresh_hits();
    let mut output = vec![0u8; 4];
    median.reduce(&mut results, attrs, bounds, &input, DType::F32, &mut output, DType::F32, 0);
    assert_eq!(DType::F32.get(&output, 0), 2.0);

    let newest = get_reduction_function("newest", DType::F32, DType::F32).unwrap();
    let mut results = fresh_hits();
    let mut output = vec![0u8; 4];
    newest.reduce(&mut results, attrs, bounds, &input, DType::F32, &mut output, DType::F32, 0);
    assert_eq!(DType::F32.get(&output, 0), 4.0);

    // Cell centre (0.5, 0.5) is equidistant from all four points; the
    // tie-break is unspecified, so any non-fill value is acceptable.
    let nn = get_reduction_function("numeric_nearest_neighbour", DType::F32, DType::F32).unwrap();
    let mut results = fresh_hits();
    let mut output = vec![0u8; 4];
    nn.reduce(&mut results, attrs, bounds, &input, DType::F32, &mut output, DType::F32, 0);
    let value = DType::F32.get(&output, 0);
    assert!([1.0, 2.0, 4.0].contains(&value), "got {value}, expected one of the non-fill values");
}

/// Brute-force linear search must agree with the tree on every query.
#[test]
fn nearest_neighbour_matches_brute_force() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(42);
    let points: Vec<(f32, f32, f32)> = (0..1000)
        .map(|_| (rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0))
        .collect();
    let tree = build_tree(points.clone());

    for _ in 0..100 {
        let (qx, qy) = (rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));

        let brute_force = points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (a.0 - qx).powi(2) + (a.1 - qy).powi(2);
                let db = (b.0 - qx).powi(2) + (b.1 - qy).powi(2);
                da.partial_cmp(&db).unwrap()
            })
            .map(|(i, _)| i as u32)
            .unwrap();

        let tree_result = nearest_neighbour(&tree, qx, qy).unwrap().record_index;
        assert_eq!(tree_result, brute_force);
    }
}

/// Save an index, load it back, and check that a range query returns the
/// same hits as querying the original in-memory tree.
#[test]
fn serialization_round_trip_preserves_query_results() {
    let points: Vec<(f32, f32, f32)> = (0..200)
        .map(|i| {
            let t = i as f32;
            (((i * 37) % 101) as f32 - 50.0, ((i * 53) % 97) as f32 - 48.0, t)
        })
        .collect();
    let tree = build_tree(points);
    let projector = EquidistantCylindrical::wgs84();

    let file = tempfile::NamedTempFile::new().unwrap();
    crate::index_file::save(file.path(), &tree, &projector).unwrap();
    let (loaded, _loaded_projector) = crate::index_file::load(file.path()).unwrap();

    let bounds = Bounds {
        x: (-10.0, 10.0),
        y: (-10.0, 10.0),
        t: (f32::NEG_INFINITY, f32::INFINITY),
    };

    let mut original_hits: Vec<u32> = {
        let mut results = query_range(&tree, &bounds);
        let mut hits = Vec::new();
        while let Some(hit) = results.iterate() {
            hits.push(hit.record_index);
        }
        hits
    };
    let mut loaded_hits: Vec<u32> = {
        let mut results = query_range(&loaded, &bounds);
        let mut hits = Vec::new();
        while let Some(hit) = results.iterate() {
            hits.push(hit.record_index);
        }
        hits
    };

    original_hits.sort();
    loaded_hits.sort();
    assert_eq!(original_hits, loaded_hits);
}

/// A time-windowed `mean` over five co-located observations, each carrying a
/// distinct timestamp equal to its own value.
#[test]
fn time_window_restricts_which_observations_are_averaged() {
    let points: Vec<(f32, f32, f32)> = (0..5).map(|i| (0.0, 0.0, i as f32)).collect();
    let tree = build_tree(points);

    let mut grid = Grid::new(1, 1, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0);
    grid.set_time_constraints(1.5, 3.5);

    let input: Vec<u8> = (0..5u32).flat_map(|i| (i as f32).to_le_bytes()).collect();
    let mut output = vec![0u8; 4];

    let projector: Box<dyn Projector> = Box::new(EquidistantCylindrical::wgs84());
    let reduction = get_reduction_function("mean", DType::F32, DType::F32).unwrap();
    let attrs = ReductionAttrs {
        input_fill_value: -999.0,
        output_fill_value: -999.0,
    };

    crate::driver::run(
        &grid,
        &tree,
        projector.as_ref(),
        reduction.as_ref(),
        attrs,
        &input,
        DType::F32,
        &mut output,
        DType::F32,
        crate::driver::AuxiliaryOutputs { lats: None, lons: None },
    )
    .unwrap();

    assert!((DType::F32.get(&output, 0) - 2.5).abs() < 1e-6);
}
