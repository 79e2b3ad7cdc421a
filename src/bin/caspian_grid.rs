//! CLI entry point: parse flags, build the core's config types, run the
//! gridding job. Mirrors the flow of the original `caspian` executable --
//! load or build an index, then (optionally) grid it -- but delegates all
//! of the actual work to the `caspian_grid` library.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use memmap2::{Mmap, MmapMut};

use caspian_grid::cli::Cli;
use caspian_grid::driver::{self, AuxiliaryOutputs};
use caspian_grid::dtype::DType;
use caspian_grid::grid::Grid;
use caspian_grid::index_file;
use caspian_grid::kdtree::KdTree;
use caspian_grid::projector::{self, Projector};
use caspian_grid::reader::RawFileCoordinateReader;
use caspian_grid::reduction::{get_reduction_function, ReductionAttrs};
use caspian_grid::{GridError, Result};

/// WGS84 polar circumference in metres, used to default `--vres`.
const WGS84_POLAR_CIRCUMFERENCE: f32 = 40_007_863.0;
/// WGS84 equatorial circumference in metres, used to default `--hres`.
const WGS84_EQUATORIAL_CIRCUMFERENCE: f32 = 40_075_017.0;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    cli.validate()?;

    let (tree, projector): (KdTree, Box<dyn Projector>) = match &cli.load_index {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading index");
            index_file::load(path)?
        }
        None => {
            let projector = projector::from_definition(&cli.projection)?;

            // Unwrap is safe: `validate()` requires these when not loading
            // an index.
            let lat_path = cli.input_lats.as_ref().unwrap();
            let lon_path = cli.input_lons.as_ref().unwrap();

            tracing::info!("building index");
            let mut reader = RawFileCoordinateReader::open(
                lat_path,
                lon_path,
                cli.input_time.as_deref(),
                projector,
            )?;
            let tree = KdTree::build_from_reader(&mut reader)?;

            // The reader's projector has been moved into the reader; rebuild
            // one from the same definition for serialization and gridding.
            let projector = projector::from_definition(&cli.projection)?;

            if let Some(save_path) = &cli.save_index {
                tracing::info!(path = %save_path.display(), "saving index");
                index_file::save(save_path, &tree, projector.as_ref())?;
            }

            (tree, projector)
        }
    };

    let generating_image = cli.input_data.is_some()
        || cli.output_data.is_some()
        || cli.output_lats.is_some()
        || cli.output_lons.is_some();

    if !generating_image {
        return Ok(());
    }

    let input_dtype = DType::parse(&cli.input_dtype)?;
    let output_dtype = DType::parse(&cli.output_dtype)?;
    let reduction = get_reduction_function(&cli.reduction_function, input_dtype, output_dtype)?;

    let horizontal_resolution = if cli.hres == 0.0 {
        WGS84_EQUATORIAL_CIRCUMFERENCE / cli.width as f32
    } else {
        cli.hres
    };
    let vertical_resolution = if cli.vres == 0.0 {
        WGS84_POLAR_CIRCUMFERENCE / (2.0 * cli.height as f32)
    } else {
        cli.vres
    };

    let mut grid = Grid::new(
        cli.width,
        cli.height,
        vertical_resolution,
        horizontal_resolution,
        cli.vsample,
        cli.hsample,
        cli.central_x,
        cli.central_y,
    );
    grid.set_time_constraints(cli.time_min, cli.time_max);

    let input_map = match &cli.input_data {
        Some(path) => Some(open_readonly(path)?),
        None => None,
    };
    let input_bytes: &[u8] = input_map.as_deref().unwrap_or(&[]);

    if let Some(path) = &cli.input_data {
        let expected_bytes = tree.num_observations() as usize * input_dtype.size();
        if input_bytes.len() != expected_bytes {
            return Err(GridError::InvalidArguments(format!(
                "input data file {} is {} bytes, expected {} for {} observations of {}",
                path.display(),
                input_bytes.len(),
                expected_bytes,
                tree.num_observations(),
                input_dtype.name()
            )));
        }
    }

    let output_data_bytes = grid.num_cells() * output_dtype.size();
    let mut output_map = match &cli.output_data {
        Some(path) => Some(open_readwrite(path, output_data_bytes)?),
        None => None,
    };
    let output_bytes: &mut [u8] = output_map.as_deref_mut().unwrap_or(&mut []);

    let geo_bytes = grid.num_cells() * std::mem::size_of::<f32>();
    let mut lats_map = match &cli.output_lats {
        Some(path) => Some(open_readwrite(path, geo_bytes)?),
        None => None,
    };
    let mut lons_map = match &cli.output_lons {
        Some(path) => Some(open_readwrite(path, geo_bytes)?),
        None => None,
    };

    let lats: Option<&mut [f32]> = lats_map
        .as_deref_mut()
        .map(|bytes| bytemuck::cast_slice_mut(bytes));
    let lons: Option<&mut [f32]> = lons_map
        .as_deref_mut()
        .map(|bytes| bytemuck::cast_slice_mut(bytes));

    let attrs = ReductionAttrs {
        input_fill_value: cli.input_fill_value as caspian_grid::dtype::WorkingFloat,
        output_fill_value: cli.output_fill_value as caspian_grid::dtype::WorkingFloat,
    };

    driver::run(
        &grid,
        &tree,
        projector.as_ref(),
        reduction.as_ref(),
        attrs,
        input_bytes,
        input_dtype,
        output_bytes,
        output_dtype,
        AuxiliaryOutputs { lats, lons },
    )?;

    Ok(())
}

fn open_readonly(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    // SAFETY: input files are treated as read-only for the lifetime of this
    // process; concurrent external mutation is outside this CLI's control.
    unsafe { Mmap::map(&file) }.map_err(|source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    })
}

fn open_readwrite(path: &Path, len: usize) -> Result<MmapMut> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| GridError::IoFailure {
            path: path.display().to_string(),
            source,
        })?;
    file.set_len(len as u64).map_err(|source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    // SAFETY: this process holds the only handle to the freshly created
    // output file for the duration of the mapping.
    unsafe { MmapMut::map_mut(&file) }.map_err(|source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    })
}
