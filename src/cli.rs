//! Command-line surface (spec §6.5). Thin: parses flags into this struct,
//! validates cross-field requirements, and leaves everything else to
//! `bin/caspian_grid.rs` and the library.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{GridError, Result};

/// Indexed gridding of irregularly-sampled geospatial point observations
/// onto a regular raster.
#[derive(Parser, Debug)]
#[command(name = "caspian-grid", version, disable_help_flag = true)]
pub struct Cli {
    // Index controls
    /// Specify filename for input latitude
    #[arg(short = 'a', long = "input-lats")]
    pub input_lats: Option<PathBuf>,

    /// Specify filename for input longitude
    #[arg(short = 'o', long = "input-lons")]
    pub input_lons: Option<PathBuf>,

    /// Specify filename for input time
    #[arg(short = 'e', long = "input-time")]
    pub input_time: Option<PathBuf>,

    /// Specify projection using a PROJ.4-compatible string
    #[arg(short = 'p', long = "projection", default_value = "+proj=eqc +datum=WGS84")]
    pub projection: String,

    /// Save the built index to a file
    #[arg(short = 'I', long = "save-index")]
    pub save_index: Option<PathBuf>,

    /// Load a pre-generated index from a file
    #[arg(short = 'i', long = "load-index")]
    pub load_index: Option<PathBuf>,

    // Input data
    /// Specify filename for input data
    #[arg(short = 'd', long = "input-data")]
    pub input_data: Option<PathBuf>,

    /// Specify dtype for input data file
    #[arg(short = 't', long = "input-dtype", default_value = "float32")]
    pub input_dtype: String,

    /// Specify fill value for input data file
    #[arg(short = 'f', long = "input-fill-value", default_value_t = -999.0)]
    pub input_fill_value: f64,

    // Output data
    /// Specify filename for output data
    #[arg(short = 'D', long = "output-data")]
    pub output_data: Option<PathBuf>,

    /// Specify dtype for output data file
    #[arg(short = 'T', long = "output-dtype", default_value = "float32")]
    pub output_dtype: String,

    /// Specify fill value for output data file
    #[arg(short = 'F', long = "output-fill-value", default_value_t = -999.0)]
    pub output_fill_value: f64,

    /// Specify filename for output latitude raster
    #[arg(short = 'A', long = "output-lats")]
    pub output_lats: Option<PathBuf>,

    /// Specify filename for output longitude raster
    #[arg(short = 'O', long = "output-lons")]
    pub output_lons: Option<PathBuf>,

    // Image generation
    /// Height of the output grid
    #[arg(short = 'h', long = "height", default_value_t = 360)]
    pub height: u32,

    /// Width of the output grid
    #[arg(short = 'w', long = "width", default_value_t = 720)]
    pub width: u32,

    /// Vertical resolution of the output grid, in projection units. Default
    /// is the WGS84 polar circumference divided by `2 * height`.
    #[arg(short = 'V', long = "vres", default_value_t = 0.0)]
    pub vres: f32,

    /// Horizontal resolution of the output grid, in projection units.
    /// Default is the WGS84 equatorial circumference divided by `width`.
    #[arg(short = 'H', long = "hres", default_value_t = 0.0)]
    pub hres: f32,

    /// Vertical position of the centre of the output grid
    #[arg(short = 'y', long = "central-y", default_value_t = 0.0)]
    pub central_y: f32,

    /// Horizontal position of the centre of the output grid
    #[arg(short = 'x', long = "central-x", default_value_t = 0.0)]
    pub central_x: f32,

    /// Vertical sampling box half-height; defaults to `vres`
    #[arg(short = 'S', long = "vsample", default_value_t = 0.0)]
    pub vsample: f32,

    /// Horizontal sampling box half-width; defaults to `hres`
    #[arg(short = 's', long = "hsample", default_value_t = 0.0)]
    pub hsample: f32,

    /// Choose the reduction function to use
    #[arg(short = 'r', long = "reduction-function", default_value = "mean")]
    pub reduction_function: String,

    /// Earliest time to select from
    #[arg(short = 'q', long = "time-min", default_value_t = f32::NEG_INFINITY)]
    pub time_min: f32,

    /// Latest time to select from
    #[arg(short = 'Q', long = "time-max", default_value_t = f32::INFINITY)]
    pub time_max: f32,

    // General
    /// Increase verbosity (stackable)
    #[arg(short = '+', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show this help message
    #[arg(short = '?', long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Validate the cross-field requirements §6.5 doesn't express as a
    /// single flag: geolocation inputs are required unless loading a
    /// pre-built index, and `--input-data`/`--output-data` are required
    /// together once either is requested.
    pub fn validate(&self) -> Result<()> {
        if self.load_index.is_none() && (self.input_lats.is_none() || self.input_lons.is_none()) {
            return Err(GridError::InvalidArguments(
                "unless loading a pre-generated index, --input-lats and --input-lons are required"
                    .to_string(),
            ));
        }

        let generating_image = self.input_data.is_some()
            || self.output_data.is_some()
            || self.output_lats.is_some()
            || self.output_lons.is_some();
        if generating_image && (self.input_data.is_none() || self.output_data.is_none()) {
            return Err(GridError::InvalidArguments(
                "when generating an image, --input-data and --output-data are required"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
