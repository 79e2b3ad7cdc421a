//! The output raster's geometry (spec component G): pixel size, sampling
//! box, and time window.

use crate::kdtree::Bounds;

/// A regular raster in projected coordinate space, plus the sampling box
/// used to query the index for each cell.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    pub vertical_resolution: f32,
    pub horizontal_resolution: f32,
    pub horizontal_sampling_offset: f32,
    pub vertical_sampling_offset: f32,
    pub central_x: f32,
    pub central_y: f32,
    pub time_min: f32,
    pub time_max: f32,
}

impl Grid {
    /// Construct a grid. When `hsample`/`vsample` are `0.0`, the sampling
    /// half-width defaults to half the corresponding resolution; the time
    /// window defaults to `(-inf, +inf)`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: u32,
        height: u32,
        vertical_resolution: f32,
        horizontal_resolution: f32,
        vsample: f32,
        hsample: f32,
        central_x: f32,
        central_y: f32,
    ) -> Self {
        let horizontal_sampling_offset = if hsample == 0.0 {
            horizontal_resolution / 2.0
        } else {
            hsample / 2.0
        };
        let vertical_sampling_offset = if vsample == 0.0 {
            vertical_resolution / 2.0
        } else {
            vsample / 2.0
        };

        Self {
            width,
            height,
            vertical_resolution,
            horizontal_resolution,
            horizontal_sampling_offset,
            vertical_sampling_offset,
            central_x,
            central_y,
            time_min: f32::NEG_INFINITY,
            time_max: f32::INFINITY,
        }
    }

    pub fn set_time_constraints(&mut self, min: f32, max: f32) {
        self.time_min = min;
        self.time_max = max;
    }

    /// The projected coordinates of the grid's bottom-left corner, from
    /// which every cell centre is offset.
    fn origin(&self) -> (f32, f32) {
        let x0 = self.central_x - (self.width as f32 / 2.0) * self.horizontal_resolution;
        let y0 = self.central_y - (self.height as f32 / 2.0) * self.vertical_resolution;
        (x0, y0)
    }

    /// The projected (x, y) centre of pixel `(u, v)`.
    pub fn cell_centre(&self, u: u32, v: u32) -> (f32, f32) {
        let (x0, y0) = self.origin();
        let x = x0 + (u as f32 + 0.5) * self.horizontal_resolution;
        let y = y0 + (v as f32 + 0.5) * self.vertical_resolution;
        (x, y)
    }

    /// The sampling box and time window to query the index with for pixel
    /// `(u, v)`.
    pub fn cell_bounds(&self, u: u32, v: u32) -> Bounds {
        let (cx, cy) = self.cell_centre(u, v);
        Bounds {
            x: (cx - self.horizontal_sampling_offset, cx + self.horizontal_sampling_offset),
            y: (cy - self.vertical_sampling_offset, cy + self.vertical_sampling_offset),
            t: (self.time_min, self.time_max),
        }
    }

    /// The output-buffer row-major index for pixel `(u, v)`, with row 0
    /// being the northernmost row of the raster.
    pub fn output_index(&self, u: u32, v: u32) -> usize {
        ((self.height - v - 1) * self.width + u) as usize
    }

    pub fn num_cells(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
