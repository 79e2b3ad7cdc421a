//! Coordinate reader (spec component C): a lazy, finite stream of projected
//! `(x, y, t)` triples read from three parallel binary files of 32-bit
//! floats.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{GridError, Result};
use crate::projector::Projector;

/// A lazy, finite source of `(x, y, t)` triples, already forward-projected.
pub trait CoordinateReader {
    /// The fixed number of records this reader will produce.
    fn num_records(&self) -> u32;

    /// Read the next record, or `Ok(None)` once `num_records` have been
    /// produced. A non-finite latitude, longitude, or time is fatal
    /// (`NonFiniteCoordinate`), not a skipped record.
    fn read(&mut self) -> Result<Option<(f32, f32, f32)>>;
}

pub(crate) fn mmap_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    // SAFETY: the mapped files are treated as read-only for the lifetime of
    // the reader; the caller is responsible for not mutating them
    // concurrently, which holds for the CLI's batch-job usage.
    unsafe { Mmap::map(&file) }.map_err(|source| GridError::IoFailure {
        path: path.display().to_string(),
        source,
    })
}

/// The default raw-file-backed [`CoordinateReader`]: three memory-mapped
/// streams of little-endian 32-bit floats (latitude, longitude, optional
/// time), each the same byte length and a multiple of 4.
pub struct RawFileCoordinateReader {
    lat: Mmap,
    lon: Mmap,
    time: Option<Mmap>,
    num_records: u32,
    current: u32,
    projector: Box<dyn Projector>,
}

impl RawFileCoordinateReader {
    /// Open latitude/longitude files (and an optional time file), validating
    /// that their byte lengths agree and are multiples of 4.
    pub fn open(
        lat_path: &Path,
        lon_path: &Path,
        time_path: Option<&Path>,
        projector: Box<dyn Projector>,
    ) -> Result<Self> {
        let lat = mmap_file(lat_path)?;
        let lon = mmap_file(lon_path)?;
        let time = time_path.map(mmap_file).transpose()?;

        if lat.len() != lon.len() {
            return Err(GridError::InvalidArguments(format!(
                "latitude file ({} bytes) and longitude file ({} bytes) differ in length",
                lat.len(),
                lon.len()
            )));
        }
        if let Some(time) = &time {
            if time.len() != lat.len() {
                return Err(GridError::InvalidArguments(format!(
                    "time file ({} bytes) does not match geolocation file length ({} bytes)",
                    time.len(),
                    lat.len()
                )));
            }
        }
        if lat.len() % 4 != 0 {
            return Err(GridError::InvalidArguments(format!(
                "geolocation file length ({} bytes) is not a multiple of 4",
                lat.len()
            )));
        }

        let num_records = (lat.len() / 4) as u32;
        Ok(Self {
            lat,
            lon,
            time,
            num_records,
            current: 0,
            projector,
        })
    }

    fn read_f32(buf: &[u8], index: u32) -> f32 {
        let start = index as usize * 4;
        f32::from_le_bytes(buf[start..start + 4].try_into().unwrap())
    }
}

impl CoordinateReader for RawFileCoordinateReader {
    fn num_records(&self) -> u32 {
        self.num_records
    }

    fn read(&mut self) -> Result<Option<(f32, f32, f32)>> {
        if self.current >= self.num_records {
            return Ok(None);
        }
        let lat = Self::read_f32(&self.lat, self.current);
        let lon = Self::read_f32(&self.lon, self.current);
        let t = self
            .time
            .as_ref()
            .map(|buf| Self::read_f32(buf, self.current))
            .unwrap_or(0.0);

        if !lat.is_finite() || !lon.is_finite() || !t.is_finite() {
            return Err(GridError::NonFiniteCoordinate {
                index: self.current as u64,
                lat,
                lon,
                t,
            });
        }

        let (x, y) = self.projector.project(lon, lat);
        self.current += 1;
        Ok(Some((x, y, t)))
    }
}

/// Paths used to construct a [`RawFileCoordinateReader`], as taken directly
/// from the CLI's `--input-lats`/`--input-lons`/`--input-time` flags.
#[derive(Debug, Clone)]
pub struct GeolocationPaths {
    pub lat: PathBuf,
    pub lon: PathBuf,
    pub time: Option<PathBuf>,
}
