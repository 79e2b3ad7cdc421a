//! The projector external-collaborator interface (spec component B).
//!
//! The core never constructs a projector itself — callers supply a concrete
//! [`Projector`] implementation. One concrete implementation,
//! [`EquidistantCylindrical`], is provided so the crate is runnable
//! end-to-end without an external map-projection library; any other
//! projection (e.g. a PROJ.4-backed one) plugs in the same way.

use crate::error::{GridError, Result};

/// A bijective(ish) map between spherical (lon, lat, degrees) and planar
/// (x, y, projection units) coordinates, plus self-serialization.
///
/// Implementations must be safe to call `inverse_project`/`project`
/// concurrently from multiple threads (spec §5: "projector implementations
/// MUST treat their internal state as read-only after construction or use
/// interior synchronization").
pub trait Projector: Send + Sync {
    /// Forward-project a (longitude, latitude) pair in degrees into (x, y)
    /// projection units.
    fn project(&self, lon_deg: f32, lat_deg: f32) -> (f32, f32);

    /// Inverse-project an (y, x) pair in projection units back into
    /// (longitude, latitude) degrees.
    ///
    /// Argument order matches the source system (`y` before `x`) to avoid a
    /// silent transposition bug when porting call sites.
    fn inverse_project(&self, y: f32, x: f32) -> (f32, f32);

    /// The definition string this projector was constructed from, used for
    /// self-serialization into the index file format (spec §4.9).
    fn definition(&self) -> &str;
}

/// An equidistant cylindrical (plate carrée) projection over a given datum
/// radius, matching the CLI's default projection
/// (`+proj=eqc +datum=WGS84`).
#[derive(Debug, Clone)]
pub struct EquidistantCylindrical {
    definition: String,
    radius_m: f64,
}

/// WGS84 mean radius in metres, used by the default equidistant cylindrical
/// projection.
pub const WGS84_MEAN_RADIUS_M: f64 = 6_371_008.8;

impl EquidistantCylindrical {
    /// Construct the default WGS84 equidistant cylindrical projector.
    pub fn wgs84() -> Self {
        Self {
            definition: "+proj=eqc +datum=WGS84".to_string(),
            radius_m: WGS84_MEAN_RADIUS_M,
        }
    }

    /// Parse a `+proj=eqc +datum=WGS84`-style definition string.
    ///
    /// Only the equidistant cylindrical projection over WGS84 is
    /// recognised; anything else fails with [`GridError::InvalidProjection`]
    /// since the core treats general projection strings as opaque and
    /// delegates real projection math to an external collaborator.
    pub fn parse(definition: &str) -> Result<Self> {
        let has_eqc = definition.split_whitespace().any(|tok| tok == "+proj=eqc");
        if !has_eqc {
            return Err(GridError::InvalidProjection(format!(
                "unsupported projection definition: {definition}"
            )));
        }
        Ok(Self {
            definition: definition.to_string(),
            radius_m: WGS84_MEAN_RADIUS_M,
        })
    }
}

impl Projector for EquidistantCylindrical {
    fn project(&self, lon_deg: f32, lat_deg: f32) -> (f32, f32) {
        let x = (lon_deg as f64).to_radians() * self.radius_m;
        let y = (lat_deg as f64).to_radians() * self.radius_m;
        (x as f32, y as f32)
    }

    fn inverse_project(&self, y: f32, x: f32) -> (f32, f32) {
        let lon = (x as f64 / self.radius_m).to_degrees();
        let lat = (y as f64 / self.radius_m).to_degrees();
        (lon as f32, lat as f32)
    }

    fn definition(&self) -> &str {
        &self.definition
    }
}

/// Construct a boxed [`Projector`] from a definition string, as used by the
/// CLI's `--projection` flag.
pub fn from_definition(definition: &str) -> Result<Box<dyn Projector>> {
    Ok(Box::new(EquidistantCylindrical::parse(definition)?))
}
