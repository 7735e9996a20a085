//! Spatial reference systems and point conversion between them.
//!
//! Points are always `Vec3`:
//! - `Geographic`: `(lon_deg, lat_deg, ellipsoidal height m)`
//! - `Geocentric`: ECEF `(x, y, z)` meters
//! - `WebMercator`: spherical mercator `(x, y)` meters plus ellipsoidal height

use serde::{Deserialize, Serialize};

use super::{Geodetic, Vec3, WGS84_A, ecef_to_geodetic, geodetic_to_ecef};

/// Latitude limit of the square Web Mercator world.
pub const WEB_MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Coordinate system family.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SrsKind {
    Projected,
    Geographic,
    Cartesian,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Srs {
    Geographic,
    Geocentric,
    WebMercator,
}

impl Srs {
    pub fn kind(self) -> SrsKind {
        match self {
            Srs::Geographic => SrsKind::Geographic,
            Srs::Geocentric => SrsKind::Cartesian,
            Srs::WebMercator => SrsKind::Projected,
        }
    }

    /// Full extent of the periodic axis, if the system wraps around.
    pub fn natural_period(self) -> Option<f64> {
        match self {
            Srs::Geographic => Some(360.0),
            Srs::WebMercator => Some(2.0 * std::f64::consts::PI * WGS84_A),
            Srs::Geocentric => None,
        }
    }

    /// Ground length of one unit along the periodic axis at the equator.
    pub fn metres_per_unit(self) -> f64 {
        match self.natural_period() {
            Some(period) => 2.0 * std::f64::consts::PI * WGS84_A / period,
            None => 1.0,
        }
    }
}

impl std::fmt::Display for Srs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Srs::Geographic => "geographic",
            Srs::Geocentric => "geocentric",
            Srs::WebMercator => "web-mercator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    NonFinite,
    OutOfDomain { srs: Srs, reason: &'static str },
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::NonFinite => write!(f, "non-finite coordinate"),
            ConvertError::OutOfDomain { srs, reason } => {
                write!(f, "point outside the {srs} domain: {reason}")
            }
        }
    }
}

impl std::error::Error for ConvertError {}

/// Convert a point between two reference systems.
///
/// Same-system conversion is the identity and never fails on finite input.
pub fn convert(point: Vec3, from: Srs, to: Srs) -> Result<Vec3, ConvertError> {
    if !point.is_finite() {
        return Err(ConvertError::NonFinite);
    }
    if from == to {
        return Ok(point);
    }
    let geo = to_geodetic(point, from)?;
    from_geodetic(geo, to)
}

fn to_geodetic(p: Vec3, srs: Srs) -> Result<Geodetic, ConvertError> {
    match srs {
        Srs::Geographic => {
            if p.y.abs() > 90.0 {
                return Err(ConvertError::OutOfDomain {
                    srs,
                    reason: "latitude beyond a pole",
                });
            }
            Ok(Geodetic::from_degrees(p.y, p.x, p.z))
        }
        Srs::Geocentric => Ok(ecef_to_geodetic(p.into())),
        Srs::WebMercator => {
            let lat = 2.0 * (p.y / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2;
            Ok(Geodetic::new(lat, p.x / WGS84_A, p.z))
        }
    }
}

fn from_geodetic(geo: Geodetic, srs: Srs) -> Result<Vec3, ConvertError> {
    match srs {
        Srs::Geographic => Ok(Vec3::new(
            geo.lon_rad.to_degrees(),
            geo.lat_rad.to_degrees(),
            geo.alt_m,
        )),
        Srs::Geocentric => Ok(geodetic_to_ecef(geo).as_vec3()),
        Srs::WebMercator => {
            if geo.lat_rad.to_degrees().abs() >= 90.0 {
                return Err(ConvertError::OutOfDomain {
                    srs,
                    reason: "mercator is undefined at the poles",
                });
            }
            let y = WGS84_A * (std::f64::consts::FRAC_PI_4 + geo.lat_rad * 0.5).tan().ln();
            Ok(Vec3::new(WGS84_A * geo.lon_rad, y, geo.alt_m))
        }
    }
}
