//! Coordinate adapter used by the navigation.
//!
//! Navigation points are in the reference frame's navigation SRS; geodesy is
//! always solved on the WGS84 ellipsoid, whatever the navigation SRS is.

use foundation::math::{
    ConvertError, GeodesicInverse, Srs, Vec3, convert, geodesic_direct, geodesic_inverse,
};
use terrain::ReferenceFrame;

/// Operations the navigation needs from a coordinate conversion library.
///
/// Implementations must be free of side effects apart from internal caching.
/// Out-of-domain input is reported as an error, never a panic.
pub trait CoordConvertor {
    /// Distance and both azimuths of the geodesic from `a` to `b`.
    fn geo_inverse(&self, a: Vec3, b: Vec3) -> Result<GeodesicInverse, ConvertError>;
    /// Point reached from `a` after `distance` meters along `azimuth`, plus
    /// the forward azimuth on arrival. The height of `a` is kept.
    fn geo_direct(&self, a: Vec3, distance: f64, azimuth: f64) -> Result<(Vec3, f64), ConvertError>;
    /// Great-circle arc between `a` and `b` in degrees.
    fn geo_arc_dist(&self, a: Vec3, b: Vec3) -> Result<f64, ConvertError>;
    fn nav_to_phys(&self, p: Vec3) -> Result<Vec3, ConvertError>;
    fn phys_to_nav(&self, p: Vec3) -> Result<Vec3, ConvertError>;
    fn convert(&self, p: Vec3, from: Srs, to: Srs) -> Result<Vec3, ConvertError>;
}

/// Adapter over the built-in SRS conversions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrsConvertor {
    navigation: Srs,
    physical: Srs,
}

impl SrsConvertor {
    pub fn new(navigation: Srs, physical: Srs) -> Self {
        Self {
            navigation,
            physical,
        }
    }

    pub fn for_frame(frame: &ReferenceFrame) -> Self {
        Self::new(frame.navigation_srs, frame.physical_srs)
    }

    fn to_lon_lat(&self, p: Vec3) -> Result<Vec3, ConvertError> {
        convert(p, self.navigation, Srs::Geographic)
    }
}

impl CoordConvertor for SrsConvertor {
    fn geo_inverse(&self, a: Vec3, b: Vec3) -> Result<GeodesicInverse, ConvertError> {
        let (a, b) = (self.to_lon_lat(a)?, self.to_lon_lat(b)?);
        let inv = geodesic_inverse(a.y, a.x, b.y, b.x);
        if !(inv.distance_m.is_finite() && inv.azimuth1_deg.is_finite() && inv.azimuth2_deg.is_finite()) {
            return Err(ConvertError::NonFinite);
        }
        Ok(inv)
    }

    fn geo_direct(&self, a: Vec3, distance: f64, azimuth: f64) -> Result<(Vec3, f64), ConvertError> {
        if !(distance.is_finite() && azimuth.is_finite()) {
            return Err(ConvertError::NonFinite);
        }
        let start = self.to_lon_lat(a)?;
        let dst = geodesic_direct(start.y, start.x, azimuth, distance);
        let end = Vec3::new(dst.lon_deg, dst.lat_deg, start.z);
        Ok((convert(end, Srs::Geographic, self.navigation)?, dst.azimuth2_deg))
    }

    fn geo_arc_dist(&self, a: Vec3, b: Vec3) -> Result<f64, ConvertError> {
        Ok(self.geo_inverse(a, b)?.arc_deg)
    }

    fn nav_to_phys(&self, p: Vec3) -> Result<Vec3, ConvertError> {
        convert(p, self.navigation, self.physical)
    }

    fn phys_to_nav(&self, p: Vec3) -> Result<Vec3, ConvertError> {
        convert(p, self.physical, self.navigation)
    }

    fn convert(&self, p: Vec3, from: Srs, to: Srs) -> Result<Vec3, ConvertError> {
        convert(p, from, to)
    }
}
