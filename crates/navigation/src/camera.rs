//! Camera placement in the physical SRS.
//!
//! The position describes an orbit: the camera looks at `point` from
//! `objective_distance` away, oriented by heading/pitch/roll relative to the
//! local north-east-down frame at that point.

use foundation::math::{ConvertError, Mat3, SrsKind, Vec3};
use terrain::ReferenceFrame;

use crate::convertor::CoordConvertor;
use crate::error::{DomainError, NavigationError};
use crate::position::Position;

/// Step used to probe the local north and east directions in geographic frames.
const PROBE_DISTANCE_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// Orbit centre.
    pub center: Vec3,
    /// Unit view direction.
    pub dir: Vec3,
    /// Unit up vector, orthogonal to `dir`.
    pub up: Vec3,
    pub eye: Vec3,
    pub objective_distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    Navigation(NavigationError),
    Domain(DomainError),
}

impl std::fmt::Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::Navigation(err) => write!(f, "{err}"),
            CameraError::Domain(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<NavigationError> for CameraError {
    fn from(err: NavigationError) -> Self {
        CameraError::Navigation(err)
    }
}

impl From<DomainError> for CameraError {
    fn from(err: DomainError) -> Self {
        CameraError::Domain(err)
    }
}

impl From<ConvertError> for CameraError {
    fn from(err: ConvertError) -> Self {
        CameraError::Domain(DomainError::Conversion(err))
    }
}

/// Distance from the orbit centre at which `view_extent` fills the vertical
/// field of view.
pub fn objective_distance(view_extent: f64, vertical_fov_deg: f64) -> f64 {
    view_extent * 0.5 / (vertical_fov_deg * 0.5).to_radians().tan()
}

/// View direction and up vector in local north-east-down coordinates.
///
/// Heading turns clockwise from north, pitch 270 looks straight down and
/// 360 at the horizon, roll turns `up` around the view direction.
pub fn local_orientation(orientation: Vec3) -> (Vec3, Vec3) {
    let (sin_yaw, cos_yaw) = orientation.x.to_radians().sin_cos();
    let (sin_pitch, cos_pitch) = orientation.y.to_radians().sin_cos();
    let dir = Vec3::new(cos_pitch * cos_yaw, cos_pitch * sin_yaw, -sin_pitch);
    let up = Vec3::new(-sin_pitch * cos_yaw, -sin_pitch * sin_yaw, -cos_pitch);
    let (sin_roll, cos_roll) = orientation.z.to_radians().sin_cos();
    let up = up * cos_roll + dir.cross(up) * sin_roll;
    (dir, up)
}

pub fn camera_frame(
    frame: &ReferenceFrame,
    convertor: &dyn CoordConvertor,
    position: &Position,
) -> Result<CameraFrame, CameraError> {
    let center_nav = position.point;
    let (north_nav, east_nav) = match frame.navigation_kind() {
        SrsKind::Projected => (
            center_nav + Vec3::new(0.0, 1.0, 0.0),
            center_nav + Vec3::new(1.0, 0.0, 0.0),
        ),
        SrsKind::Geographic => (
            convertor.geo_direct(center_nav, PROBE_DISTANCE_M, 0.0)?.0,
            convertor.geo_direct(center_nav, PROBE_DISTANCE_M, 90.0)?.0,
        ),
        SrsKind::Cartesian => return Err(NavigationError::CartesianNavigation.into()),
    };

    let center = convertor.nav_to_phys(center_nav)?;
    let n = (convertor.nav_to_phys(north_nav)? - center).normalize();
    let e = (convertor.nav_to_phys(east_nav)? - center).normalize();
    let d = n.cross(e).normalize();
    let e = d.cross(n).normalize();
    let ned = Mat3::from_columns(n, e, d);

    let (dir, up) = local_orientation(position.orientation);
    let dir = (ned * dir).normalize();
    let up = (ned * up).normalize();
    let distance = objective_distance(position.view_extent, position.vertical_fov);
    Ok(CameraFrame {
        center,
        dir,
        up,
        eye: center - dir * distance,
        objective_distance: distance,
    })
}
