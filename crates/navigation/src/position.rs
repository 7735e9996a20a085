use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Easing behaviour used to move the current state toward the target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionProfile {
    /// Exponential approach driven by the inertia factors.
    #[default]
    Quick,
    /// Jump to the target in a single frame.
    Instant,
    /// Like `Quick`, but widens the view and caps speed on long trips.
    FlyOver,
}

/// How horizontal motion is computed in geographic reference frames.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeographicMode {
    /// Per-axis longitude/latitude interpolation; orbit-like.
    Azimuthal,
    /// Geodesic bearing plus distance; compass-like, works over the poles.
    Free,
    /// Azimuthal until the camera gets close to a pole, then Free.
    #[default]
    Dynamic,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightMode {
    /// Elevation not yet tied to the terrain; pinned on the next update.
    Floating,
    #[default]
    Fixed,
}

/// Camera position as exposed to the host and the renderer.
///
/// `point` is in the navigation SRS. `orientation` is `(yaw, pitch, roll)`
/// in degrees: yaw clockwise from north, pitch 270 looks straight down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub point: Vec3,
    pub orientation: Vec3,
    pub view_extent: f64,
    pub vertical_fov: f64,
    pub height_mode: HeightMode,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            point: Vec3::ZERO,
            orientation: Vec3::new(0.0, 270.0, 0.0),
            view_extent: 1_000_000.0,
            vertical_fov: 45.0,
            height_mode: HeightMode::Fixed,
        }
    }
}
