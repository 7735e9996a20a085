use serde::{Deserialize, Serialize};

use crate::error::NavigationError;
use crate::position::{GeographicMode, MotionProfile};

/// Tunables read by the navigation on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    /// Fraction of the remaining distance kept per 1/60 s; `[0, 1)`.
    pub inertia_pan: f64,
    pub inertia_rotate: f64,
    pub inertia_zoom: f64,
    pub sensitivity_pan: f64,
    pub sensitivity_rotate: f64,
    pub sensitivity_zoom: f64,
    pub view_extent_min: f64,
    pub view_extent_max: f64,
    /// Latitude (degrees) beyond which dynamic mode gives up azimuthal orbiting.
    pub latitude_threshold: f64,
    /// Height samples per view extent; picks the terrain LOD for height queries.
    pub samples_per_view_extent: f64,
    pub geographic_mode: GeographicMode,
    pub motion_profile: MotionProfile,
    /// Heading drift in degrees per frame.
    pub auto_rotate: f64,
    /// Largest bearing change (degrees) a single pan may cause.
    pub pan_direction_limit: f64,
    /// Fly-over travel speed cap, in view extents per second.
    pub fly_over_speed: f64,
    /// Fly-over widens the view to `distance * ratio`.
    pub fly_over_extent_ratio: f64,
    /// Longest frame time (seconds) fed to the solver.
    pub max_frame_dt: f64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            inertia_pan: 0.8,
            inertia_rotate: 0.8,
            inertia_zoom: 0.8,
            sensitivity_pan: 1.0,
            sensitivity_rotate: 1.0,
            sensitivity_zoom: 1.0,
            view_extent_min: 75.0,
            view_extent_max: 10_000_000.0,
            latitude_threshold: 80.0,
            samples_per_view_extent: 8.0,
            geographic_mode: GeographicMode::Dynamic,
            motion_profile: MotionProfile::Quick,
            auto_rotate: 0.0,
            pan_direction_limit: 150.0,
            fly_over_speed: 1.5,
            fly_over_extent_ratio: 0.5,
            max_frame_dt: 0.1,
        }
    }
}

impl NavigationOptions {
    pub fn validate(&self) -> Result<(), NavigationError> {
        let inertia = [
            ("inertia_pan", self.inertia_pan),
            ("inertia_rotate", self.inertia_rotate),
            ("inertia_zoom", self.inertia_zoom),
        ];
        for (name, v) in inertia {
            if !(0.0..1.0).contains(&v) {
                return Err(invalid(format!("{name} must be in [0, 1), got {v}")));
            }
        }
        let positive = [
            ("sensitivity_pan", self.sensitivity_pan),
            ("sensitivity_rotate", self.sensitivity_rotate),
            ("sensitivity_zoom", self.sensitivity_zoom),
            ("view_extent_min", self.view_extent_min),
            ("samples_per_view_extent", self.samples_per_view_extent),
            ("fly_over_speed", self.fly_over_speed),
            ("fly_over_extent_ratio", self.fly_over_extent_ratio),
            ("max_frame_dt", self.max_frame_dt),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {v}")));
            }
        }
        if !(self.view_extent_max.is_finite() && self.view_extent_max >= self.view_extent_min) {
            return Err(invalid(format!(
                "view extent range [{}, {}] is empty",
                self.view_extent_min, self.view_extent_max
            )));
        }
        if !(self.latitude_threshold > 0.0 && self.latitude_threshold < 90.0) {
            return Err(invalid(format!(
                "latitude_threshold must be in (0, 90), got {}",
                self.latitude_threshold
            )));
        }
        if !(self.pan_direction_limit > 0.0 && self.pan_direction_limit <= 180.0) {
            return Err(invalid(format!(
                "pan_direction_limit must be in (0, 180], got {}",
                self.pan_direction_limit
            )));
        }
        if !self.auto_rotate.is_finite() {
            return Err(invalid("auto_rotate must be finite".to_string()));
        }
        Ok(())
    }

    pub fn clamp_view_extent(&self, v: f64) -> f64 {
        v.clamp(self.view_extent_min, self.view_extent_max)
    }
}

fn invalid(reason: String) -> NavigationError {
    NavigationError::InvalidOptions(reason)
}
