//! Gesture scripts: timed input events replayed against a navigation.

use foundation::math::Vec3;
use navigation::{MotionProfile, Navigation, NavigationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Gesture {
    Pan { value: Vec3 },
    Rotate { value: Vec3 },
    Zoom { value: f64 },
    SetPoint {
        point: Vec3,
        #[serde(default)]
        profile: MotionProfile,
    },
    SetRotation {
        rotation: Vec3,
        #[serde(default)]
        profile: MotionProfile,
    },
    SetViewExtent {
        view_extent: f64,
        #[serde(default)]
        profile: MotionProfile,
    },
    ResetAltitude {
        #[serde(default)]
        offset: f64,
    },
    ResetGeographicMode,
}

impl Gesture {
    pub fn apply(&self, nav: &mut Navigation) -> Result<(), NavigationError> {
        match *self {
            Gesture::Pan { value } => nav.pan(value)?,
            Gesture::Rotate { value } => nav.rotate(value),
            Gesture::Zoom { value } => nav.zoom(value),
            Gesture::SetPoint { point, profile } => nav.set_point(point, profile),
            Gesture::SetRotation { rotation, profile } => nav.set_rotation(rotation, profile),
            Gesture::SetViewExtent {
                view_extent,
                profile,
            } => nav.set_view_extent(view_extent, profile),
            Gesture::ResetAltitude { offset } => nav.reset_position_altitude(offset),
            Gesture::ResetGeographicMode => nav.reset_geographic_mode(),
        }
        Ok(())
    }
}

/// A gesture fired on every frame in `[frame, frame + repeat)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub frame: u64,
    #[serde(default = "one")]
    pub repeat: u64,
    #[serde(flatten)]
    pub gesture: Gesture,
}

fn one() -> u64 {
    1
}

impl ScriptStep {
    pub fn active_at(&self, frame_no: u64) -> bool {
        frame_no >= self.frame && frame_no - self.frame < self.repeat
    }
}

/// Gestures to fire on `frame_no`, in script order.
pub fn gestures_at(script: &[ScriptStep], frame_no: u64) -> impl Iterator<Item = &Gesture> {
    script
        .iter()
        .filter(move |s| s.active_at(frame_no))
        .map(|s| &s.gesture)
}

/// A short orbit: drift east, zoom in, tilt, then fly back out.
pub fn demo_script() -> Vec<ScriptStep> {
    vec![
        ScriptStep {
            frame: 10,
            repeat: 60,
            gesture: Gesture::Pan {
                value: Vec3::new(-4.0, 0.0, 0.0),
            },
        },
        ScriptStep {
            frame: 80,
            repeat: 40,
            gesture: Gesture::Zoom { value: 60.0 },
        },
        ScriptStep {
            frame: 130,
            repeat: 30,
            gesture: Gesture::Rotate {
                value: Vec3::new(5.0, -3.0, 0.0),
            },
        },
        ScriptStep {
            frame: 200,
            repeat: 1,
            gesture: Gesture::SetViewExtent {
                view_extent: 2.0e6,
                profile: MotionProfile::FlyOver,
            },
        },
    ]
}
