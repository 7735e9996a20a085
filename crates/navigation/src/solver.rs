//! Perceptually invariant motion: how far the camera moves toward its target
//! in one frame.
//!
//! The solver works on scalar distances only, so the same easing applies to
//! projected and geographic frames. It never produces motion from zero input.

use foundation::math::Vec3;

use crate::options::NavigationOptions;
use crate::position::MotionProfile;

/// Frame rate the inertia factors are tuned for.
const REFERENCE_FPS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverInput {
    /// Remaining horizontal distance to the target (>= 0).
    pub horizontal_distance: f64,
    /// Signed remaining vertical distance to the target.
    pub vertical_change: f64,
    pub view_extent: f64,
    /// Signed remaining view extent change.
    pub view_extent_change: f64,
    pub rotation: Vec3,
    /// Pending rotation not yet applied.
    pub rotation_change: Vec3,
    /// Frame time in seconds.
    pub dt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOutput {
    /// Horizontal distance to travel this frame, toward the target.
    pub horizontal_move: f64,
    pub vertical_move: f64,
    /// New absolute view extent.
    pub view_extent: f64,
    /// New absolute rotation.
    pub rotation: Vec3,
}

/// Portion of the remaining distance covered during `dt`.
///
/// `inertia` is the fraction kept per reference frame, so the result does
/// not depend on the frame rate.
pub fn blend(inertia: f64, dt: f64) -> f64 {
    1.0 - inertia.powf(dt * REFERENCE_FPS)
}

pub fn navigation_solve(
    options: &NavigationOptions,
    profile: MotionProfile,
    input: &SolverInput,
) -> SolverOutput {
    match profile {
        MotionProfile::Instant => SolverOutput {
            horizontal_move: input.horizontal_distance,
            vertical_move: input.vertical_change,
            view_extent: input.view_extent + input.view_extent_change,
            rotation: input.rotation + input.rotation_change,
        },
        MotionProfile::Quick => {
            let pan = blend(options.inertia_pan, input.dt);
            SolverOutput {
                horizontal_move: input.horizontal_distance * pan,
                vertical_move: input.vertical_change * pan,
                view_extent: input.view_extent + input.view_extent_change * blend(options.inertia_zoom, input.dt),
                rotation: rotate(options, input),
            }
        }
        MotionProfile::FlyOver => fly_over(options, input),
    }
}

fn rotate(options: &NavigationOptions, input: &SolverInput) -> Vec3 {
    input.rotation + input.rotation_change * blend(options.inertia_rotate, input.dt)
}

/// Zoom out while far from the target, and cap the ground speed relative to
/// the visible extent so long trips take a bounded, extent-relative time.
fn fly_over(options: &NavigationOptions, input: &SolverInput) -> SolverOutput {
    let pan = blend(options.inertia_pan, input.dt);
    let target_extent = input.view_extent + input.view_extent_change;
    let travel_extent = (input.horizontal_distance * options.fly_over_extent_ratio).min(options.view_extent_max);
    let desired_extent = target_extent.max(travel_extent);
    let view_extent = input.view_extent + (desired_extent - input.view_extent) * blend(options.inertia_zoom, input.dt);

    let speed_limit = view_extent * options.fly_over_speed * input.dt;
    let horizontal_move = (input.horizontal_distance * pan).min(speed_limit);
    // Vertical motion follows the same progress as the horizontal one.
    let progress = if input.horizontal_distance > 0.0 {
        horizontal_move / input.horizontal_distance
    } else {
        pan
    };

    SolverOutput {
        horizontal_move,
        vertical_move: input.vertical_change * progress,
        view_extent,
        rotation: rotate(options, input),
    }
}

#[cfg(test)]
mod tests {
    use super::{SolverInput, blend, navigation_solve};
    use crate::options::NavigationOptions;
    use crate::position::MotionProfile;
    use foundation::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn input(horizontal: f64, vertical: f64, extent_change: f64) -> SolverInput {
        SolverInput {
            horizontal_distance: horizontal,
            vertical_change: vertical,
            view_extent: 1000.0,
            view_extent_change: extent_change,
            rotation: Vec3::new(10.0, 300.0, 0.0),
            rotation_change: Vec3::new(20.0, 0.0, 0.0),
            dt: 1.0 / 60.0,
        }
    }

    #[test]
    fn blend_is_frame_rate_independent() {
        assert_close(blend(0.8, 1.0 / 60.0), 0.2, 1e-12);
        let two_half_frames = 1.0 - (1.0 - blend(0.8, 1.0 / 120.0)).powi(2);
        assert_close(two_half_frames, 0.2, 1e-12);
        assert_eq!(blend(0.8, 0.0), 0.0);
    }

    #[test]
    fn instant_reaches_the_target() {
        let out = navigation_solve(&NavigationOptions::default(), MotionProfile::Instant, &input(500.0, -20.0, 250.0));
        assert_eq!(out.horizontal_move, 500.0);
        assert_eq!(out.vertical_move, -20.0);
        assert_eq!(out.view_extent, 1250.0);
        assert_eq!(out.rotation, Vec3::new(30.0, 300.0, 0.0));
    }

    #[test]
    fn quick_moves_by_inertia() {
        let out = navigation_solve(&NavigationOptions::default(), MotionProfile::Quick, &input(500.0, -20.0, 250.0));
        assert_close(out.horizontal_move, 100.0, 1e-9);
        assert_close(out.vertical_move, -4.0, 1e-9);
        assert_close(out.view_extent, 1050.0, 1e-9);
        assert_close(out.rotation.x, 14.0, 1e-9);
    }

    #[test]
    fn fly_over_widens_view_and_caps_speed() {
        let options = NavigationOptions::default();
        let out = navigation_solve(&options, MotionProfile::FlyOver, &input(1_000_000.0, 0.0, 0.0));
        assert!(out.view_extent > 1000.0);
        let cap = out.view_extent * options.fly_over_speed / 60.0;
        assert_close(out.horizontal_move, cap, 1e-9);
    }

    #[test]
    fn zero_input_is_a_fixed_point() {
        let mut rest = input(0.0, 0.0, 0.0);
        rest.rotation_change = Vec3::ZERO;
        for profile in [MotionProfile::Quick, MotionProfile::Instant, MotionProfile::FlyOver] {
            let out = navigation_solve(&NavigationOptions::default(), profile, &rest);
            assert_eq!(out.horizontal_move, 0.0);
            assert_eq!(out.vertical_move, 0.0);
            assert_eq!(out.view_extent, rest.view_extent);
            assert_eq!(out.rotation, rest.rotation);
        }
    }
}
