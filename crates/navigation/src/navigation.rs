//! Navigation state machine.
//!
//! Input handlers only touch *target* values. [`Navigation::update`] runs
//! once per frame: it applies resolved terrain heights, eases the current
//! position toward the target through the motion solver, keeps angles and
//! coordinates in range and queues a new height lookup for the result.

use foundation::math::{Mat3, SrsKind, Vec3, angular_diff, modulo, normalize_angle};
use terrain::{ReferenceFrame, TerrainTree, Validity};
use tracing::{debug, warn};

use crate::camera::{CameraError, CameraFrame, camera_frame};
use crate::convertor::{CoordConvertor, SrsConvertor};
use crate::error::NavigationError;
use crate::height::{HeightContext, HeightQueue, HeightRequest};
use crate::options::NavigationOptions;
use crate::position::{GeographicMode, HeightMode, MotionProfile, Position};
use crate::solver::{SolverInput, navigation_solve};
use crate::statistics::NavigationStatistics;

/// Pitch range that keeps the camera between straight down and just above
/// the horizon.
pub const PITCH_MIN: f64 = 270.0;
pub const PITCH_MAX: f64 = 350.0;

/// Pan gesture units per view extent.
const PAN_SCALE: f64 = 800.0;

/// Zoom factor per gesture unit.
const ZOOM_BASE: f64 = 1.001;

/// Per-axis weights of a rotate gesture (yaw, pitch, roll).
const ROTATE_WEIGHTS: Vec3 = Vec3 {
    x: 0.2,
    y: -0.1,
    z: 0.2,
};

/// Dynamic mode switches to Free slightly before reaching the threshold, so
/// a target clamped exactly onto it still counts.
const POLE_SWITCH_EPSILON: f64 = 1e-5;

/// Target side of the camera plus the pending height lookups.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub target_point: Vec3,
    pub target_view_extent: f64,
    pub change_rotation: Vec3,
    /// Degrees of heading added every frame.
    pub auto_rotation: f64,
    pub geographic_mode: GeographicMode,
    pub motion_profile: MotionProfile,
    /// Last terrain height applied to the target; later heights shift the
    /// target by their difference to it.
    pub last_vertical_shift: Option<f64>,
    pub height_queue: HeightQueue,
}

pub struct Navigation {
    options: NavigationOptions,
    frame: ReferenceFrame,
    convertor: Box<dyn CoordConvertor>,
    position: Position,
    state: NavigationState,
    statistics: NavigationStatistics,
}

impl std::fmt::Debug for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigation")
            .field("options", &self.options)
            .field("frame", &self.frame)
            .field("position", &self.position)
            .field("state", &self.state)
            .field("statistics", &self.statistics)
            .finish_non_exhaustive()
    }
}

impl Navigation {
    /// Navigation with the built-in SRS conversions of `frame`.
    pub fn new(
        options: NavigationOptions,
        frame: ReferenceFrame,
        position: Position,
    ) -> Result<Self, NavigationError> {
        let convertor = Box::new(SrsConvertor::for_frame(&frame));
        Self::with_convertor(options, frame, position, convertor)
    }

    pub fn with_convertor(
        options: NavigationOptions,
        frame: ReferenceFrame,
        mut position: Position,
        convertor: Box<dyn CoordConvertor>,
    ) -> Result<Self, NavigationError> {
        options.validate()?;
        if frame.navigation_kind() == SrsKind::Cartesian {
            return Err(NavigationError::CartesianNavigation);
        }
        position.orientation = position.orientation.map(normalize_angle);
        let state = NavigationState {
            target_point: position.point,
            target_view_extent: position.view_extent,
            change_rotation: Vec3::ZERO,
            auto_rotation: options.auto_rotate,
            geographic_mode: GeographicMode::Azimuthal,
            motion_profile: options.motion_profile,
            last_vertical_shift: None,
            height_queue: HeightQueue::new(),
        };
        let mut nav = Self {
            options,
            frame,
            convertor,
            position,
            state,
            statistics: NavigationStatistics::default(),
        };
        nav.reset_geographic_mode();
        Ok(nav)
    }

    pub fn options(&self) -> &NavigationOptions {
        &self.options
    }

    /// Replace the options; takes effect on the next call.
    pub fn set_options(&mut self, options: NavigationOptions) -> Result<(), NavigationError> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn statistics(&self) -> &NavigationStatistics {
        &self.statistics
    }

    pub fn convertor(&self) -> &dyn CoordConvertor {
        self.convertor.as_ref()
    }

    /// Physical-space camera for the current position.
    pub fn camera(&self) -> Result<CameraFrame, CameraError> {
        camera_frame(&self.frame, self.convertor.as_ref(), &self.position)
    }

    /// Back to the configured geographic mode; dynamic starts as azimuthal.
    pub fn reset_geographic_mode(&mut self) {
        self.state.geographic_mode = match self.options.geographic_mode {
            GeographicMode::Dynamic => GeographicMode::Azimuthal,
            mode => mode,
        };
    }

    fn navigation_kind(&self) -> Result<SrsKind, NavigationError> {
        match self.frame.navigation_kind() {
            SrsKind::Cartesian => Err(NavigationError::CartesianNavigation),
            kind => Ok(kind),
        }
    }

    fn interacted(&mut self) {
        self.state.auto_rotation = 0.0;
        self.state.motion_profile = self.options.motion_profile;
    }

    /// Move the target by a screen-space gesture `(x, y, vertical)`.
    ///
    /// The move scales with the view extent and follows the camera heading.
    /// Geographic pans that would swing the direction by more than the
    /// configured limit (crossing a pole) are dropped.
    pub fn pan(&mut self, value: Vec3) -> Result<(), NavigationError> {
        let kind = self.navigation_kind()?;
        let mode = self.state.geographic_mode;
        let pos = &self.position;

        let mut h = 1.0;
        if kind == SrsKind::Geographic && mode == GeographicMode::Azimuthal {
            // Slower pan near the poles.
            h = pos.point.y.to_radians().cos();
        }
        let v = pos.view_extent / PAN_SCALE;
        let scale = Vec3::new(-2.0 * v * h, 2.0 * v, 2.0) * self.options.sensitivity_pan;
        let mut movement = value.mul_elem(scale);

        let mut azimuth = pos.orientation.x;
        if kind == SrsKind::Geographic && mode == GeographicMode::Free {
            // Heading relative to the pending target, not the stale one.
            match self.convertor.geo_inverse(pos.point, self.state.target_point) {
                Ok(inv) if inv.distance_m > 0.0 => azimuth += inv.azimuth2_deg - inv.azimuth1_deg,
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "pan ignored: heading to target unavailable");
                    return Ok(());
                }
            }
        }
        movement = Mat3::rotation(2, -azimuth) * movement;

        match kind {
            SrsKind::Projected => self.state.target_point += movement,
            SrsKind::Geographic => self.pan_geographic(movement, mode)?,
            SrsKind::Cartesian => return Err(NavigationError::CartesianNavigation),
        }
        self.interacted();
        Ok(())
    }

    fn pan_geographic(&mut self, movement: Vec3, mode: GeographicMode) -> Result<(), NavigationError> {
        let bearing = movement.x.atan2(movement.y).to_degrees();
        let distance = movement.xy().length();
        let mut p = match self.convertor.geo_direct(self.state.target_point, distance, bearing) {
            Ok((p, _)) => p,
            Err(err) => {
                warn!(%err, "pan ignored: geodesic step failed");
                return Ok(());
            }
        };
        p.z += movement.z;

        let current = self.position.point;
        let limit = self.options.pan_direction_limit;
        let accept = match mode {
            GeographicMode::Azimuthal => angular_diff(current.x, p.x).abs() < limit,
            GeographicMode::Free => match self.convertor.geo_arc_dist(current, p) {
                Ok(arc) => arc < limit,
                Err(err) => {
                    warn!(%err, "pan ignored: arc distance unavailable");
                    false
                }
            },
            GeographicMode::Dynamic => return Err(NavigationError::UnresolvedGeographicMode),
        };
        if accept {
            self.state.target_point = p;
        } else {
            debug!(lon = p.x, lat = p.y, "pan dropped: direction change too large");
        }
        Ok(())
    }

    /// Accumulate a rotate gesture `(yaw, pitch, roll)`.
    pub fn rotate(&mut self, value: Vec3) {
        self.state.change_rotation += value.mul_elem(ROTATE_WEIGHTS * self.options.sensitivity_rotate);
        if self.options.geographic_mode == GeographicMode::Dynamic
            && self.state.geographic_mode != GeographicMode::Free
        {
            debug!("geographic mode: free (rotation)");
            self.state.geographic_mode = GeographicMode::Free;
        }
        self.interacted();
    }

    /// Positive values zoom in.
    pub fn zoom(&mut self, value: f64) {
        let c = value * self.options.sensitivity_zoom;
        self.state.target_view_extent *= ZOOM_BASE.powf(-c);
        self.interacted();
    }

    /// Set the target point. `Instant` teleports: pending height lookups for
    /// the old location are dropped together with the height baseline.
    pub fn set_point(&mut self, point: Vec3, profile: MotionProfile) {
        if !point.is_finite() {
            warn!(?point, "set_point ignored: non-finite point");
            return;
        }
        self.state.target_point = point;
        self.state.auto_rotation = 0.0;
        self.state.motion_profile = profile;
        if profile == MotionProfile::Instant {
            self.state.last_vertical_shift = None;
            self.state.height_queue.clear();
        }
    }

    /// Rotate toward `euler` along the shortest way on every axis.
    pub fn set_rotation(&mut self, euler: Vec3, profile: MotionProfile) {
        let current = self.position.orientation;
        self.state.change_rotation = Vec3::new(
            angular_diff(current.x, euler.x),
            angular_diff(current.y, euler.y),
            angular_diff(current.z, euler.z),
        );
        self.state.auto_rotation = 0.0;
        self.state.motion_profile = profile;
    }

    pub fn set_view_extent(&mut self, view_extent: f64, profile: MotionProfile) {
        self.state.target_view_extent = view_extent;
        self.state.auto_rotation = 0.0;
        self.state.motion_profile = profile;
    }

    /// Put the target at `offset` above the terrain under the camera, once
    /// the terrain height there is known.
    pub fn reset_position_altitude(&mut self, offset: f64) {
        self.state.target_point.z = 0.0;
        self.state.last_vertical_shift = None;
        self.state.height_queue.clear();
        self.state
            .height_queue
            .push(HeightRequest::with_reset_offset(self.position.point.xy(), offset));
    }

    /// Advance the camera by one frame.
    ///
    /// - `dt`: Time since the previous frame in seconds.
    /// - `tree`: Terrain used for height lookups; only load requests are issued.
    pub fn update<T: TerrainTree + ?Sized>(&mut self, dt: f64, tree: &mut T) -> Result<(), NavigationError> {
        let kind = self.navigation_kind()?;
        // Cap to avoid large jumps.
        let dt = if dt.is_finite() { dt.clamp(0.0, self.options.max_frame_dt) } else { 0.0 };

        self.process_height_queue(tree);

        let mut p = self.position.point;
        let mut r = self.position.orientation;

        if self.position.height_mode == HeightMode::Floating {
            self.position.height_mode = HeightMode::Fixed;
            self.reset_position_altitude(p.z);
        }

        self.state.target_view_extent = self.options.clamp_view_extent(self.state.target_view_extent);

        if kind == SrsKind::Geographic {
            self.update_geographic_mode();
        }

        self.state.change_rotation.x += self.state.auto_rotation;

        // Inputs for the solver.
        let mut azimuth1 = f64::NAN;
        let horizontal1 = match kind {
            SrsKind::Projected => (self.state.target_point.xy() - p.xy()).length(),
            SrsKind::Geographic => match self.convertor.geo_inverse(p, self.state.target_point) {
                Ok(inv) => {
                    azimuth1 = inv.azimuth1_deg;
                    inv.distance_m
                }
                Err(err) => {
                    warn!(%err, "horizontal move skipped: geodesic inverse failed");
                    0.0
                }
            },
            SrsKind::Cartesian => return Err(NavigationError::CartesianNavigation),
        };
        let input = SolverInput {
            horizontal_distance: horizontal1,
            vertical_change: self.state.target_point.z - p.z,
            view_extent: self.position.view_extent,
            view_extent_change: self.state.target_view_extent - self.position.view_extent,
            rotation: r,
            rotation_change: self.state.change_rotation,
            dt,
        };
        let out = navigation_solve(&self.options, self.state.motion_profile, &input);

        p.z += out.vertical_move;
        self.state.change_rotation -= out.rotation - r;
        r = out.rotation;
        let mut view_extent = out.view_extent;

        if horizontal1 > 0.0 {
            let ratio = out.horizontal_move / horizontal1;
            let target = self.state.target_point;
            match kind {
                SrsKind::Projected => {
                    if ratio >= 1.0 {
                        p.x = target.x;
                        p.y = target.y;
                    } else {
                        p.x += (target.x - p.x) * ratio;
                        p.y += (target.y - p.y) * ratio;
                    }
                }
                SrsKind::Geographic => match self.state.geographic_mode {
                    GeographicMode::Free => {
                        match self.convertor.geo_direct(p, out.horizontal_move, azimuth1) {
                            Ok((np, azimuth2)) => {
                                p.x = np.x;
                                p.y = np.y;
                                r.x += azimuth2 - azimuth1;
                            }
                            Err(err) => warn!(%err, "horizontal move skipped: geodesic direct failed"),
                        }
                    }
                    GeographicMode::Azimuthal => {
                        p.x += angular_diff(p.x, target.x) * ratio.min(1.0);
                        p.y += angular_diff(p.y, target.y) * ratio.min(1.0);
                    }
                    GeographicMode::Dynamic => return Err(NavigationError::UnresolvedGeographicMode),
                },
                SrsKind::Cartesian => return Err(NavigationError::CartesianNavigation),
            }
        }

        self.apply_periodicity(kind, &mut p);

        r = r.map(normalize_angle);
        r.y = r.y.clamp(PITCH_MIN, PITCH_MAX);

        self.check_invariants(kind, &mut p, &mut r, &mut view_extent);

        self.state.height_queue.push(HeightRequest::new(p.xy()));

        self.position.point = p;
        self.position.orientation = r;
        self.position.view_extent = view_extent;
        Ok(())
    }

    fn update_geographic_mode(&mut self) {
        let threshold = self.options.latitude_threshold;
        if self.options.geographic_mode == GeographicMode::Dynamic {
            // Too close to a pole for azimuthal orbiting.
            if self.state.geographic_mode != GeographicMode::Free
                && self.state.target_point.y.abs() > threshold - POLE_SWITCH_EPSILON
            {
                debug!(lat = self.state.target_point.y, "geographic mode: free (near pole)");
                self.state.geographic_mode = GeographicMode::Free;
            }
        } else {
            self.state.geographic_mode = self.options.geographic_mode;
        }
        if self.state.geographic_mode == GeographicMode::Azimuthal {
            self.state.target_point.y = self.state.target_point.y.clamp(-threshold, threshold);
        }
    }

    /// Wrap the position into the primary period and drag the target along.
    fn apply_periodicity(&mut self, kind: SrsKind, p: &mut Vec3) {
        let before = *p;
        match kind {
            SrsKind::Projected => {
                if let Some(periodicity) = self.frame.periodicity {
                    let half = periodicity.period * 0.5;
                    let value = match periodicity.axis.index() {
                        0 => &mut p.x,
                        _ => &mut p.y,
                    };
                    *value = modulo(*value + half, periodicity.period) - half;
                }
            }
            SrsKind::Geographic => p.x = modulo(p.x + 180.0, 360.0) - 180.0,
            SrsKind::Cartesian => {}
        }
        self.state.target_point += *p - before;
    }

    /// Corrective clamps for states the update should never produce.
    fn check_invariants(&mut self, kind: SrsKind, p: &mut Vec3, r: &mut Vec3, view_extent: &mut f64) {
        let mut corrections = 0u64;

        if !p.is_finite() {
            warn!(?p, "non-finite position; keeping the previous one");
            *p = self.position.point;
            self.state.target_point = *p;
            corrections += 1;
        }
        let clamped = self.options.clamp_view_extent(*view_extent);
        if clamped != *view_extent || !view_extent.is_finite() {
            warn!(view_extent = *view_extent, "view extent out of range");
            *view_extent = if clamped.is_finite() { clamped } else { self.position.view_extent };
            corrections += 1;
        }
        for angle in [&mut r.x, &mut r.y, &mut r.z] {
            if !(0.0..360.0).contains(&*angle) {
                warn!(angle = *angle, "rotation angle out of range");
                *angle = if angle.is_finite() { normalize_angle(*angle) } else { 0.0 };
                corrections += 1;
            }
        }
        if kind == SrsKind::Geographic {
            if !(-180.0..=180.0).contains(&p.x) {
                warn!(lon = p.x, "longitude out of range");
                p.x = modulo(p.x + 180.0, 360.0) - 180.0;
                corrections += 1;
            }
            if !(-90.0..=90.0).contains(&p.y) {
                warn!(lat = p.y, "latitude out of range");
                p.y = p.y.clamp(-90.0, 90.0);
                corrections += 1;
            }
        }
        self.statistics.invariant_corrections += corrections;
    }

    /// One step of the front height request; apply its result if it is done.
    fn process_height_queue<T: TerrainTree + ?Sized>(&mut self, tree: &mut T) {
        let ctx = HeightContext {
            frame: &self.frame,
            convertor: self.convertor.as_ref(),
            samples_per_view_extent: self.options.samples_per_view_extent,
            view_extent: self.position.view_extent,
        };
        let Some(task) = self.state.height_queue.front_mut() else {
            return;
        };
        let validity = task.process(&ctx, tree);
        if let Some(lod) = task.sampling_lod() {
            self.statistics.last_height_request_lod = Some(lod);
        }
        let (height, reset_offset) = match validity {
            Validity::Indeterminate => {
                self.statistics.height_request_pending_frames += 1;
                return;
            }
            Validity::Invalid => {
                self.state.height_queue.pop_front();
                self.statistics.height_requests_abandoned += 1;
                return;
            }
            Validity::Valid => match task.result() {
                Some(h) => (h, task.reset_offset()),
                None => {
                    self.state.height_queue.pop_front();
                    return;
                }
            },
        };
        self.state.height_queue.pop_front();
        self.statistics.height_requests_resolved += 1;

        let target = &mut self.state.target_point;
        if let Some(offset) = reset_offset {
            target.z = height + offset;
        } else if let Some(last) = self.state.last_vertical_shift {
            target.z += height - last;
        }
        self.state.last_vertical_shift = Some(height);
        debug!(height, target_z = target.z, "terrain height applied");
    }
}

#[cfg(test)]
mod tests {
    use super::{Navigation, PITCH_MAX, PITCH_MIN};
    use crate::error::NavigationError;
    use crate::height::HEIGHT_QUEUE_CAPACITY;
    use crate::options::NavigationOptions;
    use crate::position::{GeographicMode, HeightMode, MotionProfile, Position};
    use foundation::bounds::Aabb2;
    use foundation::math::{Srs, Vec3, angular_diff, normalize_angle};
    use pretty_assertions::assert_eq;
    use terrain::{DivisionNode, Partitioning, PeriodicAxis, Periodicity, ReferenceFrame, TileId, TileTree};

    const DT: f64 = 1.0 / 60.0;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    /// Flat 1000 x 1000 world centred at the origin, wrapping in x.
    fn square_frame() -> ReferenceFrame {
        ReferenceFrame {
            navigation_srs: Srs::WebMercator,
            physical_srs: Srs::Geocentric,
            periodicity: Some(Periodicity {
                axis: PeriodicAxis::X,
                period: 1000.0,
            }),
            division: vec![DivisionNode {
                id: TileId::root(),
                srs: Srs::WebMercator,
                extents: Aabb2::new([-500.0, -500.0], [500.0, 500.0]),
                partitioning: Partitioning::Bisection,
            }],
        }
    }

    fn position(point: Vec3, view_extent: f64) -> Position {
        Position {
            point,
            view_extent,
            ..Position::default()
        }
    }

    /// Terrain with a single loaded tile of constant height.
    fn flat_terrain(height: f64) -> TileTree {
        let mut tree = TileTree::new();
        let root = tree.set_root(TileId::root());
        tree.mark_valid(root, height);
        tree
    }

    fn set_height(tree: &mut TileTree, height: f64) {
        let root = tree.find(TileId::root()).unwrap();
        tree.set_surrogate(root, height);
    }

    #[test]
    fn cartesian_navigation_is_fatal() {
        let mut frame = ReferenceFrame::geographic();
        frame.navigation_srs = Srs::Geocentric;
        let err = Navigation::new(NavigationOptions::default(), frame, Position::default()).unwrap_err();
        assert_eq!(err, NavigationError::CartesianNavigation);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = NavigationOptions {
            inertia_pan: 1.5,
            ..NavigationOptions::default()
        };
        let err = Navigation::new(options, ReferenceFrame::geographic(), Position::default());
        assert!(matches!(err, Err(NavigationError::InvalidOptions(_))));
    }

    #[test]
    fn initialisation_normalises_and_resolves_mode() {
        let pos = Position {
            orientation: Vec3::new(-90.0, 630.0, 360.0),
            ..position(Vec3::new(14.0, 50.0, 0.0), 5000.0)
        };
        let nav = Navigation::new(NavigationOptions::default(), ReferenceFrame::geographic(), pos).unwrap();
        assert_eq!(nav.position().orientation, Vec3::new(270.0, 270.0, 0.0));
        assert_eq!(nav.state().geographic_mode, GeographicMode::Azimuthal);
        assert_eq!(nav.state().target_view_extent, 5000.0);
        assert_eq!(nav.state().target_point, Vec3::new(14.0, 50.0, 0.0));
    }

    #[test]
    fn rest_is_a_fixed_point() {
        let pos = position(Vec3::new(14.0, 50.0, 1000.0), 20_000.0);
        let mut nav = Navigation::new(NavigationOptions::default(), ReferenceFrame::geographic(), pos).unwrap();
        let mut tree = TileTree::new();
        let before = nav.position().clone();
        for _ in 0..20 {
            nav.update(DT, &mut tree).unwrap();
        }
        assert_eq!(nav.position(), &before);
        assert_eq!(nav.statistics().invariant_corrections, 0);
    }

    #[test]
    fn set_rotation_takes_the_short_way() {
        let pos = Position {
            orientation: Vec3::new(350.0, 300.0, 0.0),
            ..position(Vec3::ZERO, 1000.0)
        };
        let mut nav = Navigation::new(NavigationOptions::default(), square_frame(), pos).unwrap();
        nav.set_rotation(Vec3::new(10.0, 300.0, 0.0), MotionProfile::Quick);
        assert_eq!(nav.state().change_rotation, Vec3::new(20.0, 0.0, 0.0));

        let mut tree = TileTree::new();
        for _ in 0..300 {
            nav.update(DT, &mut tree).unwrap();
        }
        assert_close(nav.position().orientation.x, 10.0, 1e-6);
    }

    #[test]
    fn pole_switch_is_one_way_until_reset() {
        let options = NavigationOptions {
            latitude_threshold: 85.0,
            ..NavigationOptions::default()
        };
        let pos = position(Vec3::new(0.0, 80.0, 0.0), 10_000.0);
        let mut nav = Navigation::new(options, ReferenceFrame::geographic(), pos).unwrap();
        let mut tree = TileTree::new();
        assert_eq!(nav.state().geographic_mode, GeographicMode::Azimuthal);

        nav.set_point(Vec3::new(0.0, 86.0, 0.0), MotionProfile::Quick);
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().geographic_mode, GeographicMode::Free);
        assert_eq!(nav.state().target_point.y, 86.0);

        nav.set_point(Vec3::new(0.0, 70.0, 0.0), MotionProfile::Quick);
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().geographic_mode, GeographicMode::Free);

        nav.reset_geographic_mode();
        assert_eq!(nav.state().geographic_mode, GeographicMode::Azimuthal);
    }

    #[test]
    fn azimuthal_mode_clamps_target_latitude() {
        let options = NavigationOptions {
            geographic_mode: GeographicMode::Azimuthal,
            ..NavigationOptions::default()
        };
        let mut nav = Navigation::new(options, ReferenceFrame::geographic(), position(Vec3::ZERO, 10_000.0)).unwrap();
        nav.set_point(Vec3::new(0.0, 89.0, 0.0), MotionProfile::Quick);
        nav.update(DT, &mut TileTree::new()).unwrap();
        assert_eq!(nav.state().geographic_mode, GeographicMode::Azimuthal);
        assert_eq!(nav.state().target_point.y, 80.0);
    }

    #[test]
    fn rotate_switches_dynamic_mode_to_free() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            ReferenceFrame::geographic(),
            position(Vec3::ZERO, 10_000.0),
        )
        .unwrap();
        nav.rotate(Vec3::new(10.0, 10.0, 0.0));
        assert_eq!(nav.state().geographic_mode, GeographicMode::Free);
        assert_eq!(nav.state().change_rotation, Vec3::new(2.0, -1.0, 0.0));
    }

    #[test]
    fn height_queue_stays_bounded() {
        let mut nav = Navigation::new(NavigationOptions::default(), square_frame(), position(Vec3::ZERO, 1000.0)).unwrap();
        let mut tree = TileTree::new();
        for i in 0..10 {
            nav.set_point(Vec3::new(i as f64 * 10.0, 0.0, 0.0), MotionProfile::Quick);
            nav.update(DT, &mut tree).unwrap();
            assert!(nav.state().height_queue.len() <= HEIGHT_QUEUE_CAPACITY);
        }
        assert_eq!(nav.state().height_queue.len(), HEIGHT_QUEUE_CAPACITY);
        assert!(nav.statistics().height_request_pending_frames > 0);
    }

    #[test]
    fn terrain_changes_shift_the_target() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            square_frame(),
            position(Vec3::new(0.0, 0.0, 300.0), 1000.0),
        )
        .unwrap();
        let mut tree = flat_terrain(100.0);

        // First resolution only sets the baseline.
        nav.update(DT, &mut tree).unwrap();
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().last_vertical_shift, Some(100.0));
        assert_eq!(nav.state().target_point.z, 300.0);

        set_height(&mut tree, 130.0);
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().target_point.z, 330.0);
        assert_eq!(nav.statistics().height_requests_resolved, 2);
        assert_eq!(nav.statistics().last_height_request_lod, Some(1));
    }

    #[test]
    fn instant_teleport_drops_stale_heights() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            square_frame(),
            position(Vec3::new(0.0, 0.0, 300.0), 1000.0),
        )
        .unwrap();
        let mut tree = flat_terrain(100.0);
        nav.update(DT, &mut tree).unwrap();
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().last_vertical_shift, Some(100.0));

        nav.set_point(Vec3::new(200.0, -100.0, 500.0), MotionProfile::Instant);
        assert!(nav.state().height_queue.is_empty());
        assert_eq!(nav.state().last_vertical_shift, None);

        set_height(&mut tree, 180.0);
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.position().point, Vec3::new(200.0, -100.0, 500.0));
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().target_point.z, 500.0);
        assert_eq!(nav.state().last_vertical_shift, Some(180.0));
    }

    #[test]
    fn floating_height_is_pinned_to_terrain() {
        let pos = Position {
            height_mode: HeightMode::Floating,
            ..position(Vec3::new(0.0, 0.0, 250.0), 1000.0)
        };
        let mut nav = Navigation::new(NavigationOptions::default(), square_frame(), pos).unwrap();
        let mut tree = flat_terrain(100.0);
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.position().height_mode, HeightMode::Fixed);
        assert_eq!(nav.state().target_point.z, 0.0);

        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().target_point.z, 350.0);
    }

    #[test]
    fn reset_position_altitude_places_camera_above_ground() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            square_frame(),
            position(Vec3::new(0.0, 0.0, 40.0), 1000.0),
        )
        .unwrap();
        let mut tree = flat_terrain(60.0);
        nav.reset_position_altitude(25.0);
        assert_eq!(nav.state().height_queue.len(), 1);
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().target_point.z, 85.0);
    }

    #[test]
    fn unreachable_heights_are_abandoned() {
        let mut frame = square_frame();
        frame.periodicity = None;
        let mut nav = Navigation::new(NavigationOptions::default(), frame, position(Vec3::ZERO, 1000.0)).unwrap();
        let mut tree = flat_terrain(10.0);
        nav.set_point(Vec3::new(2000.0, 0.0, 0.0), MotionProfile::Instant);
        nav.update(DT, &mut tree).unwrap();
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.statistics().height_requests_abandoned, 1);
        assert_eq!(nav.state().target_point.z, 0.0);
    }

    #[test]
    fn periodic_wrap_moves_target_by_the_same_delta() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            square_frame(),
            position(Vec3::new(450.0, 0.0, 0.0), 1000.0),
        )
        .unwrap();
        nav.set_point(Vec3::new(550.0, 0.0, 0.0), MotionProfile::Instant);
        nav.update(DT, &mut TileTree::new()).unwrap();
        assert_eq!(nav.position().point.x, -450.0);
        assert_eq!(nav.state().target_point.x, -450.0);
    }

    #[test]
    fn quick_pan_crosses_the_period_smoothly() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            square_frame(),
            position(Vec3::new(480.0, 0.0, 0.0), 800.0),
        )
        .unwrap();
        let mut tree = TileTree::new();
        // Drag left: the camera moves east by 40.
        nav.pan(Vec3::new(-20.0, 0.0, 0.0)).unwrap();
        assert_eq!(nav.state().target_point.x, 520.0);
        for _ in 0..200 {
            nav.update(DT, &mut tree).unwrap();
            let x = nav.position().point.x;
            assert!((-500.0..500.0).contains(&x), "x = {x}");
        }
        assert_close(nav.position().point.x, -480.0, 1e-6);
        assert_close(nav.state().target_point.x, -480.0, 1e-9);
    }

    #[test]
    fn pan_follows_heading() {
        let pos = Position {
            orientation: Vec3::new(90.0, 270.0, 0.0),
            ..position(Vec3::ZERO, 800.0)
        };
        let mut nav = Navigation::new(NavigationOptions::default(), square_frame(), pos).unwrap();
        nav.pan(Vec3::new(10.0, 0.0, 0.0)).unwrap();
        let t = nav.state().target_point;
        assert_close(t.x, 0.0, 1e-9);
        assert_close(t.y, 20.0, 1e-9);
    }

    #[test]
    fn geographic_pan_rejects_sudden_direction_change() {
        let options = NavigationOptions {
            geographic_mode: GeographicMode::Azimuthal,
            ..NavigationOptions::default()
        };
        let mut nav = Navigation::new(options, ReferenceFrame::geographic(), position(Vec3::ZERO, 1_000_000.0)).unwrap();

        nav.set_point(Vec3::new(100.0, 0.0, 0.0), MotionProfile::Quick);
        nav.pan(Vec3::new(-1000.0, 0.0, 0.0)).unwrap();
        let accepted = nav.state().target_point;
        assert!(accepted.x > 120.0 && accepted.x < 125.0, "lon = {}", accepted.x);

        nav.set_point(Vec3::new(140.0, 0.0, 0.0), MotionProfile::Quick);
        nav.pan(Vec3::new(-1000.0, 0.0, 0.0)).unwrap();
        assert_eq!(nav.state().target_point, Vec3::new(140.0, 0.0, 0.0));
    }

    #[test]
    fn zoom_is_exponential_and_clamped() {
        let mut nav = Navigation::new(NavigationOptions::default(), square_frame(), position(Vec3::ZERO, 1000.0)).unwrap();
        nav.zoom(1000.0);
        assert_close(nav.state().target_view_extent, 1000.0 * 1.001f64.powf(-1000.0), 1e-9);
        nav.zoom(10_000.0);
        nav.update(DT, &mut TileTree::new()).unwrap();
        assert_eq!(nav.state().target_view_extent, 75.0);
    }

    #[test]
    fn input_stops_auto_rotation() {
        let options = NavigationOptions {
            auto_rotate: 0.5,
            motion_profile: MotionProfile::Instant,
            ..NavigationOptions::default()
        };
        let mut nav = Navigation::new(options, square_frame(), position(Vec3::ZERO, 1000.0)).unwrap();
        let mut tree = TileTree::new();
        nav.update(DT, &mut tree).unwrap();
        assert_close(nav.position().orientation.x, 0.5, 1e-12);
        nav.zoom(1.0);
        assert_eq!(nav.state().auto_rotation, 0.0);
        nav.update(DT, &mut tree).unwrap();
        assert_close(nav.position().orientation.x, 0.5, 1e-12);
    }

    #[test]
    fn ranges_hold_after_wild_input() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            ReferenceFrame::geographic(),
            position(Vec3::new(170.0, 60.0, 0.0), 500_000.0),
        )
        .unwrap();
        let mut tree = TileTree::new();
        for i in 0..120 {
            let s = if i % 2 == 0 { 1.0 } else { -1.0 };
            nav.pan(Vec3::new(300.0 * s, 400.0, 0.0)).unwrap();
            nav.rotate(Vec3::new(500.0, 300.0 * s, 50.0));
            nav.zoom(-200.0 * s);
            nav.update(DT, &mut tree).unwrap();

            let pos = nav.position();
            let options = nav.options();
            assert!((options.view_extent_min..=options.view_extent_max).contains(&pos.view_extent));
            for angle in pos.orientation.as_array() {
                assert!((0.0..360.0).contains(&angle));
            }
            assert!((PITCH_MIN..=PITCH_MAX).contains(&pos.orientation.y));
            assert!((-180.0..=180.0).contains(&pos.point.x));
            assert!((-90.0..=90.0).contains(&pos.point.y));
        }
    }

    #[test]
    fn azimuthal_pan_shrinks_ground_step_with_latitude() {
        // Returns (ground distance, longitude step) of one eastward pan.
        let pan_step = |lat: f64| {
            let mut nav = Navigation::new(
                NavigationOptions::default(),
                ReferenceFrame::geographic(),
                position(Vec3::new(10.0, lat, 0.0), 8000.0),
            )
            .unwrap();
            assert_eq!(nav.state().geographic_mode, GeographicMode::Azimuthal);
            let start = nav.state().target_point;
            nav.pan(Vec3::new(-10.0, 0.0, 0.0)).unwrap();
            let end = nav.state().target_point;
            let distance = nav.convertor().geo_inverse(start, end).unwrap().distance_m;
            (distance, end.x - start.x)
        };
        let (equator_distance, equator_lon) = pan_step(0.0);
        let (north_distance, north_lon) = pan_step(60.0);
        assert_close(equator_distance, 200.0, 1e-4);
        assert_close(north_distance, 100.0, 1e-4);
        // Half the ground distance at cos(60) covers about the same longitude.
        assert_close(north_lon, equator_lon, equator_lon * 0.01);
    }

    #[test]
    fn free_pan_heading_follows_the_pending_target() {
        let options = NavigationOptions {
            geographic_mode: GeographicMode::Free,
            ..NavigationOptions::default()
        };
        let mut nav = Navigation::new(
            options,
            ReferenceFrame::geographic(),
            position(Vec3::new(0.0, 60.0, 0.0), 8000.0),
        )
        .unwrap();
        let target = Vec3::new(30.0, 60.0, 0.0);
        nav.set_point(target, MotionProfile::Quick);
        let inv = nav.convertor().geo_inverse(nav.position().point, target).unwrap();
        let convergence = inv.azimuth2_deg - inv.azimuth1_deg;
        assert!(convergence > 10.0, "convergence = {convergence}");

        // Pan "up the screen" with heading 0: the step follows the heading the
        // camera will have on arrival at the target.
        nav.pan(Vec3::new(0.0, 10.0, 0.0)).unwrap();
        let step = nav.convertor().geo_inverse(target, nav.state().target_point).unwrap();
        assert_close(step.distance_m, 200.0, 1e-4);
        assert_close(angular_diff(convergence, step.azimuth1_deg), 0.0, 1e-6);
    }

    #[test]
    fn free_travel_turns_heading_with_the_geodesic() {
        let options = NavigationOptions {
            geographic_mode: GeographicMode::Free,
            ..NavigationOptions::default()
        };
        let start = Vec3::new(0.0, 60.0, 0.0);
        let pos = Position {
            orientation: Vec3::new(90.0, 270.0, 0.0),
            ..position(start, 8000.0)
        };
        let mut nav = Navigation::new(options, ReferenceFrame::geographic(), pos).unwrap();
        let target = Vec3::new(30.0, 60.0, 0.0);
        let inv = nav.convertor().geo_inverse(start, target).unwrap();

        nav.set_point(target, MotionProfile::Instant);
        nav.update(DT, &mut TileTree::new()).unwrap();
        let p = nav.position();
        assert_close(p.point.x, 30.0, 1e-6);
        assert_close(p.point.y, 60.0, 1e-6);
        let expected = normalize_angle(90.0 + inv.azimuth2_deg - inv.azimuth1_deg);
        assert_close(p.orientation.x, expected, 1e-6);
        assert!(p.orientation.x > 100.0);
    }

    #[test]
    fn geographic_terrain_is_tracked() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            ReferenceFrame::geographic(),
            position(Vec3::new(14.4, 50.1, 300.0), 10_000.0),
        )
        .unwrap();
        let mut tree = flat_terrain(100.0);
        nav.update(DT, &mut tree).unwrap();
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().last_vertical_shift, Some(100.0));
        assert_eq!(nav.statistics().height_requests_resolved, 1);
        assert_eq!(nav.statistics().last_height_request_lod, Some(12));

        set_height(&mut tree, 160.0);
        nav.update(DT, &mut tree).unwrap();
        assert_eq!(nav.state().target_point.z, 360.0);
    }

    #[test]
    fn camera_is_available_after_update() {
        let mut nav = Navigation::new(
            NavigationOptions::default(),
            ReferenceFrame::geographic(),
            position(Vec3::new(14.4, 50.1, 300.0), 3000.0),
        )
        .unwrap();
        nav.update(DT, &mut TileTree::new()).unwrap();
        let cam = nav.camera().unwrap();
        assert_close(cam.dir.length(), 1.0, 1e-9);
        assert!((cam.eye - cam.center).length() > 0.0);
    }
}
