//! Angle helpers shared by the navigation code.
//!
//! All angles are in degrees unless a name says otherwise.

/// Floored modulo: the result has the sign of `m` and lies in `[0, m)`.
pub fn modulo(a: f64, m: f64) -> f64 {
    let r = a - m * (a / m).floor();
    // `a` slightly below a multiple of `m` can round up to exactly `m`.
    if r >= m { 0.0 } else { r }
}

/// Normalize an angle into `[0, 360)`.
pub fn normalize_angle(a: f64) -> f64 {
    modulo(a, 360.0)
}

/// Signed shortest rotation taking `from` to `to`, in `[-180, 180)`.
pub fn angular_diff(from: f64, to: f64) -> f64 {
    modulo(to - from + 180.0, 360.0) - 180.0
}

/// Linear interpolation from `a` (t = 0) to `b` (t = 1).
pub fn interpolate(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::{angular_diff, interpolate, modulo, normalize_angle};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn modulo_is_floored() {
        assert_close(modulo(370.0, 360.0), 10.0, 1e-12);
        assert_close(modulo(-10.0, 360.0), 350.0, 1e-12);
        assert_eq!(modulo(720.0, 360.0), 0.0);
    }

    #[test]
    fn normalize_never_returns_full_turn() {
        let a = normalize_angle(-1e-17);
        assert!((0.0..360.0).contains(&a), "got {a}");
    }

    #[test]
    fn shortest_path_wraps_through_zero() {
        assert_close(angular_diff(350.0, 10.0), 20.0, 1e-12);
        assert_close(angular_diff(10.0, 350.0), -20.0, 1e-12);
        assert_close(angular_diff(-170.0, 170.0), -20.0, 1e-12);
    }

    #[test]
    fn interpolate_endpoints() {
        assert_eq!(interpolate(2.0, 6.0, 0.0), 2.0);
        assert_eq!(interpolate(2.0, 6.0, 1.0), 6.0);
        assert_eq!(interpolate(2.0, 6.0, 0.25), 3.0);
    }
}
