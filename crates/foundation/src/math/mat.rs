use super::Vec3;

/// Row-major 3x3 matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    pub rows: [[f64; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn from_columns(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            rows: [[a.x, b.x, c.x], [a.y, b.y, c.y], [a.z, b.z, c.z]],
        }
    }

    /// Counter-clockwise rotation by `degrees` around the given axis (0 = x, 1 = y, 2 = z).
    pub fn rotation(axis: usize, degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        let rows = match axis {
            0 => [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
            1 => [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
            _ => [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        };
        Self { rows }
    }
}

impl std::ops::Mul<Vec3> for Mat3 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }
}

impl std::ops::Mul for Mat3 {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[i][k] * other.rows[k][j]).sum();
            }
        }
        Self { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::Mat3;
    use crate::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        let d = (a - b).length();
        assert!(d < 1e-12, "expected {a:?} ~= {b:?}");
    }

    #[test]
    fn z_rotation_is_counter_clockwise() {
        let r = Mat3::rotation(2, 90.0);
        assert_vec_close(r * Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn product_composes_rotations() {
        let a = Mat3::rotation(2, 30.0) * Mat3::rotation(2, 60.0);
        let b = Mat3::rotation(2, 90.0);
        let v = Vec3::new(0.3, -1.2, 2.0);
        assert_vec_close(a * v, b * v);
    }

    #[test]
    fn columns_map_basis_vectors() {
        let m = Mat3::from_columns(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        assert_vec_close(m * Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(Mat3::IDENTITY * Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 3.0));
    }
}
