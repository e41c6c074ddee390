// Math utilities and helper functions

pub use glam::DVec2 as Vec2;

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Vector operations the demos need on top of what glam already provides.
///
/// glam covers `length`, `dot`, `perp_dot` (the 2D determinant),
/// `normalize_or_zero` and `is_finite`; everything here is total, so a
/// zero-length operand yields zero instead of NaN.
pub trait VecExt {
    /// Rotate counter-clockwise by `angle` radians.
    fn rotated(self, angle: f64) -> Self;

    /// `(x, y) -> (y, -x)`. For clockwise-wound polygons this turns an edge
    /// direction `start - end` into its outward normal.
    fn rotate_clockwise_90(self) -> Self;

    /// 2D cross product `x1 * y2 - y1 * x2`.
    fn determinant(self, other: Self) -> f64;

    /// Cosine of the angle between the vectors, 0 if either is zero.
    fn cosine_between(self, other: Self) -> f64;

    /// Sine of the signed angle from `self` to `other`, 0 if either is zero.
    fn sine_between(self, other: Self) -> f64;

    /// Signed angle from `self` to `other` in `(-pi, pi]`.
    fn signed_angle_to(self, other: Self) -> f64;
}

impl VecExt for Vec2 {
    fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    fn rotate_clockwise_90(self) -> Self {
        Vec2::new(self.y, -self.x)
    }

    fn determinant(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn cosine_between(self, other: Self) -> f64 {
        let lengths = self.length() * other.length();
        if lengths == 0.0 {
            return 0.0;
        }
        clamp(self.dot(other) / lengths, -1.0, 1.0)
    }

    fn sine_between(self, other: Self) -> f64 {
        let lengths = self.length() * other.length();
        if lengths == 0.0 {
            return 0.0;
        }
        clamp(self.determinant(other) / lengths, -1.0, 1.0)
    }

    fn signed_angle_to(self, other: Self) -> f64 {
        self.sine_between(other).atan2(self.cosine_between(other))
    }
}
