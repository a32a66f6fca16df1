//! Common types used throughout field_nav

use std::f64::consts::PI;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Normalize yaw to (-pi, pi]
    pub fn normalize_yaw(&mut self) {
        self.yaw = normalize_angle(self.yaw);
    }
}

/// Wrap an angle into (-pi, pi]. Non-finite angles come back as NaN.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Control input for differential drive robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInput {
    pub v: f64,      // linear velocity
    pub omega: f64,  // angular velocity
}

impl ControlInput {
    pub fn new(v: f64, omega: f64) -> Self {
        Self { v, omega }
    }

    pub fn zero() -> Self {
        Self { v: 0.0, omega: 0.0 }
    }
}

impl Default for ControlInput {
    fn default() -> Self {
        Self::zero()
    }
}

/// One reading from the sensor bus: the raw sonar ring plus the pose it was taken at.
///
/// Both are in simulator units; `config::FrameConfig` maps them into grid world units.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    pub ranges: Vec<f64>,
    pub pose: Pose2D,
}

impl SensorSample {
    pub fn new(ranges: Vec<f64>, pose: Pose2D) -> Self {
        Self { ranges, pose }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert_relative_eq!(p1.distance(&p2), 5.0);
    }

    #[test]
    fn test_pose2d_normalize_yaw() {
        let mut pose = Pose2D::new(0.0, 0.0, 4.0);
        pose.normalize_yaw();
        assert!(pose.yaw > -PI && pose.yaw <= PI);
        assert_relative_eq!(pose.yaw, 4.0 - 2.0 * PI);
    }

    #[test]
    fn test_normalize_angle_half_open() {
        assert_relative_eq!(normalize_angle(PI), PI);
        assert_relative_eq!(normalize_angle(-PI), PI);
        assert_relative_eq!(normalize_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_angle_far_and_non_finite() {
        assert_relative_eq!(normalize_angle(-7.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);

        let far = normalize_angle(1e17);
        assert!(far.is_finite());
        assert!(far > -PI && far <= PI);

        assert!(normalize_angle(f64::INFINITY).is_nan());
        assert!(normalize_angle(f64::NEG_INFINITY).is_nan());
        assert!(normalize_angle(f64::NAN).is_nan());
    }
}
