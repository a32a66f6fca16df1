//! Sonar ring simulator
//!
//! A unicycle robot in a room built from wall segments. Each sonar returns the
//! distance to the nearest wall along its beam, capped at the sensor range and
//! perturbed by Gaussian noise. All values are in simulator units; the mapping side
//! converts them with `config::FrameConfig`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::common::{ControlInput, NavError, NavResult, Point2D, Pose2D, SensorSample};
use crate::config::SensorConfig;

/// Wall segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Point2D,
    pub b: Point2D,
}

impl Segment {
    pub fn new(a: Point2D, b: Point2D) -> Self {
        Self { a, b }
    }

    /// Distance along the ray from `origin` at `angle`, if the ray hits this segment
    pub fn ray_hit(&self, origin: Point2D, angle: f64) -> Option<f64> {
        let (dx, dy) = (angle.cos(), angle.sin());
        let (ex, ey) = (self.b.x - self.a.x, self.b.y - self.a.y);
        let denom = dx * ey - dy * ex;
        if denom.abs() < 1e-12 {
            return None;
        }

        let (wx, wy) = (self.a.x - origin.x, self.a.y - origin.y);
        let s = (wx * ey - wy * ex) / denom;
        let t = (wx * dy - wy * dx) / denom;
        (s >= 0.0 && (0.0..=1.0).contains(&t)).then_some(s)
    }

    /// Shortest distance from `p` to the segment
    pub fn distance_to(&self, p: Point2D) -> f64 {
        let (ex, ey) = (self.b.x - self.a.x, self.b.y - self.a.y);
        let len2 = ex * ex + ey * ey;
        if len2 == 0.0 {
            return p.distance(&self.a);
        }
        let t = (((p.x - self.a.x) * ex + (p.y - self.a.y) * ey) / len2).clamp(0.0, 1.0);
        p.distance(&Point2D::new(self.a.x + t * ex, self.a.y + t * ey))
    }
}

/// Set of walls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Room {
    pub walls: Vec<Segment>,
}

impl Room {
    /// Closed rectangle centred on the origin
    pub fn rectangle(half_width: f64, half_height: f64) -> Self {
        let corners = [
            Point2D::new(-half_width, -half_height),
            Point2D::new(half_width, -half_height),
            Point2D::new(half_width, half_height),
            Point2D::new(-half_width, half_height),
        ];
        let walls = (0..4)
            .map(|i| Segment::new(corners[i], corners[(i + 1) % 4]))
            .collect();
        Self { walls }
    }

    pub fn with_wall(mut self, a: Point2D, b: Point2D) -> Self {
        self.walls.push(Segment::new(a, b));
        self
    }

    /// Square room with two staggered partitions
    pub fn demo() -> Self {
        Self::rectangle(30.0, 30.0)
            .with_wall(Point2D::new(-10.0, -30.0), Point2D::new(-10.0, 5.0))
            .with_wall(Point2D::new(10.0, 30.0), Point2D::new(10.0, -5.0))
    }

    /// Nearest wall hit along a ray, or `max_range` when nothing is closer
    pub fn cast(&self, origin: Point2D, angle: f64, max_range: f64) -> f64 {
        self.walls
            .iter()
            .filter_map(|w| w.ray_hit(origin, angle))
            .fold(max_range, f64::min)
    }

    /// Distance from `p` to the nearest wall
    pub fn clearance(&self, p: Point2D) -> f64 {
        self.walls
            .iter()
            .map(|w| w.distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Simulated robot carrying a sonar ring
pub struct SonarSimulator {
    room: Room,
    /// Mounting angle of every sonar [rad]
    angles: Vec<f64>,
    max_range: f64,
    robot_radius: f64,
    noise: Normal<f64>,
    rng: StdRng,
    pose: Pose2D,
}

impl SonarSimulator {
    pub fn new(
        room: Room,
        sensors: &SensorConfig,
        max_range: f64,
        noise_std: f64,
        seed: u64,
        start: Pose2D,
    ) -> NavResult<Self> {
        if !(max_range > 0.0) {
            return Err(NavError::InvalidParameter(format!(
                "sonar max range must be positive, got {}",
                max_range
            )));
        }
        let noise = Normal::new(0.0, noise_std)
            .map_err(|e| NavError::InvalidParameter(format!("sonar noise: {}", e)))?;

        Ok(Self {
            room,
            angles: sensors.angles_deg.iter().map(|a| a.to_radians()).collect(),
            max_range,
            robot_radius: 1.0,
            noise,
            rng: StdRng::seed_from_u64(seed),
            pose: start,
        })
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// Read every sonar at the current pose. Beam `i` points along `yaw - angle_i`.
    pub fn sample(&mut self) -> SensorSample {
        let origin = self.pose.position();
        let ranges = self
            .angles
            .iter()
            .map(|angle| {
                let true_range = self.room.cast(origin, self.pose.yaw - angle, self.max_range);
                (true_range + self.noise.sample(&mut self.rng)).clamp(0.0, self.max_range)
            })
            .collect();
        SensorSample::new(ranges, self.pose)
    }

    /// Unicycle step. The robot turns but stays put when the move would bring it
    /// within its radius of a wall. Returns whether it translated.
    pub fn step(&mut self, cmd: ControlInput, dt: f64) -> bool {
        let next = Point2D::new(
            self.pose.x + cmd.v * self.pose.yaw.cos() * dt,
            self.pose.y + cmd.v * self.pose.yaw.sin() * dt,
        );

        let moved = self.room.clearance(next) > self.robot_radius;
        if moved {
            self.pose.x = next.x;
            self.pose.y = next.y;
        }
        self.pose.yaw += cmd.omega * dt;
        self.pose.normalize_yaw();
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn quiet_sim(start: Pose2D) -> SonarSimulator {
        SonarSimulator::new(Room::rectangle(5.0, 5.0), &SensorConfig::default(), 10.0, 0.0, 1, start).unwrap()
    }

    #[test]
    fn test_ray_hit() {
        let wall = Segment::new(Point2D::new(3.0, -1.0), Point2D::new(3.0, 1.0));
        assert_relative_eq!(wall.ray_hit(Point2D::origin(), 0.0).unwrap(), 3.0, epsilon = 1e-12);
        assert!(wall.ray_hit(Point2D::origin(), FRAC_PI_2).is_none());
        assert!(wall.ray_hit(Point2D::new(4.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_distance_to_segment() {
        let wall = Segment::new(Point2D::new(0.0, 0.0), Point2D::new(4.0, 0.0));
        assert_relative_eq!(wall.distance_to(Point2D::new(2.0, 3.0)), 3.0);
        assert_relative_eq!(wall.distance_to(Point2D::new(7.0, 4.0)), 5.0);
    }

    #[test]
    fn test_noiseless_ranges() {
        let mut sim = quiet_sim(Pose2D::new(1.0, 0.0, 0.0));
        let sample = sim.sample();
        assert_eq!(sample.ranges.len(), 16);
        // sonar 3 at -10° looks slightly left of +x
        assert_relative_eq!(sample.ranges[3], 4.0 / 10f64.to_radians().cos(), epsilon = 1e-9);
        // sonar 7 at 90° looks along -y
        assert_relative_eq!(sample.ranges[7], 5.0, epsilon = 1e-9);
        // sonar 0 at -90° looks along +y
        assert_relative_eq!(sample.ranges[0], 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ranges_capped() {
        let mut sim = SonarSimulator::new(Room::rectangle(50.0, 50.0), &SensorConfig::default(), 5.0, 0.0, 1, Pose2D::origin())
            .unwrap();
        assert!(sim.sample().ranges.iter().all(|r| *r == 5.0));
    }

    #[test]
    fn test_noise_is_seeded() {
        let make = || {
            SonarSimulator::new(Room::demo(), &SensorConfig::default(), 50.0, 0.5, 42, Pose2D::new(-20.0, -20.0, 0.3))
                .unwrap()
        };
        assert_eq!(make().sample(), make().sample());
    }

    #[test]
    fn test_step_moves_and_blocks() {
        let mut sim = quiet_sim(Pose2D::origin());
        assert!(sim.step(ControlInput::new(1.0, 0.0), 1.0));
        assert_relative_eq!(sim.pose().x, 1.0);

        assert!(sim.step(ControlInput::new(1.0, 0.0), 2.0));
        assert!(!sim.step(ControlInput::new(1.0, FRAC_PI_4), 2.0));
        assert_relative_eq!(sim.pose().x, 3.0);
        assert_relative_eq!(sim.pose().yaw, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_parameters() {
        let sensors = SensorConfig::default();
        assert!(SonarSimulator::new(Room::demo(), &sensors, 0.0, 0.1, 1, Pose2D::origin()).is_err());
        assert!(SonarSimulator::new(Room::demo(), &sensors, 10.0, -1.0, 1, Pose2D::origin()).is_err());
    }
}
