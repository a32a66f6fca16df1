//! Control thread - steers down the navigation field.
//!
//! Each tick reads the latest pose and a field snapshot, extracts the descent heading
//! and runs the heading PID. Commands are wheel-saturated and offered on a bounded
//! channel; a full channel drops the command rather than stalling the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};

use crate::common::{ControlInput, NavError, NavResult};
use crate::config::ControlConfig;
use crate::control::HeadingController;
use crate::path_tracking::desired_heading;
use crate::store::GridStore;

/// Control thread handle.
pub struct ControlThread {
    handle: JoinHandle<()>,
}

impl ControlThread {
    /// Spawn the control thread.
    pub fn spawn(
        config: ControlConfig,
        store: Arc<GridStore>,
        commands: Sender<ControlInput>,
        running: Arc<AtomicBool>,
    ) -> NavResult<Self> {
        let handle = thread::Builder::new()
            .name("control".into())
            .spawn(move || run_control_loop(config, store, commands, running))
            .map_err(|e| NavError::TaskError(format!("failed to spawn control thread: {}", e)))?;

        Ok(Self { handle })
    }

    /// Wait for thread to finish.
    pub fn join(self) -> NavResult<()> {
        self.handle
            .join()
            .map_err(|_| NavError::TaskError("control thread panicked".to_string()))
    }
}

/// One control tick. `None` when there is no pose yet or the field is unavailable
/// at the robot's cell.
pub fn control_tick(store: &GridStore, controller: &mut HeadingController, config: &ControlConfig) -> Option<ControlInput> {
    let pose = store.pose()?;
    let field = store.field_snapshot();

    match desired_heading(&field, store.spec(), pose.x, pose.y) {
        Some(heading) => {
            let cmd = controller.control(pose.yaw, heading);
            Some(config.wheels.saturate(cmd))
        }
        None => {
            log::debug!("Field unavailable at ({:.3}, {:.3})", pose.x, pose.y);
            None
        }
    }
}

fn run_control_loop(
    config: ControlConfig,
    store: Arc<GridStore>,
    commands: Sender<ControlInput>,
    running: Arc<AtomicBool>,
) {
    let mut controller = HeadingController::new(config.heading);
    let loop_interval = Duration::from_millis(config.period_ms);

    log::info!(
        "Control thread running every {}ms ({:?} PID)",
        loop_interval.as_millis(),
        config.heading.mode
    );

    while running.load(Ordering::Relaxed) {
        let loop_start = Instant::now();

        if let Some(cmd) = control_tick(&store, &mut controller, &config) {
            match commands.try_send(cmd) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => log::debug!("Command channel full, command dropped"),
                Err(TrySendError::Disconnected(_)) => {
                    log::info!("Command receiver dropped");
                    break;
                }
            }
        }

        let elapsed = loop_start.elapsed();
        if elapsed < loop_interval {
            thread::sleep(loop_interval - elapsed);
        }
    }

    log::info!("Control thread shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Pose2D;
    use crate::config::NavConfig;
    use nalgebra::DMatrix;

    #[test]
    fn test_tick_without_pose_is_idle() {
        let config = NavConfig::default();
        let store = GridStore::from_config(&config).unwrap();
        let mut controller = HeadingController::new(config.control.heading);
        assert!(control_tick(&store, &mut controller, &config.control).is_none());
    }

    #[test]
    fn test_tick_at_boundary_is_idle() {
        let config = NavConfig::default();
        let store = GridStore::from_config(&config).unwrap();
        store.set_pose(Pose2D::new(-0.999, 0.0, 0.0));
        let mut controller = HeadingController::new(config.control.heading);
        assert!(control_tick(&store, &mut controller, &config.control).is_none());
    }

    #[test]
    fn test_tick_turns_away_from_obstacle() {
        let config = NavConfig::default();
        let store = GridStore::from_config(&config).unwrap();
        let n = store.spec().size();

        // obstacle potential just east of the robot
        let mut field = DMatrix::zeros(n, n);
        field[(200, 201)] = 1.0;
        store.publish_field(field).unwrap();
        store.set_pose(Pose2D::new(0.0025, 0.0025, 0.0));

        let mut controller = HeadingController::new(config.control.heading);
        let cmd = control_tick(&store, &mut controller, &config.control).unwrap();

        // desired heading is π (west), error π, so cruise speed and a left turn
        assert!(cmd.omega > 0.0);
        let (left, right) = config.control.wheels.wheel_speeds(cmd);
        assert!(left.abs().max(right.abs()) <= config.control.wheels.max_wheel_speed + 1e-12);
    }
}
