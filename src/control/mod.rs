//! Control algorithms module
//!
//! PID heading control and differential-drive command saturation.

pub mod pid;
pub mod wheel_limits;

pub use pid::{HeadingControlConfig, HeadingController, PidMode, PidState};
pub use wheel_limits::WheelLimits;
