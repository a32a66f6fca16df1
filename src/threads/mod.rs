//! Periodic navigation tasks
//!
//! - `MappingThread`: applies sensor samples to the occupancy grid as they arrive
//! - `FieldThread`: recomputes the navigation field at a fixed period
//! - `ControlThread`: turns the field gradient into steering commands at a fixed period
//!
//! `NavigationRuntime` starts the three over one shared `GridStore` and stops them.

mod control_thread;
mod field_thread;
mod mapping_thread;
mod runtime;

pub use control_thread::{control_tick, ControlThread};
pub use field_thread::FieldThread;
pub use mapping_thread::{MappingThread, MappingThreadConfig};
pub use runtime::{NavigationRuntime, COMMAND_QUEUE_DEPTH, SAMPLE_QUEUE_DEPTH};
