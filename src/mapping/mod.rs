// Mapping algorithms module
//
// Coordinate mapping, ray tracing, occupancy updates and grid persistence.

pub mod bayes;
pub mod grid_spec;
pub mod himm;
pub mod occupancy_grid;
pub mod persistence;
pub mod ray_tracer;
pub mod updater;

pub use bayes::{BayesParams, BayesUpdater};
pub use grid_spec::{in_bounds, CellAddress, GridSpec};
pub use himm::{HimmParams, HimmUpdater};
pub use occupancy_grid::{OccupancyLayer, RobotFrame};
pub use persistence::{load_grid, read_grid, save_grid, write_grid};
pub use ray_tracer::{trace, BresenhamIter};
pub use updater::UpdateAlgorithm;
