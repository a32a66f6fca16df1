// Path Planning algorithms module
//
// Local navigation field over the occupancy grid.

pub mod potential_field;

pub use potential_field::*;
