// Path Tracking algorithms module
//
// Reactive steering by descending the navigation field.

pub mod gradient_heading;

pub use gradient_heading::*;
