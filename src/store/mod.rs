// Shared grid state

pub mod grid_store;

pub use grid_store::GridStore;
