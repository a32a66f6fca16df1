//! Common types, traits, and error definitions for field_nav
//!
//! This module provides the foundational building blocks shared by the
//! mapping, field and control components.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
