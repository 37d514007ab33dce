//! Security module for rootbound: confinement of tool paths to the working root.
//!
//! Provides:
//! - **Path resolution**: join, normalize, resolve symlinks, and reject anything
//!   that leaves the root

pub mod path;

pub use path::{normalize_lexically, resolve, PathValidationError};
