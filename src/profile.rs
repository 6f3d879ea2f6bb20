//! Platform profile: the constants table driving every accessor.

pub mod loader;
pub mod types;

pub use loader::{load_or_default, load_profile};
pub use types::{interpolate, PlatformProfile, Threshold};
