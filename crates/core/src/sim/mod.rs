//! Machine assembly: configuration in, run report out.

/// Flat boot-image loader.
pub mod loader;

/// Whole-machine builder and run loop.
pub mod system;

pub use loader::{LoadError, load_file, load_image};
pub use system::{ContextReport, RunReport, System};
