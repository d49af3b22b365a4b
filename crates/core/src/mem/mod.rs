//! Memory substrate shared by both processor contexts.

/// Flat bounds-checked main memory.
pub mod ram;

pub use ram::{MAX_MEMORY, MainMemory};
