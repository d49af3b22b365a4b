//! Architectural state store.
//!
//! Pure data owned by one processor context: the program status doubleword,
//! the general/base register file, and the scratchpad control words. Two
//! independent instances of everything here exist at runtime, one per
//! processor, and are never shared.

/// Program Status Doubleword accessors.
pub mod psd;

/// General and base register file.
pub mod regs;

/// Scratchpad control words.
pub mod scratchpad;

pub use psd::Psd;
pub use regs::RegisterFile;
pub use scratchpad::Scratchpad;
