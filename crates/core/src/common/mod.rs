//! Common types shared across the execution engine.
//!
//! Fundamental building blocks used by every component:
//! 1. **Address Types:** Strong types for virtual and real addresses.
//! 2. **Access Classification:** Fetch/read/write kinds and signal causes.
//! 3. **Error Handling:** The trap taxonomy and per-context stop reasons.

/// Address type definitions (virtual and real addresses).
pub mod addr;

/// Memory access kinds and inter-processor signal causes.
pub mod data;

/// Trap taxonomy, stop reasons, and translation results.
pub mod error;

pub use addr::{ADDR_BITS, PHYS_MASK, RealAddr, VirtAddr};
pub use data::{AccessKind, SignalCause};
pub use error::{StopReason, Translation, Trap};
