//! Instruction-level emulation core for a dual-processor 32-bit
//! mainframe: a primary compute unit (CPU) and its companion
//! instruction-processing unit (IPU), sharing main memory and a signal
//! mailbox.
//!
//! The crate is organized by concern:
//! 1. **Architecture** (`arch`): PSD, registers, scratchpad; pure state.
//! 2. **Instruction set** (`isa`): raw word layout and the table-driven
//!    decoder.
//! 3. **Memory** (`mem`, `mmu`): the shared word array and the hierarchical
//!    address translator with its map and fast-path caches.
//! 4. **Execution** (`exec`): the per-context loop, ALU, opcode handlers,
//!    and trap vectoring.
//! 5. **Coordination** (`coord`): the inter-processor signal mailbox.
//! 6. **Assembly** (`sim`): configuration, loader, and the dual-thread
//!    run harness.
//!
//! A minimal run:
//!
//! ```no_run
//! use c32_core::{Config, System, sim::load_file};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let system = System::new(Config::default());
//! load_file(system.memory(), 0, std::path::Path::new("boot.img"))?;
//! let report = system.run();
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

/// Architectural state: PSD, registers, scratchpad.
pub mod arch;

/// Shared fundamental types: addresses, access kinds, traps.
pub mod common;

/// Machine configuration.
pub mod config;

/// Inter-processor coordination.
pub mod coord;

/// Execution core.
pub mod exec;

/// Floating-point primitives.
pub mod fpu;

/// Channel I/O seam.
pub mod io;

/// Instruction set and decoder.
pub mod isa;

/// Main memory substrate.
pub mod mem;

/// Address translator.
pub mod mmu;

/// Machine assembly and harness surface.
pub mod sim;

/// Activity counters.
pub mod stats;

/// Per-instruction trace records.
pub mod trace;

pub use common::{StopReason, Trap};
pub use config::{Config, CpuModel};
pub use coord::ContextId;
pub use exec::Context;
pub use sim::{RunReport, System};
