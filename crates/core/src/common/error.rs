//! Trap taxonomy and stop conditions.
//!
//! Every failure a lower layer can produce (decoder, translator, memory
//! access, ALU) is a [`Trap`], threaded back up as an explicit `Result`
//! rather than a non-local exit. All traps recover at the vector boundary;
//! the only conditions that escape the execution loop are an unvectored
//! trap and an architectural halt, surfaced as a [`StopReason`] for that
//! processor context alone.

use thiserror::Error;

use super::addr::RealAddr;
use super::data::SignalCause;

/// An architectural trap.
///
/// The payload is the detail word the handler will find in its trap context
/// block: faulting address, raw instruction, page number, or signal cause.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Trap {
    /// Misaligned or otherwise malformed operand/instruction address.
    #[error("address specification at {0:#08x}")]
    AddressSpecification(u32),

    /// Reserved or unimplemented instruction encoding.
    #[error("undefined instruction {0:#010x}")]
    UndefinedInstruction(u32),

    /// Privileged operation attempted in unprivileged state.
    #[error("privilege violation on instruction {0:#010x}")]
    PrivilegeViolation(u32),

    /// Address outside the mapped space, or an invalid map descriptor on a
    /// model without demand paging.
    #[error("map fault at {0:#08x}")]
    MapFault(u32),

    /// Real address beyond configured physical memory.
    #[error("non-present memory at {0:#08x}")]
    NonPresentMemory(u32),

    /// Retryable fault on a demand-paging model: the page descriptor was
    /// invalid. Resumes at, not after, the faulting instruction.
    #[error("demand page fault on page {page} (fetch={fetch})")]
    DemandPageFault {
        /// Faulting virtual page number.
        page: u32,
        /// True when raised by an instruction fetch rather than an operand
        /// access.
        fetch: bool,
    },

    /// Unprivileged write into a write-protected page region.
    #[error("protection violation at {0:#08x}")]
    ProtectionViolation(u32),

    /// Overflow, divide by zero, or quotient overflow with the
    /// arithmetic-exception trap enabled.
    #[error("arithmetic exception")]
    ArithmeticException,

    /// Internal consistency failure detected by the engine.
    #[error("system check ({0:#x})")]
    SystemCheck(u32),

    /// Unrecoverable hardware-level fault (e.g. bad vector storage).
    #[error("machine check ({0:#x})")]
    MachineCheck(u32),

    /// `SVC` instruction; the payload is the call number.
    #[error("supervisor call {0}")]
    SupervisorCall(u16),

    /// Mailbox-delivered asynchronous signal from the peer processor or
    /// the harness.
    #[error("async signal {0}")]
    AsyncSignal(SignalCause),

    /// Privileged halt intercepted because the halt trap is configured.
    #[error("privileged halt trap")]
    PrivilegedHalt,
}

impl Trap {
    /// Vector index within the trap (or interrupt) table.
    pub const fn vector_index(&self) -> u32 {
        match self {
            Self::AddressSpecification(_) => 1,
            Self::UndefinedInstruction(_) => 2,
            Self::PrivilegeViolation(_) => 3,
            Self::MapFault(_) => 4,
            Self::NonPresentMemory(_) => 5,
            Self::DemandPageFault { .. } => 6,
            Self::ProtectionViolation(_) => 7,
            Self::ArithmeticException => 8,
            Self::SystemCheck(_) => 9,
            Self::MachineCheck(_) => 10,
            Self::SupervisorCall(_) => 11,
            // Async signals index the interrupt table by cause slot.
            Self::AsyncSignal(cause) => cause.slot(),
            Self::PrivilegedHalt => 13,
        }
    }

    /// True when the saved instruction pointer must address the faulting
    /// instruction so the handler can resume by re-executing it.
    pub const fn reexecutes(&self) -> bool {
        matches!(self, Self::MapFault(_) | Self::DemandPageFault { .. })
    }

    /// True when this trap vectors through the interrupt table instead of
    /// the trap table.
    pub const fn is_async(&self) -> bool {
        matches!(self, Self::AsyncSignal(_))
    }
}

/// Why a processor context stopped running.
///
/// A stop is always per-context; the peer keeps running until the shared
/// stopping flag is raised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StopReason {
    /// Architectural halt (`HALT` with the halt trap not configured).
    #[error("halted")]
    Halted,

    /// A trap could not be vectored: zero table base, zero vector word, or
    /// an uninitialized handler PSD. Fatal for this context.
    #[error("unvectored trap: {0}")]
    UnvectoredTrap(Trap),

    /// External or peer-initiated shutdown via the shared stopping flag.
    #[error("stopped by request")]
    Stopped,
}

/// Successful translation: the real address plus the page's protection
/// nibble (one bit per quarter page, MSB first).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Translated real address.
    pub real: RealAddr,
    /// Write-protection bits for the containing page.
    pub prot: u8,
}

impl Translation {
    /// Builds a translation result.
    #[inline]
    pub const fn new(real: RealAddr, prot: u8) -> Self {
        Self { real, prot }
    }
}
