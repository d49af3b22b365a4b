//! Channel I/O seam.
//!
//! The engine does not model peripheral protocols. `SIO`/`TIO`/`HIO`
//! funnel through the [`IoChannel`] trait as a single opaque call whose
//! completion code becomes the instruction's condition codes. The default
//! [`NullIo`] rejects every device, which is exactly what an unequipped
//! channel does.

use crate::arch::psd::{CC_NEGATIVE, CC_POSITIVE, CC_ZERO};

/// Channel command kind, one per I/O opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoCommand {
    /// Start an I/O operation (`SIO`).
    Start,
    /// Test device status (`TIO`).
    Test,
    /// Halt an in-progress operation (`HIO`).
    Halt,
}

/// One channel call: command plus the device address from the instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoOp {
    /// Channel command.
    pub command: IoCommand,
    /// Device address (low 16 bits of the effective address).
    pub device: u16,
}

/// Channel completion code, mapped onto the condition codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoStatus {
    /// Command accepted.
    Accepted,
    /// Channel or device busy; retryable.
    Busy,
    /// No such device on the channel.
    NoDevice,
}

impl IoStatus {
    /// Condition-code nibble reported to the issuing program.
    pub const fn cc(self) -> u8 {
        match self {
            Self::Accepted => CC_ZERO,
            Self::Busy => CC_POSITIVE,
            Self::NoDevice => CC_NEGATIVE,
        }
    }
}

/// External channel controller.
///
/// Implementations live in the harness; the engine only issues calls and
/// reports the completion code. Called from both processor contexts, hence
/// the `Send + Sync` bound.
pub trait IoChannel: Send + Sync {
    /// Issues one channel command.
    fn start_io(&self, op: IoOp) -> IoStatus;
}

/// Channel with no devices attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullIo;

impl IoChannel for NullIo {
    fn start_io(&self, _op: IoOp) -> IoStatus {
        IoStatus::NoDevice
    }
}
