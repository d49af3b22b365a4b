//! Per-instruction trace records.
//!
//! Observation only: a record is assembled after each retired instruction
//! and emitted through `tracing` at trace level. Nothing reads it back;
//! the harness decides whether a subscriber is installed.

use tracing::trace;

use crate::arch::Psd;
use crate::arch::regs::NUM_REGS;
use crate::coord::ContextId;
use crate::isa::OpClass;

/// One retired instruction, as seen by a trace subscriber.
#[derive(Clone, Copy, Debug)]
pub struct InstructionTrace {
    /// Which processor retired it.
    pub context: ContextId,
    /// PSD before execution.
    pub before: Psd,
    /// PSD after execution (post trap vectoring, if any).
    pub after: Psd,
    /// Raw instruction word, left-normalized.
    pub raw: u32,
    /// Decoded opcode class.
    pub class: OpClass,
    /// General registers after execution.
    pub regs: [u32; NUM_REGS],
}

impl InstructionTrace {
    /// Emits this record through the `tracing` facade.
    pub fn emit(&self) {
        trace!(
            context = %self.context,
            ip = format_args!("{:#08x}", self.before.ip()),
            raw = format_args!("{:#010x}", self.raw),
            class = ?self.class,
            cc = self.after.cc(),
            psd1 = format_args!("{:#010x}", self.after.w1),
            psd2 = format_args!("{:#010x}", self.after.w2),
            regs = ?self.regs,
            "retired"
        );
    }
}
