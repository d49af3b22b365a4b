//! Trap vectoring.
//!
//! Every trap recovers through the same motion: find the cause's vector
//! word, write the six-word trap context block it addresses, and load the
//! new PSD from that block. Anything that prevents the motion (zero table
//! base, zero vector word, unreadable or all-zero handler PSD) is fatal
//! for the context, surfaced as an unvectored-trap stop.

use crate::arch::Psd;
use crate::arch::scratchpad::SP_CACHED_PSD2;
use crate::common::{PHYS_MASK, RealAddr, StopReason, Trap};
use crate::config::CpuModel;

use super::Context;

/// Loop state of one context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Fetching and executing instructions.
    Running,
    /// Mid trap vectoring (observable only from a panic backtrace or a
    /// debugger; the motion is synchronous).
    Vectoring,
    /// Stopped; `run` has returned for this context.
    Halted,
}

/// Byte offsets of the six trap-context-block words.
const TCB_OLD_PSD1: u32 = 0;
const TCB_OLD_PSD2: u32 = 4;
const TCB_NEW_PSD1: u32 = 8;
const TCB_NEW_PSD2: u32 = 12;
const TCB_STATUS: u32 = 16;
const TCB_DETAIL: u32 = 20;

/// Per-model trap status word.
///
/// The models disagree on what the status word carries; the differences
/// are a lookup, not behavior. All models report the model id (bits 0-7)
/// and cause index (bits 8-15); quarter-page models additionally flag a
/// demand fault raised by an instruction fetch in bit 31.
pub(super) fn trap_status_word(model: CpuModel, trap: &Trap) -> u32 {
    let mut word = (model.id() << 24) | (trap.vector_index() << 16);
    if let Trap::DemandPageFault { fetch: true, .. } = trap {
        if model.quarter_page_protection() {
            word |= 1;
        }
    }
    word
}

/// Secondary detail word the handler finds in the block.
pub(super) const fn detail_word(trap: &Trap) -> u32 {
    match trap {
        Trap::AddressSpecification(addr)
        | Trap::MapFault(addr)
        | Trap::NonPresentMemory(addr)
        | Trap::ProtectionViolation(addr) => *addr,
        Trap::UndefinedInstruction(raw) | Trap::PrivilegeViolation(raw) => *raw,
        Trap::DemandPageFault { page, .. } => *page,
        Trap::SupervisorCall(num) => *num as u32,
        Trap::SystemCheck(code) | Trap::MachineCheck(code) => *code,
        Trap::AsyncSignal(cause) => cause.slot(),
        Trap::ArithmeticException | Trap::PrivilegedHalt => 0,
    }
}

impl Context {
    /// Vectors `trap` through the trap or interrupt table.
    ///
    /// On success the context resumes at the handler PSD. The saved
    /// instruction pointer addresses the next instruction, except for
    /// map and demand-page faults, which re-execute.
    ///
    /// # Errors
    ///
    /// `StopReason::UnvectoredTrap` when the vector chain is unusable;
    /// the architectural state is left as it was at trap time.
    pub(super) fn vector_trap(&mut self, trap: Trap) -> Result<(), StopReason> {
        self.state = RunState::Vectoring;
        let result = self.try_vector(&trap);
        match result {
            Ok(()) => {
                self.state = RunState::Running;
                // Async deliveries are counted when taken from the mailbox.
                if !trap.is_async() {
                    self.counters.traps += 1;
                }
                Ok(())
            }
            Err(()) => Err(StopReason::UnvectoredTrap(trap)),
        }
    }

    fn try_vector(&mut self, trap: &Trap) -> Result<(), ()> {
        let table = if trap.is_async() {
            self.scratchpad.interrupt_table()
        } else {
            self.scratchpad.trap_table()
        };
        if table == 0 {
            return Err(());
        }

        let vec_addr = RealAddr::new(table.wrapping_add(trap.vector_index() * 4));
        let vector = self.mem.read32(vec_addr).map_err(|_| ())?;
        let tcb = vector & PHYS_MASK & !3;
        if tcb == 0 {
            return Err(());
        }

        // Validate the handler PSD before touching the block.
        let new1 = self.mem.read32(RealAddr::new(tcb + TCB_NEW_PSD1)).map_err(|_| ())?;
        let new2 = self.mem.read32(RealAddr::new(tcb + TCB_NEW_PSD2)).map_err(|_| ())?;
        let new = Psd::new(new1, new2);
        if new.is_zero() {
            return Err(());
        }

        let saved_ip = if trap.reexecutes() || trap.is_async() {
            self.psd.ip()
        } else {
            self.psd.ip().wrapping_add(self.last_len)
        };
        let mut old = self.psd;
        old.set_ip(saved_ip);

        let model = self.mmu.model();
        self.mem
            .write32(RealAddr::new(tcb + TCB_OLD_PSD1), old.w1)
            .map_err(|_| ())?;
        self.mem
            .write32(RealAddr::new(tcb + TCB_OLD_PSD2), old.w2)
            .map_err(|_| ())?;
        self.mem
            .write32(RealAddr::new(tcb + TCB_STATUS), trap_status_word(model, trap))
            .map_err(|_| ())?;
        self.mem
            .write32(RealAddr::new(tcb + TCB_DETAIL), detail_word(trap))
            .map_err(|_| ())?;

        self.psd = new;
        self.scratchpad.write(SP_CACHED_PSD2, new.w2);
        if !new.retain_maps() {
            self.mmu.invalidate_all();
        }
        Ok(())
    }
}
