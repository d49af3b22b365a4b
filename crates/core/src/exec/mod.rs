//! Processor execution core.
//!
//! One [`Context`] per processor. The loop is the classic one:
//! 1. Check the shared stopping flag.
//! 2. Deliver a consumable asynchronous signal, if one is pending and the
//!    PSD does not block it.
//! 3. Fetch, decode, execute.
//! 4. Vector any trap the instruction raised.
//!
//! Contexts share only main memory and the mailbox; everything
//! architectural is private to the context and its thread.

/// Integer ALU helpers.
pub mod alu;

/// Opcode handlers and effective-address computation.
pub mod execute;

/// Virtual memory access layer.
pub mod memory;

/// Trap vectoring.
pub mod trap;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::arch::{Psd, RegisterFile, Scratchpad};
use crate::common::{StopReason, Trap};
use crate::coord::{ContextId, Mailbox};
use crate::io::IoChannel;
use crate::mem::MainMemory;
use crate::mmu::Mmu;
use crate::stats::Counters;
use crate::trace::InstructionTrace;

pub use trap::RunState;

/// Signal an instruction gives the loop about control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// Advance to the next sequential instruction.
    Next,
    /// The handler replaced the instruction pointer.
    Jump,
    /// Architectural halt.
    Halt,
    /// Block until a signal arrives or the machine stops.
    Wait,
}

/// One processor context: all architectural state plus the shared
/// collaborators, driven by a single thread.
pub struct Context {
    id: ContextId,
    /// Program status doubleword.
    pub psd: Psd,
    /// General and base registers.
    pub regs: RegisterFile,
    /// Scratchpad control words.
    pub scratchpad: Scratchpad,
    /// Address translator.
    pub mmu: Mmu,
    /// Activity counters.
    pub counters: Counters,
    mem: Arc<MainMemory>,
    mailbox: Arc<Mailbox>,
    io: Arc<dyn IoChannel>,
    stopping: Arc<AtomicBool>,
    halt_trap: bool,
    trace: bool,
    state: RunState,
    /// Byte length of the most recently fetched instruction (2 or 4),
    /// used to compute the saved instruction pointer when vectoring.
    last_len: u32,
}

impl Context {
    /// Builds a context around the shared machine resources.
    ///
    /// Boot register values are the [`crate::sim::System`]'s to apply.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ContextId,
        mmu: Mmu,
        mem: Arc<MainMemory>,
        mailbox: Arc<Mailbox>,
        io: Arc<dyn IoChannel>,
        stopping: Arc<AtomicBool>,
        halt_trap: bool,
        trace: bool,
    ) -> Self {
        Self {
            id,
            psd: Psd::default(),
            regs: RegisterFile::new(),
            scratchpad: Scratchpad::new(),
            mmu,
            counters: Counters::default(),
            mem,
            mailbox,
            io,
            stopping,
            halt_trap,
            trace,
            state: RunState::Running,
            last_len: 4,
        }
    }

    /// This context's identity.
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Current loop state.
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Shared main memory.
    pub fn memory(&self) -> &MainMemory {
        &self.mem
    }

    /// Based addressing is in effect only when the PSD asks for it and
    /// the model has the base-register set; on the other models the PSD
    /// bit is inert.
    const fn based_active(&self) -> bool {
        self.psd.based() && self.mmu.model().based_available()
    }

    /// Runs until this context stops.
    pub fn run(&mut self) -> StopReason {
        loop {
            if self.stopping.load(Ordering::Relaxed) {
                self.state = RunState::Halted;
                return StopReason::Stopped;
            }
            if let Some(stop) = self.step() {
                debug!(context = %self.id, %stop, "context stopped");
                return stop;
            }
        }
    }

    /// Executes one loop iteration: signal delivery, then one instruction.
    ///
    /// Returns `Some` when this context can no longer run.
    pub fn step(&mut self) -> Option<StopReason> {
        if let Some(trap) = self.poll_signal() {
            return self.dispatch_trap(trap);
        }

        let before = self.psd;
        let decoded = match self.fetch() {
            Ok(decoded) => decoded,
            Err(trap) => return self.dispatch_trap(trap),
        };

        let result = self.execute(&decoded);
        self.counters.instructions += 1;

        let stop = match result {
            Ok(Outcome::Next) => {
                let next = before.ip().wrapping_add(self.last_len);
                self.psd.set_ip(next);
                None
            }
            Ok(Outcome::Jump) => None,
            Ok(Outcome::Halt) => {
                self.state = RunState::Halted;
                Some(StopReason::Halted)
            }
            Ok(Outcome::Wait) => {
                let next = before.ip().wrapping_add(self.last_len);
                self.psd.set_ip(next);
                self.counters.waits += 1;
                // Returns on signal arrival or stop; either way the next
                // iteration handles it.
                let _ = self.mailbox.wait(self.id, &self.stopping);
                None
            }
            Err(trap) => self.dispatch_trap(trap),
        };

        if self.trace {
            InstructionTrace {
                context: self.id,
                before,
                after: self.psd,
                raw: decoded.instr.0,
                class: decoded.class,
                regs: self.regs.snapshot(),
            }
            .emit();
        }

        stop
    }

    /// Checks the mailbox; a consumable signal becomes an async trap.
    fn poll_signal(&mut self) -> Option<Trap> {
        if self.psd.blocked() {
            self.mailbox.note_blocked(self.id);
            return None;
        }
        let cause = self.mailbox.take(self.id)?;
        self.counters.signals_taken += 1;
        Some(Trap::AsyncSignal(cause))
    }

    /// Vectors `trap`; an unvectorable trap stops the context.
    fn dispatch_trap(&mut self, trap: Trap) -> Option<StopReason> {
        match self.vector_trap(trap) {
            Ok(()) => None,
            Err(stop) => {
                self.state = RunState::Halted;
                Some(stop)
            }
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("psd", &self.psd)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
