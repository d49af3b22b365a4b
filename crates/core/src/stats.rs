//! Per-context activity counters.

use serde::Serialize;

/// Counters one processor context accumulates over a run.
///
/// Monotonic and observation-only; nothing in the engine branches on them.
/// Serialized into the run report alongside the translator and mailbox
/// counters.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Counters {
    /// Instructions retired (including those that trapped after side
    /// effects were rolled into the trap).
    pub instructions: u64,
    /// Traps vectored (synchronous causes).
    pub traps: u64,
    /// Asynchronous signals delivered as interrupts.
    pub signals_taken: u64,
    /// `WAIT` instructions that actually blocked.
    pub waits: u64,
    /// Channel I/O calls issued.
    pub io_calls: u64,
}
