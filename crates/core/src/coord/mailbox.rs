//! Inter-processor signal mailbox.
//!
//! One slot per processor context behind a single mutex, with a condvar for
//! `WAIT`. The architecture never queues: a signal raised while the
//! target's slot is occupied is dropped and counted, and the sender never
//! blocks beyond the mutex. Consumption is atomic take-and-clear under the
//! same mutex.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::trace;

use super::ContextId;
use crate::common::SignalCause;

/// How long a waiting context sleeps between shutdown-flag checks.
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Mailbox traffic counters, snapshotted into the run report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MailboxCounters {
    /// Signals accepted into a free slot.
    pub sent: u64,
    /// Signals taken by their target.
    pub received: u64,
    /// Pending signals observed while the target had signals blocked.
    pub blocked: u64,
    /// Signals dropped because the slot was occupied.
    pub dropped: u64,
}

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    pending: Option<SignalCause>,
    /// Set once per pending signal the first time the target observes it
    /// blocked, so the blocked counter counts signals, not poll iterations.
    noted_blocked: bool,
}

#[derive(Debug, Default)]
struct Inner {
    slots: [Slot; 2],
    counters: MailboxCounters,
    shutdown: bool,
}

/// Single-slot-per-context signal mailbox shared by both processors.
#[derive(Debug, Default)]
pub struct Mailbox {
    inner: Mutex<Inner>,
    wakeup: Condvar,
}

impl Mailbox {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Raises `cause` for `target`.
    ///
    /// Returns `true` when the signal was accepted. An occupied slot drops
    /// the signal without blocking or queuing.
    pub fn signal(&self, target: ContextId, cause: SignalCause) -> bool {
        let mut inner = self.lock();
        let slot = &mut inner.slots[target.index()];
        if slot.pending.is_some() {
            inner.counters.dropped += 1;
            trace!(%target, %cause, "signal dropped, slot occupied");
            return false;
        }
        slot.pending = Some(cause);
        slot.noted_blocked = false;
        inner.counters.sent += 1;
        drop(inner);
        self.wakeup.notify_all();
        true
    }

    /// Takes and clears the pending signal for `me`, if any.
    pub fn take(&self, me: ContextId) -> Option<SignalCause> {
        let mut inner = self.lock();
        let taken = inner.slots[me.index()].pending.take();
        if taken.is_some() {
            inner.counters.received += 1;
        }
        taken
    }

    /// True when a signal is pending for `me`, without consuming it.
    pub fn pending(&self, me: ContextId) -> bool {
        self.lock().slots[me.index()].pending.is_some()
    }

    /// Records that `me` observed its pending signal while blocked.
    ///
    /// Counted once per signal regardless of how many loop iterations pass
    /// before the block is lifted.
    pub fn note_blocked(&self, me: ContextId) {
        let mut inner = self.lock();
        let slot = &mut inner.slots[me.index()];
        if slot.pending.is_some() && !slot.noted_blocked {
            slot.noted_blocked = true;
            inner.counters.blocked += 1;
        }
    }

    /// Blocks until a signal is pending for `me`, the mailbox is shut
    /// down, or `stopping` is raised. Returns `false` when stopped.
    ///
    /// The condvar wait is sliced so a stop requested through the shared
    /// stopping flag, which cannot notify this condvar, is still seen
    /// promptly.
    pub fn wait(&self, me: ContextId, stopping: &AtomicBool) -> bool {
        let mut inner = self.lock();
        loop {
            if inner.slots[me.index()].pending.is_some() {
                return true;
            }
            if inner.shutdown || stopping.load(Ordering::Relaxed) {
                return false;
            }
            let (guard, _timeout) = self
                .wakeup
                .wait_timeout(inner, WAIT_SLICE)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            inner = guard;
        }
    }

    /// Marks the mailbox shut down and wakes every waiter.
    pub fn notify_shutdown(&self) {
        self.lock().shutdown = true;
        self.wakeup.notify_all();
    }

    /// Snapshot of the traffic counters.
    pub fn counters(&self) -> MailboxCounters {
        self.lock().counters
    }
}
