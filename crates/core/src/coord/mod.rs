//! Inter-processor coordination.
//!
//! The two processor contexts never share architectural state; the only
//! cross-context channel the architecture defines is the asynchronous
//! signal protocol driven by `SIPU`, `BEI`, `UEI`, and `WAIT`, carried
//! here by a single-slot [`Mailbox`].

/// Single-slot signal mailbox.
pub mod mailbox;

pub use mailbox::{Mailbox, MailboxCounters};

use serde::Serialize;

/// Identity of one processor context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ContextId {
    /// Primary compute unit.
    Cpu,
    /// Companion instruction-processing unit.
    Ipu,
}

impl ContextId {
    /// Mailbox slot index for this context.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Ipu => 1,
        }
    }

    /// The other processor, the target of `SIPU`.
    #[inline]
    pub const fn peer(self) -> Self {
        match self {
            Self::Cpu => Self::Ipu,
            Self::Ipu => Self::Cpu,
        }
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "CPU"),
            Self::Ipu => write!(f, "IPU"),
        }
    }
}
