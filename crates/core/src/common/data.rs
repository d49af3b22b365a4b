//! Memory access classification.

/// The kind of memory access being performed.
///
/// Instruction fetches and operand accesses fault differently (a demand-page
/// fault records which one it was), and only writes are subject to the
/// protection check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Instruction fetch.
    Fetch,
    /// Operand read.
    Read,
    /// Operand write.
    Write,
}

impl AccessKind {
    /// True for operand or fetch reads.
    #[inline(always)]
    pub const fn is_read(self) -> bool {
        !matches!(self, Self::Write)
    }
}

/// Cause code carried through the inter-processor mailbox.
///
/// At most one signal is outstanding per target context; the cause selects
/// the interrupt-table slot used when the signal is delivered as an
/// asynchronous trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalCause {
    /// Peer-processor signal (`SIPU` instruction).
    Sipu,
    /// External attention request from the harness.
    Attention,
}

impl SignalCause {
    /// Interrupt-table slot index for this cause.
    #[inline]
    pub const fn slot(self) -> u32 {
        match self {
            Self::Sipu => 0,
            Self::Attention => 1,
        }
    }
}

impl std::fmt::Display for SignalCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sipu => write!(f, "SIPU"),
            Self::Attention => write!(f, "Attention"),
        }
    }
}
