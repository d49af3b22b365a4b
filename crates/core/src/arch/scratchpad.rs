//! Scratchpad control words.
//!
//! A fixed array of per-context configuration words: table bases for trap
//! and interrupt vectoring, the master-page-list base for the translator,
//! the boot device, a cached copy of PSD word 2, and the identity key.
//! Initialized once at boot and written afterwards only by the privileged
//! `WSCR` instruction.

/// Number of scratchpad words.
pub const SCRATCH_WORDS: usize = 8;

/// Index of the trap-vector-table base word.
pub const SP_TRAP_TABLE: usize = 0;
/// Index of the interrupt-vector-table base word.
pub const SP_INT_TABLE: usize = 1;
/// Index of the master-page-list base word.
pub const SP_MPL_BASE: usize = 2;
/// Index of the boot-device word.
pub const SP_BOOT_DEVICE: usize = 3;
/// Index of the cached PSD word 2.
pub const SP_CACHED_PSD2: usize = 4;
/// Index of the identity-key word (model and context id).
pub const SP_IDENTITY: usize = 5;

/// Scratchpad state for one processor context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scratchpad {
    words: [u32; SCRATCH_WORDS],
}

impl Scratchpad {
    /// Creates a zeroed scratchpad.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads scratchpad word `idx` (masked to the array size).
    #[inline(always)]
    pub fn read(&self, idx: usize) -> u32 {
        self.words[idx & (SCRATCH_WORDS - 1)]
    }

    /// Writes scratchpad word `idx`.
    #[inline(always)]
    pub fn write(&mut self, idx: usize, val: u32) {
        self.words[idx & (SCRATCH_WORDS - 1)] = val;
    }

    /// Real base address of the trap vector table (zero = unconfigured).
    #[inline]
    pub fn trap_table(&self) -> u32 {
        self.words[SP_TRAP_TABLE]
    }

    /// Real base address of the interrupt vector table.
    #[inline]
    pub fn interrupt_table(&self) -> u32 {
        self.words[SP_INT_TABLE]
    }

    /// Real base address of the master page list.
    #[inline]
    pub fn mpl_base(&self) -> u32 {
        self.words[SP_MPL_BASE]
    }

    /// Configured boot device id.
    #[inline]
    pub fn boot_device(&self) -> u32 {
        self.words[SP_BOOT_DEVICE]
    }

    /// Identity key: model id and context id, readable by `RDSTS`.
    #[inline]
    pub fn identity(&self) -> u32 {
        self.words[SP_IDENTITY]
    }
}
