//! Register file.
//!
//! Eight 32-bit general registers, with adjacent even/odd pairs forming
//! 64-bit operands (even register holds the high word), plus the eight base
//! registers available in based mode. Mutated only by the execution core
//! under the owning context's PSD.

/// Number of general (and base) registers.
pub const NUM_REGS: usize = 8;

/// General and base register state for one processor context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    gpr: [u32; NUM_REGS],
    base: [u32; NUM_REGS],
}

impl RegisterFile {
    /// Creates a zeroed register file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads general register `r` (masked to the register count).
    #[inline(always)]
    pub fn read(&self, r: usize) -> u32 {
        self.gpr[r & (NUM_REGS - 1)]
    }

    /// Writes general register `r`.
    #[inline(always)]
    pub fn write(&mut self, r: usize, val: u32) {
        self.gpr[r & (NUM_REGS - 1)] = val;
    }

    /// Reads the 64-bit even/odd pair containing register `r`.
    ///
    /// The even register supplies the high word.
    #[inline]
    pub fn read_pair(&self, r: usize) -> u64 {
        let even = r & !1 & (NUM_REGS - 1);
        (u64::from(self.gpr[even]) << 32) | u64::from(self.gpr[even | 1])
    }

    /// Writes the 64-bit even/odd pair containing register `r`.
    #[inline]
    pub fn write_pair(&mut self, r: usize, val: u64) {
        let even = r & !1 & (NUM_REGS - 1);
        self.gpr[even] = (val >> 32) as u32;
        self.gpr[even | 1] = val as u32;
    }

    /// Reads base register `b`.
    #[inline(always)]
    pub fn read_base(&self, b: usize) -> u32 {
        self.base[b & (NUM_REGS - 1)]
    }

    /// Writes base register `b`.
    #[inline(always)]
    pub fn write_base(&mut self, b: usize, val: u32) {
        self.base[b & (NUM_REGS - 1)] = val;
    }

    /// Snapshot of the general registers, for trace records and call
    /// frames.
    #[inline]
    pub fn snapshot(&self) -> [u32; NUM_REGS] {
        self.gpr
    }

    /// Snapshot of the base registers.
    #[inline]
    pub fn base_snapshot(&self) -> [u32; NUM_REGS] {
        self.base
    }
}
