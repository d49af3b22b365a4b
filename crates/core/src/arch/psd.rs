//! Program Status Doubleword.
//!
//! The PSD is two 32-bit words holding the instruction pointer, condition
//! codes, mode bits, and the active page-context index. Bits are numbered
//! MSB first (bit 0 is `0x8000_0000`), the convention the machine's
//! reference manuals use. The packed layout is kept as two plain integers
//! with accessor functions; nothing else in the engine touches the raw
//! bit positions.
//!
//! Word 1 (status + instruction pointer):
//! - bit 0: privileged
//! - bits 1-4: condition codes CC1 (overflow), CC2 (positive),
//!   CC3 (negative), CC4 (zero)
//! - bit 5: extended-addressing mode
//! - bit 6: based mode
//! - bit 7: arithmetic-exception trap enable
//! - bits 8-31: instruction pointer (24-bit byte address)
//!
//! Word 2 (memory control):
//! - bit 0: mapped
//! - bit 1: retain-mapping on PSD load
//! - bit 2: asynchronous signals blocked
//! - bits 21-31: CPIX (active page-context index)

use crate::common::PHYS_MASK;

/// Returns the mask for MSB-first bit `n` of a 32-bit word.
#[inline(always)]
const fn bit(n: u32) -> u32 {
    1 << (31 - n)
}

const PSD1_PRIVILEGED: u32 = bit(0);
const PSD1_CC_SHIFT: u32 = 27;
const PSD1_CC_MASK: u32 = 0xF << PSD1_CC_SHIFT;
const PSD1_EXTENDED: u32 = bit(5);
const PSD1_BASED: u32 = bit(6);
const PSD1_AEXP: u32 = bit(7);

const PSD2_MAPPED: u32 = bit(0);
const PSD2_RETAIN: u32 = bit(1);
const PSD2_BLOCKED: u32 = bit(2);
const PSD2_CPIX_MASK: u32 = 0x7FF;

/// Condition-code nibble: CC1, overflow.
pub const CC_OVERFLOW: u8 = 0b1000;
/// Condition-code nibble: CC2, positive.
pub const CC_POSITIVE: u8 = 0b0100;
/// Condition-code nibble: CC3, negative.
pub const CC_NEGATIVE: u8 = 0b0010;
/// Condition-code nibble: CC4, zero.
pub const CC_ZERO: u8 = 0b0001;

/// Program Status Doubleword: two raw words plus accessors.
///
/// Exclusively owned by one processor context. Replaced wholesale only by
/// trap vectoring or an explicit `LPSD`/`LPSDCM`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Psd {
    /// Status word (privilege, condition codes, modes, instruction pointer).
    pub w1: u32,
    /// Memory-control word (mapped, retain, blocked, CPIX).
    pub w2: u32,
}

impl Psd {
    /// Builds a PSD from its two raw words.
    #[inline]
    pub const fn new(w1: u32, w2: u32) -> Self {
        Self { w1, w2 }
    }

    /// True when both words are zero (an uninitialized handler PSD).
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.w1 == 0 && self.w2 == 0
    }

    /// Privileged state.
    #[inline]
    pub const fn privileged(self) -> bool {
        self.w1 & PSD1_PRIVILEGED != 0
    }

    /// Sets or clears the privileged bit.
    pub const fn set_privileged(&mut self, on: bool) {
        if on {
            self.w1 |= PSD1_PRIVILEGED;
        } else {
            self.w1 &= !PSD1_PRIVILEGED;
        }
    }

    /// The condition-code nibble (CC1..CC4, MSB first).
    #[inline]
    pub const fn cc(self) -> u8 {
        ((self.w1 & PSD1_CC_MASK) >> PSD1_CC_SHIFT) as u8
    }

    /// Replaces the condition-code nibble.
    #[inline]
    pub const fn set_cc(&mut self, cc: u8) {
        self.w1 = (self.w1 & !PSD1_CC_MASK) | (((cc & 0xF) as u32) << PSD1_CC_SHIFT);
    }

    /// CC1: overflow.
    #[inline]
    pub const fn cc_overflow(self) -> bool {
        self.cc() & CC_OVERFLOW != 0
    }

    /// CC2: positive result.
    #[inline]
    pub const fn cc_positive(self) -> bool {
        self.cc() & CC_POSITIVE != 0
    }

    /// CC3: negative result.
    #[inline]
    pub const fn cc_negative(self) -> bool {
        self.cc() & CC_NEGATIVE != 0
    }

    /// CC4: zero result.
    #[inline]
    pub const fn cc_zero(self) -> bool {
        self.cc() & CC_ZERO != 0
    }

    /// Extended-addressing mode (24-bit indexed reach).
    #[inline]
    pub const fn extended(self) -> bool {
        self.w1 & PSD1_EXTENDED != 0
    }

    /// Based addressing mode.
    #[inline]
    pub const fn based(self) -> bool {
        self.w1 & PSD1_BASED != 0
    }

    /// Arithmetic-exception trap enable.
    #[inline]
    pub const fn arithmetic_trap_enabled(self) -> bool {
        self.w1 & PSD1_AEXP != 0
    }

    /// Instruction pointer (24-bit byte address).
    #[inline]
    pub const fn ip(self) -> u32 {
        self.w1 & PHYS_MASK
    }

    /// Replaces the instruction pointer, preserving the status bits.
    #[inline]
    pub const fn set_ip(&mut self, ip: u32) {
        self.w1 = (self.w1 & !PHYS_MASK) | (ip & PHYS_MASK);
    }

    /// Virtual-memory mapping enabled.
    #[inline]
    pub const fn mapped(self) -> bool {
        self.w2 & PSD2_MAPPED != 0
    }

    /// Retain-mapping flag: suppresses cache invalidation when this PSD is
    /// loaded by a trap or `LPSDCM`.
    #[inline]
    pub const fn retain_maps(self) -> bool {
        self.w2 & PSD2_RETAIN != 0
    }

    /// Asynchronous signals blocked.
    #[inline]
    pub const fn blocked(self) -> bool {
        self.w2 & PSD2_BLOCKED != 0
    }

    /// Sets or clears the blocked bit (`BEI`/`UEI`).
    pub const fn set_blocked(&mut self, on: bool) {
        if on {
            self.w2 |= PSD2_BLOCKED;
        } else {
            self.w2 &= !PSD2_BLOCKED;
        }
    }

    /// Active page-context index.
    #[inline]
    pub const fn cpix(self) -> u32 {
        self.w2 & PSD2_CPIX_MASK
    }

    /// Replaces the CPIX.
    #[inline]
    pub const fn set_cpix(&mut self, cpix: u32) {
        self.w2 = (self.w2 & !PSD2_CPIX_MASK) | (cpix & PSD2_CPIX_MASK);
    }
}

impl std::fmt::Display for Psd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PSD[{:08x} {:08x}]", self.w1, self.w2)
    }
}
