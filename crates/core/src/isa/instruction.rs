//! Raw instruction word and field extraction.
//!
//! Instruction formats, bits numbered MSB first:
//!
//! ```text
//! word:      op[0-7] R[8-10] X/B[11-13] addr[14-31]
//! immediate: op[0-7] R[8-10] ---        imm16[16-31]
//! bit-mem:   op[0-7] bit[8-12]          addr[14-31]
//! halfword:  op[0-7] R[8-10] ---   (packed two per word, left half first)
//! ```
//!
//! A halfword instruction fetched from the right half of a word is
//! normalized by shifting it into the high halfword, so these extractors
//! apply uniformly.

/// A raw 32-bit instruction (or left-normalized halfword instruction).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instr(pub u32);

impl Instr {
    /// Opcode byte (bits 0-7), the classification-table index.
    #[inline(always)]
    pub const fn op(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// R field (bits 8-10): destination/source register or branch
    /// condition.
    #[inline(always)]
    pub const fn r(self) -> usize {
        ((self.0 >> 21) & 7) as usize
    }

    /// X field (bits 11-13): index register, or base register in based
    /// mode, or source register for register-register forms.
    #[inline(always)]
    pub const fn x(self) -> usize {
        ((self.0 >> 18) & 7) as usize
    }

    /// 18-bit address field (bits 14-31), a byte address.
    #[inline(always)]
    pub const fn addr18(self) -> u32 {
        self.0 & 0x3FFFF
    }

    /// Sign-extended 16-bit immediate (bits 16-31).
    #[inline(always)]
    pub const fn imm16(self) -> i32 {
        self.0 as u16 as i16 as i32
    }

    /// Unsigned 16-bit immediate (bits 16-31).
    #[inline(always)]
    pub const fn uimm16(self) -> u16 {
        self.0 as u16
    }

    /// Shift count (bits 26-31); callers reduce modulo register width.
    #[inline(always)]
    pub const fn shift_count(self) -> u32 {
        self.0 & 0x3F
    }

    /// Bit number for the interlocked bit-memory ops (bits 8-12).
    #[inline(always)]
    pub const fn bit_number(self) -> u32 {
        (self.0 >> 19) & 0x1F
    }
}

impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
