//! Virtual memory access layer.
//!
//! All program-visible memory traffic goes through here: alignment check,
//! translation, then word-granular access to main memory. Sub-word writes
//! read-modify-write the containing word. A failure at any stage
//! propagates as the trap unchanged, with no partial write. Byte lanes are
//! numbered big-endian: byte 0 is the most significant lane of its word.

use crate::common::{AccessKind, RealAddr, Trap, VirtAddr};
use crate::isa::{Decoded, decode};

use super::Context;

impl Context {
    /// Translates `va` through this context's MMU.
    fn translate(&mut self, va: VirtAddr, access: AccessKind) -> Result<RealAddr, Trap> {
        let t = self
            .mmu
            .translate(va, access, &self.psd, &self.scratchpad, &self.mem)?;
        Ok(t.real)
    }

    /// Reads the aligned word at `va`.
    pub fn read_word(&mut self, va: VirtAddr) -> Result<u32, Trap> {
        if va.val() & 3 != 0 {
            return Err(Trap::AddressSpecification(va.val()));
        }
        let ra = self.translate(va, AccessKind::Read)?;
        self.mem.read32(ra)
    }

    /// Reads the aligned halfword at `va`, zero-extended.
    pub fn read_half(&mut self, va: VirtAddr) -> Result<u32, Trap> {
        if va.val() & 1 != 0 {
            return Err(Trap::AddressSpecification(va.val()));
        }
        let ra = self.translate(va, AccessKind::Read)?;
        let word = self.mem.read32(ra)?;
        Ok(if va.val() & 2 == 0 {
            word >> 16
        } else {
            word & 0xFFFF
        })
    }

    /// Reads the byte at `va`, zero-extended.
    pub fn read_byte(&mut self, va: VirtAddr) -> Result<u32, Trap> {
        let ra = self.translate(va, AccessKind::Read)?;
        let word = self.mem.read32(ra)?;
        let lane = va.val() & 3;
        Ok((word >> (8 * (3 - lane))) & 0xFF)
    }

    /// Reads the doubleword-aligned 64-bit operand at `va` (high word
    /// first).
    pub fn read_double(&mut self, va: VirtAddr) -> Result<u64, Trap> {
        if va.val() & 7 != 0 {
            return Err(Trap::AddressSpecification(va.val()));
        }
        let high = self.read_word(va)?;
        let low = self.read_word(VirtAddr::new(va.val() + 4))?;
        Ok((u64::from(high) << 32) | u64::from(low))
    }

    /// Writes the aligned word at `va`.
    pub fn write_word(&mut self, va: VirtAddr, val: u32) -> Result<(), Trap> {
        if va.val() & 3 != 0 {
            return Err(Trap::AddressSpecification(va.val()));
        }
        let ra = self.translate(va, AccessKind::Write)?;
        self.mem.write32(ra, val)
    }

    /// Writes the aligned halfword at `va` (read-modify-write).
    pub fn write_half(&mut self, va: VirtAddr, val: u16) -> Result<(), Trap> {
        if va.val() & 1 != 0 {
            return Err(Trap::AddressSpecification(va.val()));
        }
        let ra = self.translate(va, AccessKind::Write)?;
        let word = self.mem.read32(ra)?;
        let merged = if va.val() & 2 == 0 {
            (word & 0x0000_FFFF) | (u32::from(val) << 16)
        } else {
            (word & 0xFFFF_0000) | u32::from(val)
        };
        self.mem.write32(ra, merged)
    }

    /// Writes the byte at `va` (read-modify-write).
    pub fn write_byte(&mut self, va: VirtAddr, val: u8) -> Result<(), Trap> {
        let ra = self.translate(va, AccessKind::Write)?;
        let word = self.mem.read32(ra)?;
        let shift = 8 * (3 - (va.val() & 3));
        let merged = (word & !(0xFF << shift)) | (u32::from(val) << shift);
        self.mem.write32(ra, merged)
    }

    /// Writes the doubleword-aligned 64-bit operand at `va`.
    pub fn write_double(&mut self, va: VirtAddr, val: u64) -> Result<(), Trap> {
        if va.val() & 7 != 0 {
            return Err(Trap::AddressSpecification(va.val()));
        }
        self.write_word(va, (val >> 32) as u32)?;
        self.write_word(VirtAddr::new(va.val() + 4), val as u32)
    }

    /// Fetches and classifies the instruction at the current instruction
    /// pointer.
    ///
    /// Halfword instructions are packed two per word; one fetched from the
    /// right half is left-normalized so the decoder's extractors apply
    /// uniformly. A word-format instruction found at an odd halfword
    /// boundary is an address-specification trap.
    ///
    /// # Errors
    ///
    /// `AddressSpecification` for a misaligned instruction pointer, plus
    /// anything translation or memory can raise.
    pub(super) fn fetch(&mut self) -> Result<Decoded, Trap> {
        self.last_len = 4;
        let ip = self.psd.ip();
        if ip & 1 != 0 {
            return Err(Trap::AddressSpecification(ip));
        }

        let va = VirtAddr::new(ip & !3);
        let ra = self.translate(va, AccessKind::Fetch)?;
        let word = self.mem.read32(ra)?;

        let raw = if ip & 2 == 0 { word } else { word << 16 };
        let based = self.based_active();
        let decoded = decode(raw, based);
        if decoded.attrs.halfword {
            self.last_len = 2;
            // Mask off the neighboring halfword so traces and trap detail
            // words carry only this instruction.
            return Ok(decode(raw & 0xFFFF_0000, based));
        }
        if ip & 2 != 0 {
            return Err(Trap::AddressSpecification(ip));
        }
        Ok(decoded)
    }
}
