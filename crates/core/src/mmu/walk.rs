//! Page table walker.
//!
//! Traverses the three-level hierarchy the emulated operating system builds
//! in main memory: master page list (one two-word entry per CPIX) →
//! segment descriptor list → page descriptor. Every table read is bounds
//! checked against configured physical memory; an out-of-range table is a
//! non-present-memory fault, distinct from a map fault.

use crate::arch::Scratchpad;
use crate::common::{AccessKind, RealAddr, Trap, VirtAddr};
use crate::config::CpuModel;
use crate::mem::MainMemory;

use super::cache::MapEntry;

/// Pages covered by one segment descriptor.
pub const SEG_PAGES: u32 = 64;

/// Bytes per master-page-list entry (two words per CPIX).
pub const MPL_ENTRY_BYTES: u32 = 8;

/// Segment descriptor valid bit (MSB-first bit 0).
pub const SD_VALID: u32 = 0x8000_0000;

/// Page descriptor valid bit.
pub const PD_VALID: u32 = 0x8000_0000;
/// Page descriptor accessed bit.
pub const PD_ACCESSED: u32 = 0x4000_0000;
/// Page descriptor modified bit.
pub const PD_MODIFIED: u32 = 0x2000_0000;
/// Page descriptor protection nibble (MSB-first bits 4-7).
pub const PD_PROT_SHIFT: u32 = 24;
/// Mask of the protection nibble after shifting.
pub const PD_PROT_MASK: u32 = 0xF;
/// Page descriptor frame field (MSB-first bits 12-31).
pub const PD_FRAME_MASK: u32 = 0x000F_FFFF;

/// Extracts the table address carried in the low 24 bits of a descriptor,
/// forced to word alignment.
#[inline]
const fn table_addr(word: u32) -> u32 {
    word & 0x00FF_FFFC
}

/// Resolves the page descriptor for `va` in context `cpix`.
///
/// On success the accessed bit has been set in the backing descriptor and
/// a populated [`MapEntry`] is returned for the caches. The modify bit is
/// the translator's job after the protection check.
///
/// # Errors
///
/// `MapFault` for structural misses (no tables, segment out of range or
/// invalid, invalid page on a non-demand model); `DemandPageFault` for an
/// invalid page descriptor on a demand-paging model; `NonPresentMemory`
/// when any table level lies beyond configured memory.
pub fn walk(
    model: CpuModel,
    va: VirtAddr,
    access: AccessKind,
    cpix: u32,
    scratchpad: &Scratchpad,
    mem: &MainMemory,
) -> Result<MapEntry, Trap> {
    let page = va.page_number(model.page_shift());

    let mpl = scratchpad.mpl_base();
    if mpl == 0 {
        return Err(Trap::MapFault(va.val()));
    }

    let head = mem.read32(RealAddr::new(mpl + cpix * MPL_ENTRY_BYTES))?;
    let seg_count = head >> 24;
    let sdl_base = table_addr(head);

    let seg = page / SEG_PAGES;
    if seg >= seg_count || sdl_base == 0 {
        return Err(Trap::MapFault(va.val()));
    }

    let sd = mem.read32(RealAddr::new(sdl_base + seg * 4))?;
    if sd & SD_VALID == 0 {
        return Err(Trap::MapFault(va.val()));
    }

    let desc_addr = table_addr(sd) + (page % SEG_PAGES) * 4;
    let pd = mem.read32(RealAddr::new(desc_addr))?;
    if pd & PD_VALID == 0 {
        if model.demand_paging() {
            return Err(Trap::DemandPageFault {
                page,
                fetch: matches!(access, AccessKind::Fetch),
            });
        }
        return Err(Trap::MapFault(va.val()));
    }

    if pd & PD_ACCESSED == 0 {
        mem.write32(RealAddr::new(desc_addr), pd | PD_ACCESSED)?;
    }

    Ok(MapEntry {
        valid: true,
        accessed: true,
        modified: pd & PD_MODIFIED != 0,
        prot: ((pd >> PD_PROT_SHIFT) & PD_PROT_MASK) as u8,
        frame: pd & PD_FRAME_MASK,
        desc: desc_addr,
    })
}
