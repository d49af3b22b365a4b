//! Virtual and real address types.
//!
//! Strong types for the two address spaces so translator inputs and outputs
//! cannot be mixed up. The machine addresses 24 bits of byte-addressable
//! memory in both spaces; the upper byte of a raw address word is ignored
//! by the hardware and masked here.

/// Number of significant address bits in both address spaces.
pub const ADDR_BITS: u32 = 24;

/// Mask selecting the significant bits of a virtual or real address.
pub const PHYS_MASK: u32 = (1 << ADDR_BITS) - 1;

/// A virtual (program-visible) byte address.
///
/// Virtual addresses are produced by effective-address computation and must
/// pass through the translator before touching real memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtAddr(pub u32);

/// A real (post-translation) byte address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RealAddr(pub u32);

impl VirtAddr {
    /// Wraps a raw address value, masking to the architectural width.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr & PHYS_MASK)
    }

    /// Returns the raw address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Byte offset within a page of `1 << page_shift` bytes.
    #[inline(always)]
    pub const fn page_offset(self, page_shift: u32) -> u32 {
        self.0 & ((1 << page_shift) - 1)
    }

    /// Virtual page number for a page size of `1 << page_shift` bytes.
    #[inline(always)]
    pub const fn page_number(self, page_shift: u32) -> u32 {
        (self.0 & PHYS_MASK) >> page_shift
    }
}

impl RealAddr {
    /// Wraps a raw address value, masking to the architectural width.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr & PHYS_MASK)
    }

    /// Returns the raw address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

impl std::fmt::Display for RealAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}
