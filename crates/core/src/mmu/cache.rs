//! Map cache and fast-path address cache.
//!
//! The map cache holds one entry per virtual page of the active context:
//! validity, accessed/modified state, the write-protection nibble, and the
//! real frame number, refreshed from the in-memory page tables by the
//! walker. The fast-path cache runs parallel to it and holds the already
//! computed real page base plus a hit flag, so the common case resolves
//! with one index and one OR.
//!
//! Invariant: a hit-flagged fast entry always agrees with its map-cache
//! counterpart. Both caches are created lazily and invalidated wholesale
//! on context change; there is no per-entry aging.

/// One map-cache entry (one virtual page).
#[derive(Clone, Copy, Debug, Default)]
pub struct MapEntry {
    /// Entry holds a translation.
    pub valid: bool,
    /// Page has been referenced since the descriptor was loaded.
    pub accessed: bool,
    /// Page has been written; mirrors the backing descriptor's bit.
    pub modified: bool,
    /// Write-protection nibble (one bit per quarter page, MSB first).
    pub prot: u8,
    /// Real frame number.
    pub frame: u32,
    /// Real address of the backing page descriptor, kept so the modify
    /// bit can be written back without re-walking.
    pub desc: u32,
}

/// One fast-path entry: precomputed real page base plus hit flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastEntry {
    /// Entry is usable; implies the map-cache counterpart is valid.
    pub hit: bool,
    /// Real byte address of the page base.
    pub base: u32,
}

/// Per-page translation metadata for the active context.
#[derive(Debug)]
pub struct MapCache {
    entries: Vec<MapEntry>,
}

impl MapCache {
    /// Creates an invalid cache with one slot per virtual page.
    pub fn new(pages: usize) -> Self {
        Self {
            entries: vec![MapEntry::default(); pages],
        }
    }

    /// Number of virtual pages this model maps.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache maps no pages (never the case for real models).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Immutable entry access.
    #[inline(always)]
    pub fn entry(&self, page: u32) -> &MapEntry {
        &self.entries[page as usize]
    }

    /// Mutable entry access.
    #[inline(always)]
    pub fn entry_mut(&mut self, page: u32) -> &mut MapEntry {
        &mut self.entries[page as usize]
    }

    /// Invalidates every entry.
    pub fn invalidate_all(&mut self) {
        for e in &mut self.entries {
            e.valid = false;
        }
    }
}

/// Parallel cache of resolved real page bases.
#[derive(Debug)]
pub struct FastCache {
    entries: Vec<FastEntry>,
}

impl FastCache {
    /// Creates an empty fast-path cache with one slot per virtual page.
    pub fn new(pages: usize) -> Self {
        Self {
            entries: vec![FastEntry::default(); pages],
        }
    }

    /// Entry lookup.
    #[inline(always)]
    pub fn entry(&self, page: u32) -> FastEntry {
        self.entries[page as usize]
    }

    /// Installs a resolved base for `page`.
    #[inline(always)]
    pub fn install(&mut self, page: u32, base: u32) {
        self.entries[page as usize] = FastEntry { hit: true, base };
    }

    /// Clears every hit flag.
    pub fn invalidate_all(&mut self) {
        for e in &mut self.entries {
            e.hit = false;
        }
    }
}
