//! Address translator.
//!
//! Resolves virtual addresses to real addresses plus protection, using the
//! map cache and fast-path cache, walking the in-memory page tables on a
//! miss, and raising demand-page faults on models that support them.
//! Translation is idempotent: re-invoking `translate` after the operating
//! system services a demand fault behaves exactly as if the page had been
//! resident from the start.

/// Map cache and fast-path address cache.
pub mod cache;

/// Page table walker.
pub mod walk;

use serde::Serialize;

use crate::arch::{Psd, Scratchpad};
use crate::common::{AccessKind, PHYS_MASK, RealAddr, Translation, Trap, VirtAddr};
use crate::config::CpuModel;
use crate::mem::MainMemory;

use self::cache::{FastCache, MapCache, MapEntry};
use self::walk::PD_MODIFIED;

/// Translator activity counters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MmuStats {
    /// Translations resolved by the fast-path cache.
    pub fast_hits: u64,
    /// Full page-table walks performed.
    pub walks: u64,
    /// Demand-page faults raised.
    pub demand_faults: u64,
    /// Wholesale cache invalidations (context changes).
    pub invalidations: u64,
}

/// Per-context address translator: the two caches plus model parameters.
#[derive(Debug)]
pub struct Mmu {
    map: MapCache,
    fast: FastCache,
    model: CpuModel,
    /// Activity counters, reported with the context's stats.
    pub stats: MmuStats,
}

impl Mmu {
    /// Creates a translator sized for `model`.
    pub fn new(model: CpuModel) -> Self {
        let pages = model.map_entries();
        Self {
            map: MapCache::new(pages),
            fast: FastCache::new(pages),
            model,
            stats: MmuStats::default(),
        }
    }

    /// The model this translator is configured for.
    pub const fn model(&self) -> CpuModel {
        self.model
    }

    /// Read-only view of a map-cache entry, for diagnostics and tests.
    pub fn map_entry(&self, page: u32) -> &MapEntry {
        self.map.entry(page)
    }

    /// Invalidates both caches wholesale. Called on CPIX change and on any
    /// PSD load without the retain-mapping bit.
    pub fn invalidate_all(&mut self) {
        self.map.invalidate_all();
        self.fast.invalidate_all();
        self.stats.invalidations += 1;
    }

    /// Translates `va` for `access` under `psd`.
    ///
    /// Unmapped contexts pass the address through truncated to physical
    /// width with no protection check. Mapped translation consults the
    /// fast-path cache, then walks the page tables, populating both caches
    /// and maintaining the accessed/modified bits in the backing
    /// descriptor.
    ///
    /// # Errors
    ///
    /// `MapFault`, `DemandPageFault`, `NonPresentMemory`, or
    /// `ProtectionViolation`, propagated unchanged to the caller.
    pub fn translate(
        &mut self,
        va: VirtAddr,
        access: AccessKind,
        psd: &Psd,
        scratchpad: &Scratchpad,
        mem: &MainMemory,
    ) -> Result<Translation, Trap> {
        if !psd.mapped() {
            return Ok(Translation::new(RealAddr::new(va.val() & PHYS_MASK), 0));
        }

        let shift = self.model.page_shift();
        let page = va.page_number(shift);
        if page as usize >= self.map.len() {
            return Err(Trap::MapFault(va.val()));
        }
        let offset = va.page_offset(shift);

        let fe = self.fast.entry(page);
        if fe.hit {
            self.stats.fast_hits += 1;
            self.check_protection(page, offset, access, psd, va)?;
            if access == AccessKind::Write {
                self.ensure_modified(page, mem)?;
            }
            let prot = self.map.entry(page).prot;
            return Ok(Translation::new(RealAddr::new(fe.base | offset), prot));
        }

        self.stats.walks += 1;
        let entry = match walk::walk(self.model, va, access, psd.cpix(), scratchpad, mem) {
            Ok(entry) => entry,
            Err(trap) => {
                if matches!(trap, Trap::DemandPageFault { .. }) {
                    self.stats.demand_faults += 1;
                }
                return Err(trap);
            }
        };

        let base = (entry.frame << shift) & PHYS_MASK;
        *self.map.entry_mut(page) = entry;
        self.fast.install(page, base);

        self.check_protection(page, offset, access, psd, va)?;
        if access == AccessKind::Write {
            self.ensure_modified(page, mem)?;
        }

        Ok(Translation::new(RealAddr::new(base | offset), entry.prot))
    }

    /// Primes the caches for every resident page of `cpix` (`LMAP`).
    ///
    /// Pages whose descriptors are invalid are skipped, not faulted; the
    /// return value is the number of mappings loaded.
    ///
    /// # Errors
    ///
    /// `NonPresentMemory` when a table level lies beyond configured
    /// memory.
    pub fn load_maps(
        &mut self,
        cpix: u32,
        scratchpad: &Scratchpad,
        mem: &MainMemory,
    ) -> Result<u32, Trap> {
        self.invalidate_all();
        let shift = self.model.page_shift();
        let mut loaded = 0;
        for page in 0..self.map.len() as u32 {
            let va = VirtAddr::new(page << shift);
            match walk::walk(self.model, va, AccessKind::Read, cpix, scratchpad, mem) {
                Ok(entry) => {
                    let base = (entry.frame << shift) & PHYS_MASK;
                    *self.map.entry_mut(page) = entry;
                    self.fast.install(page, base);
                    loaded += 1;
                }
                Err(Trap::MapFault(_) | Trap::DemandPageFault { .. }) => {}
                Err(other) => return Err(other),
            }
        }
        Ok(loaded)
    }

    /// Write-protection check for `page` at `offset`.
    ///
    /// Privileged contexts bypass protection entirely; reads and fetches
    /// are never protection checked. Granularity is whole-page or quarter-
    /// page depending on the model.
    fn check_protection(
        &self,
        page: u32,
        offset: u32,
        access: AccessKind,
        psd: &Psd,
        va: VirtAddr,
    ) -> Result<(), Trap> {
        if access.is_read() || psd.privileged() {
            return Ok(());
        }
        let prot = self.map.entry(page).prot;
        if prot == 0 {
            return Ok(());
        }
        let violated = if self.model.quarter_page_protection() {
            let quarter = offset >> (self.model.page_shift() - 2);
            prot & (0b1000 >> quarter) != 0
        } else {
            // Whole-page models treat any nonzero nibble as full protection.
            true
        };
        if violated {
            return Err(Trap::ProtectionViolation(va.val()));
        }
        Ok(())
    }

    /// Sets the modify bit in the cache entry and its backing descriptor.
    fn ensure_modified(&mut self, page: u32, mem: &MainMemory) -> Result<(), Trap> {
        let entry = self.map.entry_mut(page);
        if entry.modified {
            return Ok(());
        }
        let desc = RealAddr::new(entry.desc);
        let pd = mem.read32(desc)?;
        mem.write32(desc, pd | PD_MODIFIED)?;
        entry.modified = true;
        Ok(())
    }
}
