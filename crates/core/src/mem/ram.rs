//! Main memory substrate.
//!
//! A flat, bounds-checked word array shared by both processor contexts.
//! On Unix the backing store is an anonymous `mmap`, so large memory sizes
//! cost nothing until touched; elsewhere a `Vec` allocation is used.
//!
//! Ordinary word accesses are deliberately unsynchronized: the architecture
//! makes cross-processor coordination the emulated software's problem, and
//! the engine must not add serialization the real machine did not have.
//! The single exception is the interlocked bit instructions, which hold
//! [`MainMemory::bit_lock`] for the duration of their read-modify-write.

use std::sync::{Mutex, MutexGuard};

use crate::common::{RealAddr, Trap};

/// Largest supported physical memory (the 24-bit address space).
pub const MAX_MEMORY: usize = 1 << 24;

/// Shared main memory: word-granular, bounds-checked, 24-bit addressed.
///
/// Sub-word lanes are composed by the memory access layer; this type only
/// moves whole 32-bit words at word-aligned real byte addresses.
pub struct MainMemory {
    ptr: *mut u32,
    size: usize,
    is_mmap: bool,
    /// Held only across interlocked bit read-modify-writes.
    bit_lock: Mutex<()>,
}

// SAFETY: both processor contexts intentionally share this buffer without a
// global lock, mirroring the physical bus. Racing word accesses return
// whatever the emulated software allowed them to race to, exactly as on
// the real machine.
unsafe impl Send for MainMemory {}
unsafe impl Sync for MainMemory {}

impl MainMemory {
    /// Allocates `size` bytes of zeroed main memory (rounded down to a
    /// whole word, capped at the 24-bit address space). The host rejects
    /// an empty mapping, so degenerate sizes floor to one word.
    pub fn new(size: usize) -> Self {
        let size = size.clamp(4, MAX_MEMORY) & !3;
        #[cfg(unix)]
        {
            use std::ptr;
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };
            assert!(
                ptr != libc::MAP_FAILED,
                "failed to mmap main memory of size {size}"
            );
            Self {
                ptr: ptr.cast::<u32>(),
                size,
                is_mmap: true,
                bit_lock: Mutex::new(()),
            }
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u32; size / 4];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Self {
                ptr,
                size,
                is_mmap: false,
                bit_lock: Mutex::new(()),
            }
        }
    }

    /// Configured memory size in bytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Reads the word containing real byte address `ra`.
    ///
    /// # Errors
    ///
    /// `Trap::NonPresentMemory` when `ra` is beyond configured memory.
    #[inline(always)]
    pub fn read32(&self, ra: RealAddr) -> Result<u32, Trap> {
        let addr = (ra.val() & !3) as usize;
        if addr >= self.size {
            return Err(Trap::NonPresentMemory(ra.val()));
        }
        // SAFETY: addr is word-aligned and below `size`, which bounds the
        // allocation made in `new`.
        Ok(unsafe { *self.ptr.add(addr / 4) })
    }

    /// Writes the word containing real byte address `ra`.
    ///
    /// # Errors
    ///
    /// `Trap::NonPresentMemory` when `ra` is beyond configured memory.
    #[inline(always)]
    pub fn write32(&self, ra: RealAddr, val: u32) -> Result<(), Trap> {
        let addr = (ra.val() & !3) as usize;
        if addr >= self.size {
            return Err(Trap::NonPresentMemory(ra.val()));
        }
        // SAFETY: as in `read32`.
        unsafe { *self.ptr.add(addr / 4) = val };
        Ok(())
    }

    /// Acquires the interlock for a bit read-modify-write.
    ///
    /// The guard is released on every exit path, including trap-triggered
    /// early returns, by falling out of scope.
    pub fn bit_interlock(&self) -> MutexGuard<'_, ()> {
        self.bit_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for MainMemory {
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: ptr/size are exactly the mapping created in `new`.
            unsafe {
                let _ = libc::munmap(self.ptr.cast(), self.size);
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: reconstructs the Vec forgotten in `new`.
            unsafe {
                let _ = Vec::from_raw_parts(self.ptr, self.size / 4, self.size / 4);
            }
        }
    }
}

impl std::fmt::Debug for MainMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainMemory")
            .field("size", &self.size)
            .field("is_mmap", &self.is_mmap)
            .finish_non_exhaustive()
    }
}
