//! Flat boot-image loader.
//!
//! Boot images are raw big-endian words with no header; the harness picks
//! the load origin (usually zero) and points the boot PSD at the entry.
//! A trailing partial word is zero padded on the right, matching what the
//! boot channel would deposit.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::common::RealAddr;
use crate::mem::MainMemory;

/// Loader failure.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Filesystem error reading the image.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// Image does not fit in configured memory at the given origin.
    #[error("image of {image} bytes at {origin:#08x} exceeds {memory} bytes of memory")]
    TooLarge {
        /// Image size in bytes.
        image: usize,
        /// Load origin.
        origin: u32,
        /// Configured memory size.
        memory: usize,
    },

    /// Load origin is not word aligned.
    #[error("unaligned load origin {0:#08x}")]
    UnalignedOrigin(u32),
}

/// Deposits `bytes` into memory at `origin` as big-endian words.
///
/// Returns the number of bytes loaded (the image size).
///
/// # Errors
///
/// [`LoadError::UnalignedOrigin`] or [`LoadError::TooLarge`]; the memory
/// contents are untouched on error.
pub fn load_image(mem: &MainMemory, origin: u32, bytes: &[u8]) -> Result<usize, LoadError> {
    if origin & 3 != 0 {
        return Err(LoadError::UnalignedOrigin(origin));
    }
    if origin as usize + bytes.len() > mem.size() {
        return Err(LoadError::TooLarge {
            image: bytes.len(),
            origin,
            memory: mem.size(),
        });
    }
    for (i, chunk) in bytes.chunks(4).enumerate() {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        let addr = RealAddr::new(origin + 4 * i as u32);
        // Unreachable after the size check, but kept total.
        if mem.write32(addr, u32::from_be_bytes(word)).is_err() {
            return Err(LoadError::TooLarge {
                image: bytes.len(),
                origin,
                memory: mem.size(),
            });
        }
    }
    Ok(bytes.len())
}

/// Reads an image file and deposits it at `origin`.
///
/// # Errors
///
/// Filesystem errors plus everything [`load_image`] raises.
pub fn load_file(mem: &MainMemory, origin: u32, path: &Path) -> Result<usize, LoadError> {
    let bytes = fs::read(path)?;
    load_image(mem, origin, &bytes)
}
