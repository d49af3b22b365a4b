//! # Boot Image Loader Tests

use std::io::Write;
use std::path::Path;

use c32_core::common::RealAddr;
use c32_core::mem::MainMemory;
use c32_core::sim::{LoadError, load_file, load_image};
use pretty_assertions::assert_eq;

#[test]
fn test_words_are_big_endian() {
    let mem = MainMemory::new(0x1000);
    let n = load_image(&mem, 0x100, &[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04]).unwrap();
    assert_eq!(n, 8);
    assert_eq!(mem.read32(RealAddr::new(0x100)).unwrap(), 0xDEAD_BEEF);
    assert_eq!(mem.read32(RealAddr::new(0x104)).unwrap(), 0x0102_0304);
}

#[test]
fn test_partial_tail_is_zero_padded() {
    let mem = MainMemory::new(0x1000);
    let n = load_image(&mem, 0, &[0xAA, 0xBB, 0xCC]).unwrap();
    assert_eq!(n, 3);
    assert_eq!(mem.read32(RealAddr::new(0)).unwrap(), 0xAABB_CC00);
}

#[test]
fn test_unaligned_origin_rejected() {
    let mem = MainMemory::new(0x1000);
    assert!(matches!(
        load_image(&mem, 2, &[0; 4]),
        Err(LoadError::UnalignedOrigin(2))
    ));
}

#[test]
fn test_oversized_image_leaves_memory_untouched() {
    let mem = MainMemory::new(0x100);
    let err = load_image(&mem, 0x80, &[0xFF; 0x100]).unwrap_err();
    assert!(matches!(
        err,
        LoadError::TooLarge {
            image: 0x100,
            origin: 0x80,
            ..
        }
    ));
    assert_eq!(mem.read32(RealAddr::new(0x80)).unwrap(), 0);
}

#[test]
fn test_load_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0, 0, 0x12, 0x34]).unwrap();

    let mem = MainMemory::new(0x1000);
    let n = load_file(&mem, 0, file.path()).unwrap();
    assert_eq!(n, 4);
    assert_eq!(mem.read32(RealAddr::new(0)).unwrap(), 0x1234);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let mem = MainMemory::new(0x1000);
    assert!(matches!(
        load_file(&mem, 0, Path::new("/nonexistent/image.bin")),
        Err(LoadError::Io(_))
    ));
}
