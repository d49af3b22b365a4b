//! # PSD Accessor Tests

use c32_core::arch::Psd;
use c32_core::arch::psd::{CC_NEGATIVE, CC_OVERFLOW, CC_POSITIVE, CC_ZERO};
use pretty_assertions::assert_eq;

#[test]
fn test_privileged_bit_is_msb() {
    let psd = Psd::new(0x8000_0000, 0);
    assert!(psd.privileged());
    assert!(!Psd::new(0x7FFF_FFFF, 0).privileged());
}

#[test]
fn test_cc_roundtrip() {
    let mut psd = Psd::default();
    for cc in 0..16u8 {
        psd.set_cc(cc);
        assert_eq!(psd.cc(), cc);
    }
    psd.set_cc(CC_OVERFLOW | CC_ZERO);
    assert!(psd.cc_overflow());
    assert!(psd.cc_zero());
    assert!(!psd.cc_positive());
    assert!(!psd.cc_negative());
}

#[test]
fn test_cc_does_not_disturb_neighbors() {
    let mut psd = Psd::new(0x8000_0000, 0);
    psd.set_ip(0x1234);
    psd.set_cc(CC_POSITIVE | CC_NEGATIVE);
    assert!(psd.privileged());
    assert_eq!(psd.ip(), 0x1234);
}

#[test]
fn test_ip_masks_to_24_bits() {
    let mut psd = Psd::default();
    psd.set_ip(0xFF12_3456);
    assert_eq!(psd.ip(), 0x12_3456);
}

#[test]
fn test_mode_bits() {
    // Bits 5, 6, 7 of word 1.
    let psd = Psd::new(0x0700_0000, 0);
    assert!(psd.extended());
    assert!(psd.based());
    assert!(psd.arithmetic_trap_enabled());
}

#[test]
fn test_word2_bits() {
    let psd = Psd::new(0, 0xE000_0123);
    assert!(psd.mapped());
    assert!(psd.retain_maps());
    assert!(psd.blocked());
    assert_eq!(psd.cpix(), 0x123);
}

#[test]
fn test_blocked_toggles() {
    let mut psd = Psd::default();
    psd.set_blocked(true);
    assert!(psd.blocked());
    psd.set_blocked(false);
    assert!(!psd.blocked());
}

#[test]
fn test_cpix_masks_to_11_bits() {
    let mut psd = Psd::default();
    psd.set_cpix(0xFFFF);
    assert_eq!(psd.cpix(), 0x7FF);
}

#[test]
fn test_zero_psd_detection() {
    assert!(Psd::default().is_zero());
    assert!(!Psd::new(1, 0).is_zero());
}
