//! # Configuration Tests

use c32_core::config::{Config, CpuModel};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_default_is_a_single_processor_c67() {
    let config = Config::default();
    assert_eq!(config.model, CpuModel::C67);
    assert!(!config.ipu);
    assert!(!config.halt_trap);
    assert!(!config.trace);
    assert_eq!(config.memory.size, 2 * 1024 * 1024);
    // Privileged, unmapped, IP 0.
    assert_eq!(config.boot.psd1, 0x8000_0000);
    assert_eq!(config.boot.psd2, 0);
}

#[test]
fn test_partial_json_fills_defaults() {
    let config = Config::from_json(r#"{"model": "C27", "ipu": true}"#).unwrap();
    assert_eq!(config.model, CpuModel::C27);
    assert!(config.ipu);
    assert_eq!(config.memory.size, 2 * 1024 * 1024);
}

#[test]
fn test_nested_sections_parse() {
    let config =
        Config::from_json(r#"{"memory": {"size": 1048576}, "boot": {"psd1": 2147487744}}"#)
            .unwrap();
    assert_eq!(config.memory.size, 0x10_0000);
    assert_eq!(config.boot.psd1, 0x8000_1000);
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(Config::from_json("{model: C67}").is_err());
}

#[rstest]
#[case::c7x(CpuModel::C7X, 32, 13, false, false, false, 0x75)]
#[case::c27(CpuModel::C27, 256, 11, false, false, false, 0x27)]
#[case::c67(CpuModel::C67, 2048, 11, true, true, true, 0x67)]
#[case::c87(CpuModel::C87, 2048, 11, true, true, false, 0x87)]
#[case::c97(CpuModel::C97, 2048, 11, true, true, true, 0x97)]
fn test_model_parameters(
    #[case] model: CpuModel,
    #[case] entries: usize,
    #[case] shift: u32,
    #[case] quarter: bool,
    #[case] based: bool,
    #[case] demand: bool,
    #[case] id: u32,
) {
    assert_eq!(model.map_entries(), entries);
    assert_eq!(model.page_shift(), shift);
    assert_eq!(model.quarter_page_protection(), quarter);
    assert_eq!(model.based_available(), based);
    assert_eq!(model.demand_paging(), demand);
    assert_eq!(model.id(), id);
}
