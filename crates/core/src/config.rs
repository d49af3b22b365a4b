//! Machine configuration.
//!
//! Everything model-dependent is parameterized here and supplied once at
//! start: processor model (map-table size, page size, protection
//! granularity, based-mode availability, demand paging), physical memory
//! size, the privileged-halt-trap enable, companion-processor enable, and
//! boot register values. Deserializable from JSON for the harness;
//! `Config::default()` gives a sensible single-processor machine.

use serde::{Deserialize, Serialize};

/// Processor model id.
///
/// The model fixes the map-table geometry and feature set. These are
/// static parameters of the emulated machine, never changed after start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum CpuModel {
    /// Early model: 32 maps of 8 KiB, whole-page protection, no based
    /// mode, no demand paging.
    C7X,
    /// 256 maps of 2 KiB, whole-page protection.
    C27,
    /// 2048 maps of 2 KiB, quarter-page protection, based mode, demand
    /// paging.
    #[default]
    C67,
    /// As C67 but without demand paging (invalid descriptors map-fault).
    C87,
    /// Top model: as C67.
    C97,
}

impl CpuModel {
    /// Number of map-cache entries (virtual pages per context).
    pub const fn map_entries(self) -> usize {
        match self {
            Self::C7X => 32,
            Self::C27 => 256,
            Self::C67 | Self::C87 | Self::C97 => 2048,
        }
    }

    /// log2 of the page size in bytes.
    pub const fn page_shift(self) -> u32 {
        match self {
            Self::C7X => 13,
            _ => 11,
        }
    }

    /// True when write protection applies per quarter page rather than to
    /// the whole page.
    pub const fn quarter_page_protection(self) -> bool {
        matches!(self, Self::C67 | Self::C87 | Self::C97)
    }

    /// True when the based-mode register set and instruction table exist.
    pub const fn based_available(self) -> bool {
        matches!(self, Self::C67 | Self::C87 | Self::C97)
    }

    /// True when an invalid page descriptor raises a retryable demand-page
    /// fault instead of a map fault.
    pub const fn demand_paging(self) -> bool {
        matches!(self, Self::C67 | Self::C97)
    }

    /// Numeric model id, reported in the identity scratchpad word.
    pub const fn id(self) -> u32 {
        match self {
            Self::C7X => 0x75,
            Self::C27 => 0x27,
            Self::C67 => 0x67,
            Self::C87 => 0x87,
            Self::C97 => 0x97,
        }
    }
}

/// Physical memory configuration.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Physical memory size in bytes (word-aligned, at most 16 MiB).
    pub size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: 2 * 1024 * 1024,
        }
    }
}

/// Boot register values applied before the first loop iteration.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BootConfig {
    /// Initial PSD word 1 for the primary context.
    pub psd1: u32,
    /// Initial PSD word 2 for the primary context.
    pub psd2: u32,
    /// Boot device id placed in the scratchpad.
    pub boot_device: u32,
}

impl Default for BootConfig {
    fn default() -> Self {
        // Privileged, unmapped, unblocked, IP 0.
        Self {
            psd1: 0x8000_0000,
            psd2: 0,
            boot_device: 0,
        }
    }
}

/// Top-level machine configuration, immutable after start.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Processor model for both contexts.
    pub model: CpuModel,
    /// Physical memory parameters.
    pub memory: MemoryConfig,
    /// When set, a privileged `HALT` vectors through the trap table
    /// instead of stopping the context.
    pub halt_trap: bool,
    /// When set, the companion instruction-processing unit runs alongside
    /// the primary.
    pub ipu: bool,
    /// Per-instruction trace records through `tracing`.
    pub trace: bool,
    /// Boot register values.
    pub boot: BootConfig,
}

impl Config {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error on malformed input.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
