//! Instruction set: raw word layout and the decoder.

/// Decoder tables and classification.
pub mod decode;

/// Raw instruction word and field extractors.
pub mod instruction;

pub use decode::{Attrs, Decoded, OpClass, decode};
pub use instruction::Instr;
