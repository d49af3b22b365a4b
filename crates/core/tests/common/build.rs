//! Raw instruction word builders.
//!
//! Mirrors the instruction formats: opcode byte in bits 0-7, R in 8-10,
//! X/B in 11-13, then an 18-bit address, 16-bit immediate, or 6-bit shift
//! count. Halfword instructions are returned left-normalized; `pack`
//! combines two of them into one word.

// Opcode bytes used by the tests.
pub const OP_HALT: u8 = 0x00;
pub const OP_WAIT: u8 = 0x01;
pub const OP_NOP: u8 = 0x02;
pub const OP_SIPU: u8 = 0x03;
pub const OP_BEI: u8 = 0x04;
pub const OP_UEI: u8 = 0x05;
pub const OP_TRR: u8 = 0x10;
pub const OP_ADR: u8 = 0x18;
pub const OP_DVR: u8 = 0x1B;
pub const OP_SLA: u8 = 0x28;
pub const OP_LI: u8 = 0x30;
pub const OP_ADI: u8 = 0x31;
pub const OP_DVI: u8 = 0x34;
pub const OP_CI: u8 = 0x35;
pub const OP_SVC: u8 = 0x37;
pub const OP_LW: u8 = 0x40;
pub const OP_LH: u8 = 0x41;
pub const OP_LB: u8 = 0x42;
pub const OP_LA: u8 = 0x44;
pub const OP_STW: u8 = 0x48;
pub const OP_STB: u8 = 0x4A;
pub const OP_ZM: u8 = 0x4C;
pub const OP_AD: u8 = 0x50;
pub const OP_SBM: u8 = 0x60;
pub const OP_ZBM: u8 = 0x61;
pub const OP_TBM: u8 = 0x62;
pub const OP_BCT: u8 = 0x68;
pub const OP_BCF: u8 = 0x69;
pub const OP_BL: u8 = 0x6A;
pub const OP_CALL: u8 = 0x70;
pub const OP_RETURN: u8 = 0x71;
pub const OP_LPSDCM: u8 = 0x81;
pub const OP_WSCR: u8 = 0x85;
pub const OP_RSCR: u8 = 0x86;
pub const OP_SIO: u8 = 0x90;
pub const OP_TRBR: u8 = 0xB3;

/// Memory-format instruction: op, R, X, 18-bit address.
pub fn mem_op(op: u8, r: u32, x: u32, addr: u32) -> u32 {
    (u32::from(op) << 24) | ((r & 7) << 21) | ((x & 7) << 18) | (addr & 0x3_FFFF)
}

/// Immediate-format instruction: op, R, signed 16-bit immediate.
pub fn imm_op(op: u8, r: u32, imm: i16) -> u32 {
    (u32::from(op) << 24) | ((r & 7) << 21) | u32::from(imm as u16)
}

/// Register-register format: op, R (destination), X (source).
pub fn reg_op(op: u8, r: u32, x: u32) -> u32 {
    mem_op(op, r, x, 0)
}

/// Shift format: op, R, 6-bit count.
pub fn shift_op(op: u8, r: u32, count: u32) -> u32 {
    (u32::from(op) << 24) | ((r & 7) << 21) | (count & 0x3F)
}

/// Bit-memory format: op, 5-bit bit number, 18-bit address.
pub fn bit_op(op: u8, bit: u32, addr: u32) -> u32 {
    (u32::from(op) << 24) | ((bit & 0x1F) << 19) | (addr & 0x3_FFFF)
}

/// Halfword instruction, left-normalized.
pub fn half_op(op: u8) -> u32 {
    u32::from(op) << 24
}

/// Packs two halfword instructions into one word (left executes first).
pub fn pack(left: u32, right: u32) -> u32 {
    (left & 0xFFFF_0000) | (right >> 16)
}
