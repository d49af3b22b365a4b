//! Instruction decoder.
//!
//! Pure classification: the opcode byte indexes one of two parallel
//! 256-entry tables selected by the based-mode bit, yielding an opcode
//! class and an addressing-mode descriptor. Reserved encodings classify as
//! [`OpClass::Undefined`]; no side effects, no state.

use super::instruction::Instr;

/// Opcode class: one execution handler per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)] // Mnemonics are the documentation.
pub enum OpClass {
    // Control (halfword format).
    Halt,
    Wait,
    Nop,
    Sipu,
    Bei,
    Uei,
    // Register-register.
    Trr,
    Trn,
    Trc,
    Xcr,
    Adr,
    Sur,
    Mpr,
    Dvr,
    Anr,
    Orr,
    Eor,
    Car,
    // Shifts.
    Sla,
    Sra,
    Sll,
    Srl,
    Slad,
    Srad,
    Slld,
    Srld,
    // Immediate.
    Li,
    Adi,
    Sui,
    Mpi,
    Dvi,
    Ci,
    Svc,
    // Loads and stores.
    Lw,
    Lh,
    Lb,
    Ld,
    La,
    Stw,
    Sth,
    Stb,
    Std,
    Zm,
    // Memory arithmetic and logic.
    Ad,
    Su,
    Mp,
    Dv,
    Ca,
    Anm,
    Orm,
    Eom,
    // Interlocked bit-memory.
    Sbm,
    Zbm,
    Tbm,
    Cbm,
    // Branches.
    Bct,
    Bcf,
    Bl,
    Bib,
    // Call frames.
    Call,
    Return,
    // Floating point (opaque primitives).
    Fad,
    Fsu,
    Fmu,
    Fdv,
    Fix,
    Flt,
    // Privileged system.
    Lpsd,
    Lpsdcm,
    Lmap,
    Setcpu,
    Rdsts,
    Wscr,
    Rscr,
    // Channel I/O.
    Sio,
    Tio,
    Hio,
    // Based-mode only.
    Lbr,
    Stbr,
    Tbrr,
    Trbr,
    /// Reserved encoding.
    Undefined,
}

/// Addressing-mode descriptor produced by classification.
///
/// The execution core consults the privilege and length flags; the operand
/// shape flags describe each encoding for traces and tooling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attrs {
    /// 16-bit instruction, packed two per word.
    pub halfword: bool,
    /// Reads a general register operand.
    pub reads_reg: bool,
    /// Reads a memory operand.
    pub reads_mem: bool,
    /// Memory read is sign-extended (halfword loads).
    pub sign_extend: bool,
    /// Writes a memory operand.
    pub writes_mem: bool,
    /// Operates on a 64-bit even/odd register pair or doubleword operand.
    pub doubleword: bool,
    /// Sets the condition codes.
    pub sets_cc: bool,
    /// Destination is a base register.
    pub stores_base: bool,
    /// Controls the instruction pointer itself; the loop must not apply
    /// the normal advance.
    pub branch: bool,
    /// Privilege checked before any other side effect.
    pub privileged: bool,
}

impl Attrs {
    const fn new() -> Self {
        Self {
            halfword: false,
            reads_reg: false,
            reads_mem: false,
            sign_extend: false,
            writes_mem: false,
            doubleword: false,
            sets_cc: false,
            stores_base: false,
            branch: false,
            privileged: false,
        }
    }

    const fn half(mut self) -> Self {
        self.halfword = true;
        self
    }

    const fn reg(mut self) -> Self {
        self.reads_reg = true;
        self
    }

    const fn mem_read(mut self) -> Self {
        self.reads_mem = true;
        self
    }

    const fn sext(mut self) -> Self {
        self.sign_extend = true;
        self
    }

    const fn mem_write(mut self) -> Self {
        self.writes_mem = true;
        self
    }

    const fn double(mut self) -> Self {
        self.doubleword = true;
        self
    }

    const fn cc(mut self) -> Self {
        self.sets_cc = true;
        self
    }

    const fn base_dest(mut self) -> Self {
        self.stores_base = true;
        self
    }

    const fn branching(mut self) -> Self {
        self.branch = true;
        self
    }

    const fn priv_op(mut self) -> Self {
        self.privileged = true;
        self
    }
}

/// One classification-table slot.
#[derive(Clone, Copy, Debug)]
pub struct OpSpec {
    /// Opcode class.
    pub class: OpClass,
    /// Addressing-mode descriptor.
    pub attrs: Attrs,
}

const RESERVED: OpSpec = OpSpec {
    class: OpClass::Undefined,
    attrs: Attrs::new(),
};

const fn spec(class: OpClass, attrs: Attrs) -> OpSpec {
    OpSpec { class, attrs }
}

/// Shorthand for a fresh descriptor in the table builders.
const fn a() -> Attrs {
    Attrs::new()
}

/// Fills the slots shared by both addressing modes.
const fn fill_common(mut t: [OpSpec; 256]) -> [OpSpec; 256] {
    use OpClass as O;

    t[0x00] = spec(O::Halt, a().half().priv_op());
    t[0x01] = spec(O::Wait, a().half().priv_op());
    t[0x02] = spec(O::Nop, a().half());
    t[0x03] = spec(O::Sipu, a().half().priv_op());
    t[0x04] = spec(O::Bei, a().half().priv_op());
    t[0x05] = spec(O::Uei, a().half().priv_op());

    t[0x10] = spec(O::Trr, a().reg().cc());
    t[0x11] = spec(O::Trn, a().reg().cc());
    t[0x12] = spec(O::Trc, a().reg().cc());
    t[0x13] = spec(O::Xcr, a().reg().cc());
    t[0x18] = spec(O::Adr, a().reg().cc());
    t[0x19] = spec(O::Sur, a().reg().cc());
    t[0x1A] = spec(O::Mpr, a().reg().double().cc());
    t[0x1B] = spec(O::Dvr, a().reg().double().cc());
    t[0x20] = spec(O::Anr, a().reg().cc());
    t[0x21] = spec(O::Orr, a().reg().cc());
    t[0x22] = spec(O::Eor, a().reg().cc());
    t[0x23] = spec(O::Car, a().reg().cc());

    t[0x28] = spec(O::Sla, a().reg().cc());
    t[0x29] = spec(O::Sra, a().reg().cc());
    t[0x2A] = spec(O::Sll, a().reg().cc());
    t[0x2B] = spec(O::Srl, a().reg().cc());
    t[0x2C] = spec(O::Slad, a().reg().double().cc());
    t[0x2D] = spec(O::Srad, a().reg().double().cc());
    t[0x2E] = spec(O::Slld, a().reg().double().cc());
    t[0x2F] = spec(O::Srld, a().reg().double().cc());

    t[0x30] = spec(O::Li, a().cc());
    t[0x31] = spec(O::Adi, a().reg().cc());
    t[0x32] = spec(O::Sui, a().reg().cc());
    t[0x33] = spec(O::Mpi, a().reg().double().cc());
    t[0x34] = spec(O::Dvi, a().reg().double().cc());
    t[0x35] = spec(O::Ci, a().reg().cc());
    t[0x37] = spec(O::Svc, a().branching());

    t[0x40] = spec(O::Lw, a().mem_read().cc());
    t[0x41] = spec(O::Lh, a().mem_read().sext().cc());
    t[0x42] = spec(O::Lb, a().mem_read().cc());
    t[0x43] = spec(O::Ld, a().mem_read().double().cc());
    t[0x44] = spec(O::La, a());
    t[0x48] = spec(O::Stw, a().reg().mem_write());
    t[0x49] = spec(O::Sth, a().reg().mem_write());
    t[0x4A] = spec(O::Stb, a().reg().mem_write());
    t[0x4B] = spec(O::Std, a().reg().mem_write().double());
    t[0x4C] = spec(O::Zm, a().mem_write());

    t[0x50] = spec(O::Ad, a().reg().mem_read().cc());
    t[0x51] = spec(O::Su, a().reg().mem_read().cc());
    t[0x52] = spec(O::Mp, a().reg().mem_read().double().cc());
    t[0x53] = spec(O::Dv, a().reg().mem_read().double().cc());
    t[0x54] = spec(O::Ca, a().reg().mem_read().cc());
    t[0x55] = spec(O::Anm, a().reg().mem_read().cc());
    t[0x56] = spec(O::Orm, a().reg().mem_read().cc());
    t[0x57] = spec(O::Eom, a().reg().mem_read().cc());

    t[0x60] = spec(O::Sbm, a().mem_read().mem_write().cc());
    t[0x61] = spec(O::Zbm, a().mem_read().mem_write().cc());
    t[0x62] = spec(O::Tbm, a().mem_read().cc());
    t[0x63] = spec(O::Cbm, a().mem_read().mem_write().cc());

    t[0x68] = spec(O::Bct, a().branching());
    t[0x69] = spec(O::Bcf, a().branching());
    t[0x6A] = spec(O::Bl, a().branching());
    t[0x6B] = spec(O::Bib, a().reg().branching());

    t[0x70] = spec(O::Call, a().mem_write().branching());
    t[0x71] = spec(O::Return, a().mem_read().branching());

    t[0x78] = spec(O::Fad, a().reg().mem_read().cc());
    t[0x79] = spec(O::Fsu, a().reg().mem_read().cc());
    t[0x7A] = spec(O::Fmu, a().reg().mem_read().cc());
    t[0x7B] = spec(O::Fdv, a().reg().mem_read().cc());
    t[0x7C] = spec(O::Fix, a().reg().cc());
    t[0x7D] = spec(O::Flt, a().reg().cc());

    t[0x80] = spec(O::Lpsd, a().mem_read().branching().priv_op());
    t[0x81] = spec(O::Lpsdcm, a().mem_read().branching().priv_op());
    t[0x82] = spec(O::Lmap, a().priv_op());
    t[0x83] = spec(O::Setcpu, a().priv_op());
    t[0x84] = spec(O::Rdsts, a().priv_op());
    t[0x85] = spec(O::Wscr, a().reg().priv_op());
    t[0x86] = spec(O::Rscr, a().priv_op());

    t[0x90] = spec(O::Sio, a().priv_op().cc());
    t[0x91] = spec(O::Tio, a().priv_op().cc());
    t[0x92] = spec(O::Hio, a().priv_op().cc());

    t
}

const fn build_nonbased() -> [OpSpec; 256] {
    fill_common([RESERVED; 256])
}

const fn build_based() -> [OpSpec; 256] {
    use OpClass as O;
    let mut t = fill_common([RESERVED; 256]);

    // Base-register traffic exists only in based mode; the slots stay
    // reserved in the non-based table.
    t[0xB0] = spec(O::Lbr, a().mem_read().base_dest());
    t[0xB1] = spec(O::Stbr, a().mem_write());
    t[0xB2] = spec(O::Tbrr, a().cc());
    t[0xB3] = spec(O::Trbr, a().reg().base_dest());

    t
}

/// Classification table for non-based contexts.
static NONBASED: [OpSpec; 256] = build_nonbased();

/// Classification table for based contexts.
static BASED: [OpSpec; 256] = build_based();

/// A classified instruction: raw word, opcode class, addressing
/// descriptor.
#[derive(Clone, Copy, Debug)]
pub struct Decoded {
    /// The raw (left-normalized) instruction.
    pub instr: Instr,
    /// Opcode class.
    pub class: OpClass,
    /// Addressing-mode descriptor.
    pub attrs: Attrs,
}

/// Classifies `raw` under the given based-mode bit.
///
/// Pure function of its inputs; reserved encodings yield
/// [`OpClass::Undefined`].
#[inline]
pub fn decode(raw: u32, based: bool) -> Decoded {
    let instr = Instr(raw);
    let table: &[OpSpec; 256] = if based { &BASED } else { &NONBASED };
    let s = table[instr.op() as usize];
    Decoded {
        instr,
        class: s.class,
        attrs: s.attrs,
    }
}
