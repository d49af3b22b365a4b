//! Opcode handlers.
//!
//! One arm per opcode class. Conventions:
//! - Privilege is checked before any other side effect.
//! - A trap returned from an arm leaves the destination unwritten; partial
//!   state never escapes an instruction.
//! - Register-register forms take the destination from the R field and the
//!   source from the X field.
//! - Overflow raises an arithmetic exception when the PSD enables it and
//!   otherwise reports through CC1 with the wrapped result written.

use std::sync::Arc;

use crate::arch::psd::{CC_NEGATIVE, CC_OVERFLOW, CC_POSITIVE, CC_ZERO};
use crate::common::{PHYS_MASK, SignalCause, Trap, VirtAddr};
use crate::fpu::{self, FpOutcome};
use crate::io::{IoCommand, IoOp};
use crate::isa::{Decoded, OpClass};

use super::alu;
use super::Outcome;
use super::Context;

/// Reach of non-based, non-extended effective addresses.
const EA_MASK_SHORT: u32 = (1 << 19) - 1;

/// Call/return frame: saved PSD (2 words) plus the 8 general registers.
const FRAME_WORDS_PLAIN: u32 = 2 + 8;
/// Based-mode frame additionally saves the 8 base registers.
const FRAME_WORDS_BASED: u32 = FRAME_WORDS_PLAIN + 8;

impl Context {
    /// Effective address of a memory-format instruction.
    ///
    /// Non-based: 18-bit address field plus the X index register (X = 0
    /// means no indexing, not register zero), masked to 19 bits, or 24 in
    /// extended mode. Based: base register B plus the sign-extended 16-bit
    /// displacement, masked to 24 bits.
    fn effective_address(&self, d: &Decoded) -> VirtAddr {
        if self.based_active() {
            let base = self.regs.read_base(d.instr.x());
            let ea = base.wrapping_add(d.instr.imm16() as u32);
            return VirtAddr::new(ea & PHYS_MASK);
        }
        let mut ea = d.instr.addr18();
        if d.instr.x() != 0 {
            ea = ea.wrapping_add(self.regs.read(d.instr.x()));
        }
        let mask = if self.psd.extended() {
            PHYS_MASK
        } else {
            EA_MASK_SHORT
        };
        VirtAddr::new(ea & mask)
    }

    /// Writes a 32-bit result with overflow policy applied.
    ///
    /// With the arithmetic-exception trap enabled an overflow leaves the
    /// destination unchanged and traps; otherwise the wrapped result lands
    /// and CC1 reports the overflow.
    fn finish_arith(&mut self, r: usize, val: u32, overflow: bool) -> Result<(), Trap> {
        if overflow && self.psd.arithmetic_trap_enabled() {
            return Err(Trap::ArithmeticException);
        }
        self.regs.write(r, val);
        self.psd.set_cc(alu::cc_with_overflow(val, overflow));
        Ok(())
    }

    /// Writes a 64-bit pair result (no overflow path; multiply cannot
    /// overflow the pair).
    fn finish_pair(&mut self, r: usize, val: u64) {
        self.regs.write_pair(r, val);
        self.psd.set_cc(alu::cc_for64(val));
    }

    /// Division with the shared exception policy: on divide by zero or
    /// quotient overflow the pair is left unchanged.
    fn finish_div(&mut self, r: usize, dividend: u64, divisor: u32) -> Result<(), Trap> {
        match alu::div64(dividend, divisor) {
            Some((quotient, remainder)) => {
                self.regs
                    .write_pair(r, (u64::from(remainder) << 32) | u64::from(quotient));
                self.psd.set_cc(alu::cc_for(quotient));
                Ok(())
            }
            None if self.psd.arithmetic_trap_enabled() => Err(Trap::ArithmeticException),
            None => {
                self.psd.set_cc(CC_OVERFLOW);
                Ok(())
            }
        }
    }

    /// Applies a floating-point primitive's outcome to register `r`.
    fn finish_float(&mut self, r: usize, out: FpOutcome) -> Result<(), Trap> {
        if out.fault {
            if self.psd.arithmetic_trap_enabled() {
                return Err(Trap::ArithmeticException);
            }
            self.psd.set_cc(out.cc);
            return Ok(());
        }
        self.regs.write(r, out.bits);
        self.psd.set_cc(out.cc);
        Ok(())
    }

    /// Branch condition selected by the R field.
    ///
    /// 0 is unconditional; 1-4 test CC1-CC4; 5 tests nonzero, 6 tests
    /// zero-or-negative, 7 tests zero-or-positive.
    fn branch_condition(&self, r: usize) -> bool {
        let cc = self.psd.cc();
        match r {
            0 => true,
            1..=4 => cc & (0b1000 >> (r - 1)) != 0,
            5 => cc & CC_ZERO == 0,
            6 => cc & (CC_ZERO | CC_NEGATIVE) != 0,
            _ => cc & (CC_ZERO | CC_POSITIVE) != 0,
        }
    }

    /// Executes one classified instruction.
    #[allow(clippy::too_many_lines)]
    pub(super) fn execute(&mut self, d: &Decoded) -> Result<Outcome, Trap> {
        if d.attrs.privileged && !self.psd.privileged() {
            return Err(Trap::PrivilegeViolation(d.instr.0));
        }

        let r = d.instr.r();
        let x = d.instr.x();

        match d.class {
            OpClass::Halt => {
                if self.halt_trap {
                    return Err(Trap::PrivilegedHalt);
                }
                return Ok(Outcome::Halt);
            }
            OpClass::Wait => return Ok(Outcome::Wait),
            OpClass::Nop => {}
            OpClass::Sipu => {
                let _ = self.mailbox.signal(self.id.peer(), SignalCause::Sipu);
            }
            OpClass::Bei => self.psd.set_blocked(true),
            OpClass::Uei => self.psd.set_blocked(false),

            OpClass::Trr => {
                let v = self.regs.read(x);
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Trn => {
                let v = self.regs.read(x);
                let (neg, overflow) = alu::sub32(0, v);
                self.finish_arith(r, neg, overflow)?;
            }
            OpClass::Trc => {
                let v = !self.regs.read(x);
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Xcr => {
                let a = self.regs.read(r);
                let b = self.regs.read(x);
                self.regs.write(r, b);
                self.regs.write(x, a);
                self.psd.set_cc(alu::cc_for(b));
            }
            OpClass::Adr => {
                let (v, o) = alu::add32(self.regs.read(r), self.regs.read(x));
                self.finish_arith(r, v, o)?;
            }
            OpClass::Sur => {
                let (v, o) = alu::sub32(self.regs.read(r), self.regs.read(x));
                self.finish_arith(r, v, o)?;
            }
            OpClass::Mpr => {
                let v = alu::mul32(self.regs.read(r | 1), self.regs.read(x));
                self.finish_pair(r, v);
            }
            OpClass::Dvr => {
                let dividend = self.regs.read_pair(r);
                let divisor = self.regs.read(x);
                self.finish_div(r, dividend, divisor)?;
            }
            OpClass::Anr => {
                let v = self.regs.read(r) & self.regs.read(x);
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Orr => {
                let v = self.regs.read(r) | self.regs.read(x);
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Eor => {
                let v = self.regs.read(r) ^ self.regs.read(x);
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Car => {
                let cc = alu::cc_compare(self.regs.read(r), self.regs.read(x));
                self.psd.set_cc(cc);
            }

            OpClass::Sla => {
                let (v, o) = alu::shift_left_arith(self.regs.read(r), d.instr.shift_count());
                self.finish_arith(r, v, o)?;
            }
            OpClass::Sra => {
                let v = alu::shift_right_arith(self.regs.read(r), d.instr.shift_count());
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Sll => {
                let v = alu::shift_left_logical(self.regs.read(r), d.instr.shift_count());
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Srl => {
                let v = alu::shift_right_logical(self.regs.read(r), d.instr.shift_count());
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Slad => {
                let (v, o) = alu::shift_left_arith64(self.regs.read_pair(r), d.instr.shift_count());
                if o && self.psd.arithmetic_trap_enabled() {
                    return Err(Trap::ArithmeticException);
                }
                self.regs.write_pair(r, v);
                let cc = alu::cc_for64(v);
                self.psd.set_cc(if o { cc | CC_OVERFLOW } else { cc });
            }
            OpClass::Srad => {
                let v = alu::shift_right_arith64(self.regs.read_pair(r), d.instr.shift_count());
                self.finish_pair(r, v);
            }
            OpClass::Slld => {
                let v = alu::shift_left_logical64(self.regs.read_pair(r), d.instr.shift_count());
                self.finish_pair(r, v);
            }
            OpClass::Srld => {
                let v = alu::shift_right_logical64(self.regs.read_pair(r), d.instr.shift_count());
                self.finish_pair(r, v);
            }

            OpClass::Li => {
                let v = d.instr.imm16() as u32;
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Adi => {
                let (v, o) = alu::add32(self.regs.read(r), d.instr.imm16() as u32);
                self.finish_arith(r, v, o)?;
            }
            OpClass::Sui => {
                let (v, o) = alu::sub32(self.regs.read(r), d.instr.imm16() as u32);
                self.finish_arith(r, v, o)?;
            }
            OpClass::Mpi => {
                let v = alu::mul32(self.regs.read(r | 1), d.instr.imm16() as u32);
                self.finish_pair(r, v);
            }
            OpClass::Dvi => {
                let dividend = self.regs.read_pair(r);
                self.finish_div(r, dividend, d.instr.imm16() as u32)?;
            }
            OpClass::Ci => {
                let cc = alu::cc_compare(self.regs.read(r), d.instr.imm16() as u32);
                self.psd.set_cc(cc);
            }
            OpClass::Svc => return Err(Trap::SupervisorCall(d.instr.uimm16())),

            OpClass::Lw => {
                let v = self.read_word(self.effective_address(d))?;
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Lh => {
                let v = self.read_half(self.effective_address(d))? as u16 as i16 as i32 as u32;
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Lb => {
                let v = self.read_byte(self.effective_address(d))?;
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Ld => {
                let v = self.read_double(self.effective_address(d))?;
                self.finish_pair(r, v);
            }
            OpClass::La => {
                self.regs.write(r, self.effective_address(d).val());
            }
            OpClass::Stw => {
                self.write_word(self.effective_address(d), self.regs.read(r))?;
            }
            OpClass::Sth => {
                self.write_half(self.effective_address(d), self.regs.read(r) as u16)?;
            }
            OpClass::Stb => {
                self.write_byte(self.effective_address(d), self.regs.read(r) as u8)?;
            }
            OpClass::Std => {
                self.write_double(self.effective_address(d), self.regs.read_pair(r))?;
            }
            OpClass::Zm => {
                self.write_word(self.effective_address(d), 0)?;
            }

            OpClass::Ad => {
                let m = self.read_word(self.effective_address(d))?;
                let (v, o) = alu::add32(self.regs.read(r), m);
                self.finish_arith(r, v, o)?;
            }
            OpClass::Su => {
                let m = self.read_word(self.effective_address(d))?;
                let (v, o) = alu::sub32(self.regs.read(r), m);
                self.finish_arith(r, v, o)?;
            }
            OpClass::Mp => {
                let m = self.read_word(self.effective_address(d))?;
                let v = alu::mul32(self.regs.read(r | 1), m);
                self.finish_pair(r, v);
            }
            OpClass::Dv => {
                let m = self.read_word(self.effective_address(d))?;
                let dividend = self.regs.read_pair(r);
                self.finish_div(r, dividend, m)?;
            }
            OpClass::Ca => {
                let m = self.read_word(self.effective_address(d))?;
                let cc = alu::cc_compare(self.regs.read(r), m);
                self.psd.set_cc(cc);
            }
            OpClass::Anm => {
                let m = self.read_word(self.effective_address(d))?;
                let v = self.regs.read(r) & m;
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Orm => {
                let m = self.read_word(self.effective_address(d))?;
                let v = self.regs.read(r) | m;
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Eom => {
                let m = self.read_word(self.effective_address(d))?;
                let v = self.regs.read(r) ^ m;
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }

            OpClass::Sbm | OpClass::Zbm | OpClass::Tbm | OpClass::Cbm => {
                return self.bit_memory(d);
            }

            OpClass::Bct => {
                if self.branch_condition(r) {
                    self.psd.set_ip(self.effective_address(d).val());
                    return Ok(Outcome::Jump);
                }
            }
            OpClass::Bcf => {
                if !self.branch_condition(r) {
                    self.psd.set_ip(self.effective_address(d).val());
                    return Ok(Outcome::Jump);
                }
            }
            OpClass::Bl => {
                let link = self.psd.ip().wrapping_add(self.last_len);
                self.regs.write(r, link);
                self.psd.set_ip(self.effective_address(d).val());
                return Ok(Outcome::Jump);
            }
            OpClass::Bib => {
                let v = self.regs.read(r).wrapping_add(1);
                self.regs.write(r, v);
                if v != 0 {
                    self.psd.set_ip(self.effective_address(d).val());
                    return Ok(Outcome::Jump);
                }
            }

            OpClass::Call => return self.call(d),
            OpClass::Return => return self.ret(),

            OpClass::Fad => {
                let m = self.read_word(self.effective_address(d))?;
                self.finish_float(r, fpu::fad(self.regs.read(r), m))?;
            }
            OpClass::Fsu => {
                let m = self.read_word(self.effective_address(d))?;
                self.finish_float(r, fpu::fsu(self.regs.read(r), m))?;
            }
            OpClass::Fmu => {
                let m = self.read_word(self.effective_address(d))?;
                self.finish_float(r, fpu::fmu(self.regs.read(r), m))?;
            }
            OpClass::Fdv => {
                let m = self.read_word(self.effective_address(d))?;
                self.finish_float(r, fpu::fdv(self.regs.read(r), m))?;
            }
            OpClass::Fix => {
                let out = fpu::fix(self.regs.read(x));
                self.finish_float(r, out)?;
            }
            OpClass::Flt => {
                let out = fpu::flt(self.regs.read(x));
                self.finish_float(r, out)?;
            }

            OpClass::Lpsd | OpClass::Lpsdcm => return self.load_psd(d),
            OpClass::Lmap => {
                let cpix = self.regs.read(r) & 0x7FF;
                let loaded =
                    self.mmu
                        .load_maps(cpix, &self.scratchpad, &self.mem)?;
                self.regs.write(r, loaded);
            }
            OpClass::Setcpu => {
                // Model control word; accepted and stored, nothing in the
                // engine reacts to it.
                let v = self.regs.read(r);
                self.scratchpad.write(6, v);
            }
            OpClass::Rdsts => {
                self.regs.write(r, self.scratchpad.identity());
            }
            OpClass::Wscr => {
                let v = self.regs.read(r);
                self.scratchpad.write(x, v);
            }
            OpClass::Rscr => {
                self.regs.write(r, self.scratchpad.read(x));
            }

            OpClass::Sio => return self.channel_io(d, IoCommand::Start),
            OpClass::Tio => return self.channel_io(d, IoCommand::Test),
            OpClass::Hio => return self.channel_io(d, IoCommand::Halt),

            OpClass::Lbr => {
                let v = self.read_word(self.effective_address(d))?;
                self.regs.write_base(r, v);
            }
            OpClass::Stbr => {
                self.write_word(self.effective_address(d), self.regs.read_base(r))?;
            }
            OpClass::Tbrr => {
                let v = self.regs.read_base(x);
                self.regs.write(r, v);
                self.psd.set_cc(alu::cc_for(v));
            }
            OpClass::Trbr => {
                self.regs.write_base(r, self.regs.read(x));
            }

            OpClass::Undefined => return Err(Trap::UndefinedInstruction(d.instr.0)),
        }

        Ok(Outcome::Next)
    }

    /// Interlocked bit-memory operations.
    ///
    /// The bit number counts from the most significant bit of the word at
    /// the effective address. The read-modify-write holds the memory
    /// interlock, so two contexts racing on the same word serialize. The
    /// condition codes report the bit's prior value: CC2 set, CC4 clear.
    fn bit_memory(&mut self, d: &Decoded) -> Result<Outcome, Trap> {
        let va = self.effective_address(d);
        let mask = 0x8000_0000_u32 >> d.instr.bit_number();

        let mem = Arc::clone(&self.mem);
        let _interlock = mem.bit_interlock();

        let word = self.read_word(va)?;
        let was_set = word & mask != 0;
        match d.class {
            OpClass::Sbm => self.write_word(va, word | mask)?,
            OpClass::Zbm => self.write_word(va, word & !mask)?,
            OpClass::Cbm => self.write_word(va, word ^ mask)?,
            _ => {} // TBM only tests.
        }
        self.psd
            .set_cc(if was_set { CC_POSITIVE } else { CC_ZERO });
        Ok(Outcome::Next)
    }

    /// `CALL`: push a frame below the R7 stack pointer and branch.
    ///
    /// Frame layout, low address first: saved PSD word 1 (return address
    /// in the IP field), saved PSD word 2, R0-R7, and in based mode B0-B7.
    /// The frame address must be doubleword aligned; R7 is only updated
    /// after every frame word is written.
    fn call(&mut self, d: &Decoded) -> Result<Outcome, Trap> {
        let words = if self.based_active() {
            FRAME_WORDS_BASED
        } else {
            FRAME_WORDS_PLAIN
        };
        let sp = self.regs.read(7).wrapping_sub(words * 4) & PHYS_MASK;
        if sp & 7 != 0 {
            return Err(Trap::AddressSpecification(sp));
        }

        let mut saved = self.psd;
        saved.set_ip(self.psd.ip().wrapping_add(self.last_len));

        self.write_word(VirtAddr::new(sp), saved.w1)?;
        self.write_word(VirtAddr::new(sp + 4), saved.w2)?;
        let regs = self.regs.snapshot();
        for (i, val) in regs.iter().enumerate() {
            self.write_word(VirtAddr::new(sp + 8 + 4 * i as u32), *val)?;
        }
        if self.based_active() {
            let bases = self.regs.base_snapshot();
            for (i, val) in bases.iter().enumerate() {
                self.write_word(VirtAddr::new(sp + 40 + 4 * i as u32), *val)?;
            }
        }

        self.regs.write(7, sp);
        self.psd.set_ip(self.effective_address(d).val());
        Ok(Outcome::Jump)
    }

    /// `RETURN`: unwind the frame R7 points at.
    ///
    /// Restores registers and the saved PSD, except that the privileged
    /// bit keeps its current value so a frame forged by unprivileged code
    /// cannot escalate. The address field is ignored.
    fn ret(&mut self) -> Result<Outcome, Trap> {
        let sp = self.regs.read(7) & PHYS_MASK;
        if sp & 7 != 0 {
            return Err(Trap::AddressSpecification(sp));
        }

        let w1 = self.read_word(VirtAddr::new(sp))?;
        let w2 = self.read_word(VirtAddr::new(sp + 4))?;
        let mut restored = crate::arch::Psd::new(w1, w2);
        restored.set_privileged(self.psd.privileged());

        let mut regs = [0u32; 8];
        for (i, slot) in regs.iter_mut().enumerate() {
            *slot = self.read_word(VirtAddr::new(sp + 8 + 4 * i as u32))?;
        }
        if self.based_active() {
            let mut bases = [0u32; 8];
            for (i, slot) in bases.iter_mut().enumerate() {
                *slot = self.read_word(VirtAddr::new(sp + 40 + 4 * i as u32))?;
            }
            for (i, val) in bases.iter().enumerate() {
                self.regs.write_base(i, *val);
            }
        }

        // The saved R7 is the pre-push value, so restoring it pops the
        // frame.
        for (i, val) in regs.iter().enumerate() {
            self.regs.write(i, *val);
        }
        self.psd = restored;
        Ok(Outcome::Jump)
    }

    /// `LPSD`/`LPSDCM`: load a new PSD from the doubleword at the
    /// effective address.
    ///
    /// `LPSD` never touches the translation caches; `LPSDCM` additionally
    /// performs the context change, invalidating them unless the incoming
    /// PSD sets retain-mapping.
    fn load_psd(&mut self, d: &Decoded) -> Result<Outcome, Trap> {
        let va = self.effective_address(d);
        let pair = self.read_double(va)?;
        let new = crate::arch::Psd::new((pair >> 32) as u32, pair as u32);
        if d.class == OpClass::Lpsdcm && !new.retain_maps() {
            self.mmu.invalidate_all();
        }
        self.psd = new;
        self.scratchpad
            .write(crate::arch::scratchpad::SP_CACHED_PSD2, new.w2);
        Ok(Outcome::Jump)
    }

    /// `SIO`/`TIO`/`HIO`: one opaque channel call; the completion code
    /// becomes the condition codes.
    fn channel_io(&mut self, d: &Decoded, command: IoCommand) -> Result<Outcome, Trap> {
        let device = (self.effective_address(d).val() & 0xFFFF) as u16;
        let status = self.io.start_io(IoOp { command, device });
        self.psd.set_cc(status.cc());
        self.counters.io_calls += 1;
        Ok(Outcome::Next)
    }
}
