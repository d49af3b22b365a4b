//! # Execution Core Tests
//!
//! Small programs run to completion on one context (and, for the
//! signaling tests, on both).

use std::thread;
use std::time::Duration;

use c32_core::arch::psd::{CC_NEGATIVE, CC_OVERFLOW, CC_POSITIVE, CC_ZERO};
use c32_core::common::{RealAddr, SignalCause, StopReason, Trap};
use c32_core::config::{BootConfig, Config, CpuModel};
use c32_core::coord::ContextId;
use c32_core::exec::RunState;
use c32_core::sim::System;
use pretty_assertions::assert_eq;

use crate::common::build::*;
use crate::common::harness::TestContext;

#[test]
fn test_li_adi_halt() {
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[
            imm_op(OP_LI, 1, 5),
            imm_op(OP_ADI, 1, 7),
            pack(half_op(OP_HALT), 0),
        ],
    );
    assert_eq!(ctx.run(10), StopReason::Halted);
    assert_eq!(ctx.cpu.state(), RunState::Halted);
    assert_eq!(ctx.cpu.regs.read(1), 12);
    assert_eq!(ctx.cpu.psd.cc(), CC_POSITIVE);
    assert_eq!(ctx.cpu.counters.instructions, 3);
}

#[test]
fn test_add_overflow_sets_cc1_when_trap_disabled() {
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[
            mem_op(OP_LW, 1, 0, 0x2000),
            mem_op(OP_AD, 1, 0, 0x2004),
            pack(half_op(OP_HALT), 0),
        ],
    );
    ctx.poke(0x2000, 0x7FFF_FFFF);
    ctx.poke(0x2004, 1);
    assert_eq!(ctx.run(10), StopReason::Halted);
    assert_eq!(ctx.cpu.regs.read(1), 0x8000_0000);
    assert_eq!(ctx.cpu.psd.cc(), CC_OVERFLOW | CC_NEGATIVE);
}

#[test]
fn test_divide_by_zero_with_trap_enabled_leaves_registers() {
    let mut ctx = TestContext::new().load_program(0x1000, &[imm_op(OP_DVI, 0, 0)]);
    let handler = 0x8000_0000 | 0x4000;
    ctx.set_trap_vector(8, handler, 0);
    // Arithmetic-exception enable is PSD word 1 bit 7.
    ctx.cpu.psd.w1 |= 0x0100_0000;
    ctx.cpu.regs.write(0, 0);
    ctx.cpu.regs.write(1, 42);

    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), 0x4000);
    assert_eq!(ctx.cpu.regs.read(0), 0);
    assert_eq!(ctx.cpu.regs.read(1), 42);
}

#[test]
fn test_divide_by_zero_without_trap_sets_cc1_only() {
    let mut ctx = TestContext::new()
        .load_program(0x1000, &[imm_op(OP_DVI, 0, 0), pack(half_op(OP_HALT), 0)]);
    ctx.cpu.regs.write(1, 42);
    assert_eq!(ctx.run(5), StopReason::Halted);
    assert_eq!(ctx.cpu.regs.read(1), 42);
    assert_eq!(ctx.cpu.psd.cc(), CC_OVERFLOW);
}

#[test]
fn test_unconditional_branch() {
    let mut ctx = TestContext::new().load_program(0x1000, &[mem_op(OP_BCT, 0, 0, 0x1010)]);
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), 0x1010);
}

#[test]
fn test_conditional_branch_on_cc4() {
    // CI r1 == 0 sets CC4; BCT with condition 4 then takes the branch.
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[imm_op(OP_CI, 1, 0), mem_op(OP_BCT, 4, 0, 0x1100)],
    );
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.cc(), CC_ZERO);
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), 0x1100);

    // With a nonzero register the same branch falls through.
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[imm_op(OP_CI, 1, 0), mem_op(OP_BCT, 4, 0, 0x1100)],
    );
    ctx.cpu.regs.write(1, 9);
    ctx.step_ok();
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), 0x1008);
}

#[test]
fn test_branch_and_link() {
    let mut ctx = TestContext::new().load_program(0x1000, &[mem_op(OP_BL, 1, 0, 0x1200)]);
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), 0x1200);
    assert_eq!(ctx.cpu.regs.read(1), 0x1004);
}

#[test]
fn test_interlocked_bit_ops() {
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[
            bit_op(OP_SBM, 0, 0x2000),
            bit_op(OP_TBM, 0, 0x2000),
            bit_op(OP_ZBM, 0, 0x2000),
            pack(half_op(OP_HALT), 0),
        ],
    );
    ctx.step_ok();
    assert_eq!(ctx.peek(0x2000), 0x8000_0000);
    // SBM reported the prior value: clear.
    assert_eq!(ctx.cpu.psd.cc(), CC_ZERO);
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.cc(), CC_POSITIVE);
    ctx.step_ok();
    assert_eq!(ctx.peek(0x2000), 0);
    assert_eq!(ctx.run(1), StopReason::Halted);
}

#[test]
fn test_call_and_return() {
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[mem_op(OP_CALL, 0, 0, 0x1100)],
    );
    ctx.poke(0x1100, mem_op(OP_RETURN, 0, 0, 0));
    ctx.cpu.regs.write(7, 0x3000);
    ctx.cpu.regs.write(3, 77);

    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), 0x1100);
    // Non-based frame: 2 PSD words + 8 registers.
    let sp = 0x3000 - 40;
    assert_eq!(ctx.cpu.regs.read(7), sp);
    assert_eq!(ctx.peek(sp) & 0x00FF_FFFF, 0x1004);

    ctx.cpu.regs.write(3, 0);
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), 0x1004);
    assert_eq!(ctx.cpu.regs.read(7), 0x3000);
    assert_eq!(ctx.cpu.regs.read(3), 77);
}

#[test]
fn test_call_with_misaligned_stack_traps() {
    let mut ctx = TestContext::new().load_program(0x1000, &[mem_op(OP_CALL, 0, 0, 0x1100)]);
    // The frame would start at 0x2FDC, which is not doubleword aligned.
    ctx.cpu.regs.write(7, 0x3004);
    assert!(matches!(
        ctx.run(1),
        StopReason::UnvectoredTrap(Trap::AddressSpecification(0x2FDC))
    ));
    // Nothing was pushed and the stack pointer is untouched.
    assert_eq!(ctx.cpu.regs.read(7), 0x3004);
    assert_eq!(ctx.peek(0x2FDC), 0);
}

#[test]
fn test_return_with_misaligned_stack_traps() {
    let mut ctx = TestContext::new().load_program(0x1000, &[mem_op(OP_RETURN, 0, 0, 0)]);
    ctx.cpu.regs.write(7, 0x2FDC);
    assert!(matches!(
        ctx.run(1),
        StopReason::UnvectoredTrap(Trap::AddressSpecification(0x2FDC))
    ));
}

#[test]
fn test_extended_bit_widens_indexed_reach() {
    // Non-extended effective addresses wrap at 19 bits even when the
    // index register reaches further.
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[mem_op(OP_LA, 1, 2, 0x100), pack(half_op(OP_HALT), 0)],
    );
    ctx.cpu.regs.write(2, 0x00F0_0000);
    assert_eq!(ctx.run(3), StopReason::Halted);
    assert_eq!(ctx.cpu.regs.read(1), 0x100);

    // Extended mode is PSD word 1 bit 5; it opens the full 24-bit space.
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[mem_op(OP_LA, 1, 2, 0x100), pack(half_op(OP_HALT), 0)],
    );
    ctx.cpu.psd.w1 |= 0x0400_0000;
    ctx.cpu.regs.write(2, 0x00F0_0000);
    assert_eq!(ctx.run(3), StopReason::Halted);
    assert_eq!(ctx.cpu.regs.read(1), 0x00F0_0100);
}

#[test]
fn test_based_bit_is_inert_without_base_registers() {
    // C27 has no base-register set, so the PSD based bit selects nothing
    // and the based-only opcodes stay reserved.
    let mut ctx =
        TestContext::with_model(CpuModel::C27).load_program(0x1000, &[reg_op(OP_TRBR, 1, 2)]);
    // Based mode is PSD word 1 bit 6.
    ctx.cpu.psd.w1 |= 0x0200_0000;
    ctx.cpu.regs.write(2, 0xBEEF);
    assert!(matches!(
        ctx.run(1),
        StopReason::UnvectoredTrap(Trap::UndefinedInstruction(_))
    ));
    assert_eq!(ctx.cpu.regs.read_base(1), 0);
}

#[test]
fn test_trbr_loads_a_base_register_on_based_models() {
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[reg_op(OP_TRBR, 1, 2), pack(half_op(OP_HALT), 0)],
    );
    ctx.cpu.psd.w1 |= 0x0200_0000;
    ctx.cpu.regs.write(2, 0xBEEF);
    assert_eq!(ctx.run(3), StopReason::Halted);
    assert_eq!(ctx.cpu.regs.read_base(1), 0xBEEF);
}

#[test]
fn test_boot_words_populate_the_scratchpad() {
    let config = Config {
        boot: BootConfig {
            boot_device: 0x7A,
            ..BootConfig::default()
        },
        ..Config::default()
    };
    let ctx = TestContext::with_config(config);
    assert_eq!(ctx.cpu.scratchpad.boot_device(), 0x7A);
    // Identity key: model id shifted above the context index.
    assert_eq!(ctx.cpu.scratchpad.identity(), 0x67 << 8);
}

#[test]
fn test_unprivileged_halt_traps() {
    let mut ctx = TestContext::new().load_program(0x1000, &[pack(half_op(OP_HALT), 0)]);
    ctx.cpu.psd.set_privileged(false);
    assert!(matches!(
        ctx.run(1),
        StopReason::UnvectoredTrap(Trap::PrivilegeViolation(_))
    ));
}

#[test]
fn test_lpsdcm_switches_context() {
    let mut ctx = TestContext::new().load_program(0x1000, &[mem_op(OP_LPSDCM, 0, 0, 0x2000)]);
    ctx.poke(0x2000, 0x8000_0000 | 0x4000);
    ctx.poke(0x2004, 0);
    ctx.poke(0x4000, pack(half_op(OP_HALT), 0));

    assert_eq!(ctx.run(5), StopReason::Halted);
    assert_eq!(ctx.cpu.mmu.stats.invalidations, 1);
}

#[test]
fn test_scratchpad_write_read() {
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[
            reg_op(OP_WSCR, 1, 7),
            reg_op(OP_RSCR, 2, 7),
            pack(half_op(OP_HALT), 0),
        ],
    );
    ctx.cpu.regs.write(1, 0xCAFE);
    assert_eq!(ctx.run(5), StopReason::Halted);
    assert_eq!(ctx.cpu.regs.read(2), 0xCAFE);
}

#[test]
fn test_null_io_reports_no_device() {
    let mut ctx =
        TestContext::new().load_program(0x1000, &[mem_op(OP_SIO, 0, 0, 0x7F), pack(half_op(OP_HALT), 0)]);
    assert_eq!(ctx.run(5), StopReason::Halted);
    assert_eq!(ctx.cpu.psd.cc(), CC_NEGATIVE);
    assert_eq!(ctx.cpu.counters.io_calls, 1);
}

#[test]
fn test_wait_wakes_on_signal_and_vectors() {
    let mut ctx =
        TestContext::new().load_program(0x1000, &[pack(half_op(OP_WAIT), half_op(OP_NOP))]);
    ctx.set_int_vector(0, 0x8000_0000 | 0x4000, 0);
    ctx.poke(0x4000, pack(half_op(OP_HALT), 0));

    let TestContext { system, mut cpu } = ctx;
    thread::scope(|scope| {
        let sender = scope.spawn(|| {
            thread::sleep(Duration::from_millis(20));
            assert!(system.mailbox().signal(ContextId::Cpu, SignalCause::Sipu));
        });
        assert_eq!(cpu.run(), StopReason::Halted);
        sender.join().unwrap();
    });
    assert_eq!(cpu.counters.waits, 1);
    assert_eq!(cpu.counters.signals_taken, 1);
}

#[test]
fn test_dual_context_signaling() {
    let config = Config {
        ipu: true,
        boot: BootConfig {
            psd1: 0x8000_0000 | 0x1000,
            // Blocked: the signals stay pending rather than vectoring
            // through tables this bare machine never set up.
            psd2: 0x2000_0000,
            ..BootConfig::default()
        },
        ..Config::default()
    };
    let system = System::new(config);
    // Both contexts boot at the same program: signal the peer, then halt.
    system
        .memory()
        .write32(
            RealAddr::new(0x1000),
            pack(half_op(OP_SIPU), half_op(OP_HALT)),
        )
        .unwrap();

    let report = system.run();
    assert_eq!(report.cpu.stop, "halted");
    let ipu = report.ipu.unwrap();
    assert!(ipu.stop == "halted" || ipu.stop == "stopped by request");
    assert!(report.mailbox.sent + report.mailbox.dropped >= 1);
}
