//! # Trap Vectoring Tests

use c32_core::common::{SignalCause, StopReason, Trap};
use c32_core::config::{Config, CpuModel};
use c32_core::coord::ContextId;
use pretty_assertions::assert_eq;

use crate::common::build::*;
use crate::common::harness::TestContext;

const HANDLER_IP: u32 = 0x4000;
/// Privileged handler PSD word 1.
const HANDLER_PSD1: u32 = 0x8000_0000 | HANDLER_IP;

#[test]
fn test_svc_vectors_with_call_number() {
    let mut ctx = TestContext::new().load_program(0x1000, &[imm_op(OP_SVC, 0, 0x42)]);
    let tcb = ctx.set_trap_vector(11, HANDLER_PSD1, 0);

    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), HANDLER_IP);
    assert!(ctx.cpu.psd.privileged());

    // Old PSD with the instruction after the SVC in the IP field.
    assert_eq!(ctx.peek(tcb) & 0x00FF_FFFF, 0x1004);
    // Status word: model id, cause index.
    assert_eq!(ctx.peek(tcb + 16), (CpuModel::C67.id() << 24) | (11 << 16));
    // Detail word: the call number.
    assert_eq!(ctx.peek(tcb + 20), 0x42);
    assert_eq!(ctx.cpu.counters.traps, 1);
}

#[test]
fn test_undefined_instruction_saves_next_ip() {
    let mut ctx = TestContext::new().load_program(0x1000, &[0xFF00_0000]);
    let tcb = ctx.set_trap_vector(2, HANDLER_PSD1, 0);
    ctx.step_ok();
    assert_eq!(ctx.peek(tcb) & 0x00FF_FFFF, 0x1004);
    assert_eq!(ctx.peek(tcb + 20), 0xFF00_0000);
}

#[test]
fn test_map_fault_reexecutes() {
    // C87: an invalid operand page map-faults, and the fault re-executes.
    let mut ctx = TestContext::with_model(CpuModel::C87);
    // Identity-map the program page (2 KiB pages: 0x1000 is page 2).
    ctx.map_pages(1, &[(2, 2)], 0);
    let tcb = ctx.set_trap_vector(4, HANDLER_PSD1, 0);
    ctx = ctx.load_program(0x1000, &[mem_op(OP_LW, 1, 0, 0x2800)]);
    // Mapped, privileged, CPIX 1.
    ctx.cpu.psd.w1 |= 0x8000_0000;
    ctx.cpu.psd.w2 = 0x8000_0001;
    ctx.cpu.psd.set_ip(0x1000);

    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), HANDLER_IP);
    // Saved IP addresses the faulting instruction, not its successor.
    assert_eq!(ctx.peek(tcb) & 0x00FF_FFFF, 0x1000);
}

#[test]
fn test_zero_vector_table_is_fatal() {
    let mut ctx = TestContext::new().load_program(0x1000, &[0xFF00_0000]);
    assert_eq!(
        ctx.run(1),
        StopReason::UnvectoredTrap(Trap::UndefinedInstruction(0xFF00_0000))
    );
}

#[test]
fn test_zero_handler_psd_is_fatal() {
    let mut ctx = TestContext::new().load_program(0x1000, &[0xFF00_0000]);
    ctx.set_trap_vector(2, 0, 0);
    assert!(matches!(ctx.run(1), StopReason::UnvectoredTrap(_)));
}

#[test]
fn test_async_signal_vectors_through_interrupt_table() {
    let mut ctx = TestContext::new().load_program(0x1000, &[half_op(OP_NOP)]);
    let tcb = ctx.set_int_vector(0, HANDLER_PSD1, 0);
    let _ = ctx.system.mailbox().signal(ContextId::Cpu, SignalCause::Sipu);

    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), HANDLER_IP);
    // The interrupted instruction has not executed; it resumes exactly
    // where delivery happened.
    assert_eq!(ctx.peek(tcb) & 0x00FF_FFFF, 0x1000);
    assert_eq!(ctx.cpu.counters.signals_taken, 1);
}

#[test]
fn test_blocked_signal_stays_pending() {
    let mut ctx = TestContext::new().load_program(
        0x1000,
        &[pack(half_op(OP_NOP), half_op(OP_NOP)), half_op(OP_NOP)],
    );
    ctx.set_int_vector(0, HANDLER_PSD1, 0);
    ctx.cpu.psd.set_blocked(true);
    let _ = ctx.system.mailbox().signal(ContextId::Cpu, SignalCause::Sipu);

    ctx.step_ok();
    ctx.step_ok();
    assert_eq!(ctx.cpu.counters.signals_taken, 0);
    assert!(ctx.system.mailbox().pending(ContextId::Cpu));
    // Observed-while-blocked is counted once per signal, not per poll.
    assert_eq!(ctx.system.mailbox().counters().blocked, 1);
}

#[test]
fn test_halt_trap_intercepts_halt() {
    let config = Config {
        halt_trap: true,
        ..Config::default()
    };
    let mut ctx = TestContext::with_config(config).load_program(0x1000, &[half_op(OP_HALT)]);
    ctx.set_trap_vector(13, HANDLER_PSD1, 0);
    ctx.step_ok();
    assert_eq!(ctx.cpu.psd.ip(), HANDLER_IP);
}

#[test]
fn test_vectoring_invalidates_caches_unless_retained() {
    let mut ctx = TestContext::new().load_program(0x1000, &[imm_op(OP_SVC, 0, 1), 0, 0, 0]);
    ctx.set_trap_vector(11, HANDLER_PSD1, 0);
    ctx.step_ok();
    assert_eq!(ctx.cpu.mmu.stats.invalidations, 1);

    // Retain-mapping bit set in the handler PSD word 2.
    let mut ctx = TestContext::new().load_program(0x1000, &[imm_op(OP_SVC, 0, 1)]);
    ctx.set_trap_vector(11, HANDLER_PSD1, 0x4000_0000);
    ctx.step_ok();
    assert_eq!(ctx.cpu.mmu.stats.invalidations, 0);
}
