//! 模拟器测试

use std::sync::atomic::{AtomicUsize, Ordering};

use super::status::fcsr_flags;
use super::*;
use crate::isa::encode;
use crate::isa::regs::*;
use crate::isa::{BREAK_INSTR, FP_ADD, FP_CVT_W, FP_DIV, FP_TRUNC_W, NOP_INSTR};
use crate::isolate::HeapRegion;
use crate::memory::FlatMemory;

const CODE: u32 = 0x1_0000;
const DATA: u32 = 0x1_8000;

fn memory(code: &[u32]) -> FlatMemory {
    let mut mem = FlatMemory::new(0x2_0000, CODE);
    mem.write_words(CODE, code).unwrap();
    mem
}

fn sim() -> Simulator {
    SimulatorBuilder::new().build().unwrap()
}

fn scripted(builder: SimulatorBuilder, script: &str) -> (Simulator, SharedOutput) {
    let (console, output) = DebugConsole::scripted(script);
    (builder.with_console(console).build().unwrap(), output)
}

#[test]
fn test_fresh_simulator_is_at_end() {
    let mut sim = sim();
    let mut mem = memory(&[]);
    sim.execute(&mut mem).unwrap();
    assert_eq!(sim.icount(), 0);
}

#[test]
fn test_call_adds_arguments() {
    let mut sim = sim();
    let mut mem = memory(&[encode::jr(RA), encode::addu(V0, A0, A1)]);
    sim.set_register(S3, 0x5151);

    assert_eq!(sim.call(&mut mem, CODE, [10, 20, 0, 0]).unwrap(), 30);
    // jr + 延迟槽
    assert_eq!(sim.icount(), 2);
    assert_eq!(sim.register(S3), 0x5151);
    assert_eq!(sim.register(SP), sim.stack_top());
    assert_eq!(sim.pc(), END_SIMULATION_PC);
}

#[test]
fn test_call_aligns_stack_pointer() {
    let mut sim = sim();
    let mut mem = memory(&[encode::jr(RA), encode::addu(V0, SP, ZR)]);
    let top = sim.stack_top();
    sim.set_register(SP, top - 4);

    let seen = sim.call(&mut mem, CODE, [0; 4]).unwrap() as u32;
    assert_eq!(seen, top - 8);
    assert_eq!(sim.register(SP), top - 4);
}

#[test]
fn test_division_edges() {
    let mut sim = sim();
    let mut mem = memory(&[
        encode::div(A0, A1),
        encode::mflo(V0),
        encode::jr(RA),
        encode::mfhi(V1),
    ]);

    assert_eq!(sim.call(&mut mem, CODE, [7, 0, 0, 0]).unwrap(), 0);
    assert_eq!(sim.call(&mut mem, CODE, [0x8000_0000, 0xFFFF_FFFF, 0, 0]).unwrap(), 0x8000_0000);
    // 商 -3，余数 -1
    assert_eq!(sim.call(&mut mem, CODE, [-7i32 as u32, 2, 0, 0]).unwrap(), -3);
}

#[test]
fn test_unsigned_division_by_zero() {
    let mut sim = sim();
    let mut mem = memory(&[
        encode::divu(A0, A1),
        encode::mflo(V0),
        encode::jr(RA),
        encode::mfhi(V1),
    ]);
    assert_eq!(sim.call(&mut mem, CODE, [9, 0, 0, 0]).unwrap(), 0);
    assert_eq!(sim.call(&mut mem, CODE, [9, 4, 0, 0]).unwrap(), (1 << 32) | 2);
}

#[test]
fn test_multiply_and_bit_ops() {
    let mut sim = sim();
    let mut mem = memory(&[
        encode::mult(A0, A1),
        encode::mfhi(T0),
        encode::mflo(T1),
        encode::madd(A0, A1),
        encode::mflo(T2),
        encode::clz(T3, A1),
        encode::clo(T4, A0),
        encode::sra(T5, A0, 1),
        encode::srl(T6, A0, 28),
        encode::mul(T7, A0, A1),
        encode::mflo(T8),
        encode::jr(RA),
        encode::nop(),
    ]);

    sim.call(&mut mem, CODE, [-2i32 as u32, 3, 0, 0]).unwrap();
    assert_eq!(sim.register(T0), 0xFFFF_FFFF);
    assert_eq!(sim.register(T1), -6i32 as u32);
    assert_eq!(sim.register(T2), -12i32 as u32);
    assert_eq!(sim.register(T3), 30);
    assert_eq!(sim.register(T4), 31);
    assert_eq!(sim.register(T5), 0xFFFF_FFFF);
    assert_eq!(sim.register(T6), 0xF);
    assert_eq!(sim.register(T7), -6i32 as u32);
    // MUL 不改 HI/LO
    assert_eq!(sim.register(T8), -12i32 as u32);
}

#[test]
fn test_branch_delay_slot() {
    let mut sim = sim();
    let mut mem = memory(&[
        encode::beq(A0, A1, 2),
        encode::addiu(V0, ZR, 1),
        encode::addiu(V0, V0, 100),
        encode::jr(RA),
        encode::addiu(V0, V0, 10),
    ]);

    // 跳转：延迟槽执行，越过 +100
    assert_eq!(sim.call(&mut mem, CODE, [1, 1, 0, 0]).unwrap(), 11);
    // 不跳转：延迟槽照样执行
    assert_eq!(sim.call(&mut mem, CODE, [1, 2, 0, 0]).unwrap(), 111);
}

#[test]
fn test_jal_uses_simulator_stack() {
    let mut sim = sim();
    let mut mem = memory(&[
        encode::addiu(SP, SP, -8),
        encode::sw(RA, SP, 0),
        encode::jal(CODE + 0x20),
        encode::nop(),
        encode::lw(RA, SP, 0),
        encode::jr(RA),
        encode::addiu(SP, SP, 8),
        encode::nop(),
        encode::jr(RA),
        encode::addiu(V0, A0, 1),
    ]);

    assert_eq!(sim.call(&mut mem, CODE, [41, 0, 0, 0]).unwrap(), 42);
    let top = sim.stack_top();
    assert_eq!(sim.read_word(&mut mem, top - 8).unwrap(), END_SIMULATION_PC);
    assert_eq!(sim.register(SP), top);
}

#[test]
fn test_overflow_traps_without_writing() {
    let (mut sim, output) = scripted(SimulatorBuilder::new(), "");
    let mut mem = memory(&[encode::add(V0, A0, A1), encode::jr(RA), encode::nop()]);

    let err = sim.call(&mut mem, CODE, [0x7FFF_FFFF, 1, 0, 0]).unwrap_err();
    assert!(matches!(err, SimError::Overflow { pc: CODE }));
    assert_eq!(sim.register(V0), 0);
    assert_eq!(sim.pc(), CODE);
    assert!(output.contents().contains("Simulator hit integer overflow at pc=0x00010000"));

    // ADDU 不陷入
    let mut mem = memory(&[encode::jr(RA), encode::addu(V0, A0, A1)]);
    let mut sim = self::sim();
    assert_eq!(sim.call(&mut mem, CODE, [0x7FFF_FFFF, 1, 0, 0]).unwrap(), 0x8000_0000);
}

#[test]
fn test_unaligned_halfword_aborts() {
    let (mut sim, output) = scripted(SimulatorBuilder::new(), "c\nsi\n");
    let mut mem = memory(&[encode::lh(V0, A0, 1), encode::jr(RA), encode::nop()]);

    let err = sim.call(&mut mem, CODE, [DATA, 0, 0, 0]).unwrap_err();
    assert!(matches!(
        err,
        SimError::Unaligned { access: "signed halfword read", addr, pc: CODE } if addr == DATA + 1
    ));
    let text = output.contents();
    assert!(text.contains("Simulator hit unaligned signed halfword read at 0x00018001"));
    assert_eq!(text.matches("Execution cannot resume after this trap.").count(), 2);
}

#[test]
fn test_sign_and_zero_extending_loads() {
    let mut sim = sim();
    let mut mem = memory(&[
        encode::lb(T0, A0, 0),
        encode::lbu(T1, A0, 0),
        encode::lh(T2, A0, 2),
        encode::lhu(T3, A0, 2),
        encode::sh(A1, A0, 6),
        encode::sb(A1, A0, 8),
        encode::jr(RA),
        encode::nop(),
    ]);
    mem.store32(DATA, 0x8001_00F0).unwrap();

    sim.call(&mut mem, CODE, [DATA, 0x1234_5678, 0, 0]).unwrap();
    assert_eq!(sim.register(T0), 0xFFFF_FFF0);
    assert_eq!(sim.register(T1), 0xF0);
    assert_eq!(sim.register(T2), 0xFFFF_8001);
    assert_eq!(sim.register(T3), 0x8001);
    assert_eq!(mem.load32(DATA + 4).unwrap(), 0x5678_0000);
    assert_eq!(mem.load32(DATA + 8).unwrap(), 0x78);
}

#[test]
fn test_illegal_access() {
    let mut sim = sim();
    let mut mem = memory(&[encode::lw(V0, ZR, 0x10), encode::jr(RA), encode::nop()]);
    let err = sim.call(&mut mem, CODE, [0; 4]).unwrap_err();
    assert!(matches!(err, SimError::IllegalAccess { addr: 0x10, pc: CODE }));
}

#[test]
fn test_unimplemented_encoding() {
    let mut sim = sim();
    let mut mem = memory(&[0xFC00_0000]);
    let err = sim.call(&mut mem, CODE, [0; 4]).unwrap_err();
    assert!(matches!(err, SimError::Unimplemented { raw: 0xFC00_0000, pc: CODE }));

    // 没有 FPU 时 COP1 编码同样未实现
    let mut mem = memory(&[encode::mtc1(A0, 0)]);
    assert!(matches!(sim.call(&mut mem, CODE, [0; 4]), Err(SimError::Unimplemented { .. })));
}

#[test]
fn test_control_transfer_in_delay_slot() {
    let mut sim = sim();
    let mut mem = memory(&[encode::jr(RA), encode::j(CODE)]);
    let err = sim.call(&mut mem, CODE, [0; 4]).unwrap_err();
    assert!(matches!(err, SimError::JumpInDelaySlot { raw, pc } if raw == encode::j(CODE) && pc == CODE + 4));

    let mut sim = self::sim();
    let mut mem = memory(&[encode::jr(RA), encode::break_(0)]);
    let err = sim.call(&mut mem, CODE, [0; 4]).unwrap_err();
    assert!(matches!(err, SimError::BreakInDelaySlot { pc } if pc == CODE + 4));
}

#[test]
fn test_callee_saved_clobber_detected() {
    let mut sim = sim();
    let mut mem = memory(&[encode::addiu(S0, ZR, 1), encode::jr(RA), encode::nop()]);
    let err = sim.call(&mut mem, CODE, [0; 4]).unwrap_err();
    assert!(matches!(
        err,
        SimError::CalleeSavedClobbered { reg: "s0", expected: 0, found: 1 }
    ));
    // 出错前已恢复调用者状态
    assert_eq!(sim.register(S0), 0);
    assert_eq!(sim.register(SP), sim.stack_top());

    let mut mem = memory(&[encode::jr(RA), encode::addu(V0, A0, A1)]);
    assert_eq!(sim.call(&mut mem, CODE, [2, 3, 0, 0]).unwrap(), 5);
}

#[test]
fn test_hard_break_continue() {
    let code = [encode::break_(0), encode::addiu(V0, ZR, 5), encode::jr(RA), encode::nop()];

    let (mut sim, output) = scripted(SimulatorBuilder::new(), "c\n");
    let mut mem = memory(&code);
    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 5);
    assert!(output.contents().contains("Simulator hit break 0 at 0x00010000"));

    // 无人值守：跳过 BREAK
    let mut sim = self::sim();
    let mut mem = memory(&code);
    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 5);
}

#[test]
fn test_unstop_disables_break() {
    let (mut sim, output) = scripted(SimulatorBuilder::new(), "unstop\nc\n");
    let mut mem = memory(&[encode::break_(0), encode::addiu(V0, ZR, 5), encode::jr(RA), encode::nop()]);

    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 5);
    assert_eq!(mem.load32(CODE).unwrap(), NOP_INSTR);
    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 5);
    assert_eq!(output.contents().matches("Simulator hit").count(), 1);
}

#[test]
fn test_unstop_outside_stop() {
    let code = [encode::nop(), encode::addiu(V0, ZR, 3)];
    let (mut sim, output) = scripted(SimulatorBuilder::new(), "unstop\n");
    let mut mem = memory(&code);
    sim.set_pc(CODE + 4);
    assert_eq!(sim.debug(&mut mem).unwrap(), ShellExit::Detached { stepped: false });
    assert!(output.contents().contains("Not at debugger stop."));
    assert_eq!(mem.load32(CODE).unwrap(), code[0]);
    assert_eq!(mem.load32(CODE + 4).unwrap(), code[1]);
    assert_eq!(sim.pc(), CODE + 4);
}

#[test]
fn test_stop_at_then_breakpoint() {
    let (mut sim, output) =
        scripted(SimulatorBuilder::new().with_stop_sim_at(1), "break 0x10008\nc\np v0\nc\n");
    let mut mem = memory(&[
        encode::addiu(V0, ZR, 5),
        encode::addiu(V0, V0, 1),
        encode::addiu(V0, V0, 2),
        encode::jr(RA),
        encode::nop(),
    ]);

    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 8);
    let text = output.contents();
    assert!(text.contains("Simulator hit stop_sim_at 1"));
    assert!(text.contains("Simulator hit breakpoint at 0x00010008"));
    assert!(text.contains("v0: 6 0x6"));
    // 断点在继续执行时重新写回
    assert_eq!(sim.break_pc(), Some(CODE + 8));
    assert_eq!(mem.load32(CODE + 8).unwrap(), BREAK_INSTR);
}

#[test]
fn test_breakpoint_in_delay_slot_refused() {
    let (mut sim, output) =
        scripted(SimulatorBuilder::new().with_stop_sim_at(1), "break 0x10008\nc\n");
    let mut mem = memory(&[encode::nop(), encode::jr(RA), encode::addu(V0, A0, A1)]);

    assert_eq!(sim.call(&mut mem, CODE, [4, 5, 0, 0]).unwrap(), 9);
    let text = output.contents();
    assert!(text.contains("0x00010008 is a delay slot\nsetting breakpoint failed"));
    assert!(!text.contains("Simulator hit breakpoint"));
    assert_eq!(sim.break_pc(), None);
    assert_eq!(mem.load32(CODE + 8).unwrap(), encode::addu(V0, A0, A1));
}

#[test]
fn test_stop_count_in_final_delay_slot() {
    let (mut sim, output) = scripted(SimulatorBuilder::new().with_stop_sim_at(2), "c\n");
    let mut mem = memory(&[encode::jr(RA), encode::addu(V0, A0, A1)]);

    assert_eq!(sim.call(&mut mem, CODE, [1, 2, 0, 0]).unwrap(), 3);
    assert_eq!(output.contents().matches("Simulator hit stop_sim_at 2").count(), 1);
    assert_eq!(sim.pc(), END_SIMULATION_PC);

    // 下一次调用不再停下
    assert_eq!(sim.call(&mut mem, CODE, [4, 5, 0, 0]).unwrap(), 9);
    assert_eq!(output.contents().matches("Simulator hit").count(), 1);
}

#[test]
fn test_stop_count_in_delay_slot_stops_at_target() {
    let (mut sim, output) = scripted(SimulatorBuilder::new().with_stop_sim_at(2), "p v0\nc\n");
    let mut mem = memory(&[
        encode::j(CODE + 12),
        encode::addiu(V0, ZR, 1),
        encode::addiu(V0, ZR, 99),
        encode::addiu(V0, V0, 10),
        encode::jr(RA),
        encode::nop(),
    ]);

    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 11);
    let text = output.contents();
    assert!(text.contains("Simulator hit stop_sim_at 2\n0x0001000c"));
    assert!(text.contains("v0: 1 0x1"));
}

#[test]
fn test_second_breakpoint_rejected() {
    let (mut sim, output) = scripted(SimulatorBuilder::new(), "break 0x10008\nbreak 0x1000c\nc\n");
    let mut mem = memory(&[encode::nop(); 4]);
    sim.set_pc(CODE);

    assert_eq!(sim.debug(&mut mem).unwrap(), ShellExit::Continued);
    assert!(output.contents().contains("setting breakpoint failed"));
    assert_eq!(sim.pc(), CODE + 4);
    assert_eq!(sim.break_pc(), Some(CODE + 8));
    assert_eq!(mem.load32(CODE + 8).unwrap(), BREAK_INSTR);
    assert_eq!(mem.load32(CODE + 12).unwrap(), NOP_INSTR);
}

#[test]
fn test_detach_clears_breakpoint() {
    let (mut sim, _) = scripted(SimulatorBuilder::new(), "break 0x10008\n");
    let mut mem = memory(&[encode::nop(); 4]);
    sim.set_pc(CODE);
    assert_eq!(sim.debug(&mut mem).unwrap(), ShellExit::Detached { stepped: false });
    assert_eq!(sim.break_pc(), None);
    assert_eq!(mem.load32(CODE + 8).unwrap(), NOP_INSTR);
}

#[test]
fn test_step_commands() {
    let (mut sim, output) = scripted(SimulatorBuilder::new(), "si\nsi\n");
    let mut mem = memory(&[encode::addiu(V0, ZR, 1), encode::addiu(V0, V0, 1), encode::jr(RA), encode::nop()]);
    sim.set_pc(CODE);

    assert_eq!(sim.debug(&mut mem).unwrap(), ShellExit::Detached { stepped: true });
    assert_eq!(sim.pc(), CODE + 8);
    assert_eq!(sim.register(V0), 2);
    assert!(output.contents().contains("jr ra"));
}

#[test]
fn test_step_refused_on_undecodable() {
    let (mut sim, output) = scripted(SimulatorBuilder::new(), "si\nc\n");
    let mut mem = memory(&[0xFC00_0000]);
    sim.set_pc(CODE);

    assert_eq!(sim.debug(&mut mem).unwrap(), ShellExit::Detached { stepped: false });
    let text = output.contents();
    assert!(text.contains("Instruction could not be decoded. Stepping disabled."));
    assert!(text.contains("Instruction could not be decoded. Cannot continue."));
    assert_eq!(sim.pc(), CODE);
}

#[test]
fn test_print_commands() {
    let script = "p sp\np *0x10000\np bogus\np\npf f2\npf f5\npo t0\npo *a0\ndi 2\ndi 0x10 3\nfrob\nhelp\nq\n";
    let heap = Arc::new(HeapRegion::new(0x2_0000, 0x3_0000));
    let (mut sim, output) = scripted(SimulatorBuilder::new().with_fpu().with_heap_inspector(heap), script);
    let mut mem = memory(&[encode::addu(V0, A0, A1), encode::jr(RA), encode::nop()]);
    mem.store32(0x2_0004, 0xBEEF).unwrap();
    sim.set_pc(CODE);
    sim.set_register(T0, 0x2_0004);
    sim.set_register(A0, 5);
    sim.cpu_mut().write_double(2, 1.5);
    sim.cpu_mut().write_fp(5, 2.5f32.to_bits());

    assert!(matches!(sim.debug(&mut mem), Err(SimError::Quit)));

    let text = output.contents();
    let top = sim.stack_top();
    let word = encode::addu(V0, A0, A1);
    let half = 2.5f64.to_bits();
    assert!(text.contains(&format!("sp: {top} 0x{top:x}")));
    assert!(text.contains(&format!("*0x10000: {word} 0x{word:x}")));
    assert!(text.contains("bogus unrecognized"));
    assert!(text.contains("print <reg or value or *addr>"));
    assert!(text.contains("f2: 4609434218613702656 0x3ff8000000000000 1.5"));
    assert!(text.contains(&format!("f5: {half} 0x{half:x} 2.5")));
    assert!(text.contains("t0: \nobject at 0x00020004, header 0x0000beef"));
    assert!(text.contains("0x5 is not an object reference"));
    assert!(text.contains("0x00010004  03e00008  jr ra"));
    assert!(text.contains("First argument yields invalid address: 0x10\nUsing PC instead"));
    assert!(text.contains("Unknown command: frob"));
    assert!(text.contains("po/printobject"));
    assert!(text.ends_with("Quitting\n"));
}

#[test]
fn test_gdb_hook() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let builder = SimulatorBuilder::new().with_native_debug_hook(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    let (mut sim, output) = scripted(builder, "gdb\n");
    let mut mem = memory(&[encode::nop()]);
    sim.set_pc(CODE);

    sim.debug(&mut mem).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let text = output.contents();
    assert!(text.contains("relinquishing control to gdb\nregaining control from gdb"));
}

#[test]
fn test_double_arithmetic_and_compare() {
    let mut sim = SimulatorBuilder::new().with_fpu().build().unwrap();
    let mut mem = memory(&[
        encode::cop1_d(FP_ADD, 4, 0, 2),
        encode::c_cond_d(12, 0, 2),
        encode::bc1t(2),
        encode::addiu(V0, ZR, 1),
        encode::addiu(V0, ZR, 99),
        encode::cop1_d(FP_TRUNC_W, 6, 4, 0),
        encode::mfc1(V1, 6),
        encode::jr(RA),
        encode::nop(),
    ]);
    sim.cpu_mut().write_double(0, 1.5);
    sim.cpu_mut().write_double(2, 2.25);

    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), (3 << 32) | 1);
    assert_eq!(sim.cpu().read_double(4), Some(3.75));
    assert_eq!(sim.cpu().fcsr() & fcsr_flags::INEXACT, fcsr_flags::INEXACT);
}

#[test]
fn test_convert_uses_fcsr_rounding_mode() {
    let mut sim = SimulatorBuilder::new().with_fpu().build().unwrap();
    let mut mem = memory(&[
        encode::cop1_d(FP_CVT_W, 2, 0, 0),
        encode::mfc1(V0, 2),
        encode::ori(T0, ZR, 2),
        encode::ctc1(T0, 31),
        encode::cop1_d(FP_CVT_W, 2, 0, 0),
        encode::mfc1(V1, 2),
        encode::jr(RA),
        encode::nop(),
    ]);
    sim.cpu_mut().write_double(0, 2.5);

    // 就近舍入到偶数得 2；向正无穷得 3
    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), (3 << 32) | 2);
}

#[test]
fn test_divide_by_zero_sets_flag() {
    let mut sim = SimulatorBuilder::new().with_fpu().build().unwrap();
    let mut mem = memory(&[
        encode::cop1_d(FP_DIV, 4, 0, 2),
        encode::jr(RA),
        encode::cfc1(V0, 31),
    ]);
    sim.cpu_mut().write_double(0, 1.0);
    sim.cpu_mut().write_double(2, 0.0);

    let fcsr = sim.call(&mut mem, CODE, [0; 4]).unwrap() as u32;
    assert_ne!(fcsr & fcsr_flags::DIV_BY_ZERO, 0);
    assert_eq!(sim.cpu().read_double(4), Some(f64::INFINITY));
}

#[test]
fn test_word_to_double_and_store() {
    let mut sim = SimulatorBuilder::new().with_fpu().build().unwrap();
    let mut mem = memory(&[
        encode::mtc1(A0, 0),
        encode::cvt_d_w(2, 0),
        encode::sdc1(2, A1, 0),
        encode::jr(RA),
        encode::ldc1(4, A1, 0),
    ]);

    sim.call(&mut mem, CODE, [-7i32 as u32, DATA, 0, 0]).unwrap();
    let bits = ((mem.load32(DATA + 4).unwrap() as u64) << 32) | mem.load32(DATA).unwrap() as u64;
    assert_eq!(f64::from_bits(bits), -7.0);
    assert_eq!(sim.cpu().read_double(4), Some(-7.0));
}

#[test]
fn test_unaligned_doubleword() {
    let mut sim = SimulatorBuilder::new().with_fpu().build().unwrap();
    let mut mem = memory(&[encode::ldc1(0, A0, 4), encode::jr(RA), encode::nop()]);
    let err = sim.call(&mut mem, CODE, [DATA, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, SimError::Unaligned { access: "doubleword read", .. }));
}

#[test]
fn test_dump_regs() {
    let mut sim = SimulatorBuilder::new().with_fpu().build().unwrap();
    sim.set_register(A0, 0x1234);
    let mut out = Vec::new();
    sim.cpu().dump_regs(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("a0: 0x00001234"));
    assert!(text.contains("FCSR: 0x00000000"));
}
