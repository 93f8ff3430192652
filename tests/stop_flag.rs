//! 进程级 `stop_sim_at` 的测试
//!
//! 该标志是全局状态，这里的测试用同一把锁串行执行。

use std::sync::Mutex;

use archsim::isa::encode;
use archsim::isa::regs::*;
use archsim::memory::FlatMemory;
use archsim::sim::{flags, DebugConsole, SimulatorBuilder};

const CODE: u32 = 0x1_0000;

static FLAG_LOCK: Mutex<()> = Mutex::new(());

/// 测试结束时恢复标志
struct FlagGuard(u64);

impl FlagGuard {
    fn set(count: u64) -> Self {
        let previous = flags::stop_sim_at();
        flags::set_stop_sim_at(count);
        FlagGuard(previous)
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        flags::set_stop_sim_at(self.0);
    }
}

fn memory() -> FlatMemory {
    let mut mem = FlatMemory::new(0x1000, CODE);
    mem.write_words(CODE, &[encode::addiu(V0, ZR, 7), encode::jr(RA), encode::nop()]).unwrap();
    mem
}

#[test]
fn test_stop_sim_at_round_trip() {
    let _lock = FLAG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = FlagGuard::set(1234);
    assert_eq!(flags::stop_sim_at(), 1234);
}

#[test]
fn test_process_flag_opens_debugger() {
    let _lock = FLAG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = FlagGuard::set(2);

    let (console, output) = DebugConsole::scripted("p v0\nc\n");
    let mut sim = SimulatorBuilder::new().with_console(console).build().unwrap();
    let mut mem = memory();

    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 7);
    let text = output.contents();
    assert!(text.contains("Simulator hit stop_sim_at 2"));
    assert!(text.contains("v0: 7 0x7"));
    assert!(text.contains("jr ra"));
}

#[test]
fn test_simulator_override_wins() {
    let _lock = FLAG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = FlagGuard::set(1);

    let (console, output) = DebugConsole::scripted("");
    let mut sim = SimulatorBuilder::new().with_console(console).with_stop_sim_at(0).build().unwrap();
    let mut mem = memory();

    assert_eq!(sim.call(&mut mem, CODE, [0; 4]).unwrap(), 7);
    assert!(output.contents().is_empty());
}
