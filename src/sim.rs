//! MIPS32 指令集模拟器
//!
//! 本模块定义模拟器 `Simulator`：
//! - `Cpu`: 寄存器文件、HI/LO、程序计数器、延迟槽状态
//! - `AddressSpace`: 模拟器自有栈区 + 宿主内存
//! - `exu`: 按指令组划分的执行单元
//! - `debugger`: 行命令调试器
//!
//! 执行流程：取指 → 解码 → 执行（可能包含一条延迟槽指令）→ PC += 4。
//! 当 PC 等于 `END_SIMULATION_PC` 时模拟结束；`call` 会把该值预先放入 `ra`。

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::isa::regs::{cpu_reg_name, A0, A1, A2, A3, CALLEE_SAVED, RA, SP, V0, V1};
use crate::isa::{DecodedInstr, DecoderRegistry, Disassembler};
use crate::isolate::{HeapInspector, Isolate};
use crate::memory::{FlatMemory, Memory};

mod builder;
mod bus;
pub mod debugger;
mod exu;
pub mod flags;
mod status;
mod trap;

pub use builder::SimulatorBuilder;
pub use bus::{default_illegal_address, AddressSpace, IllegalAddressFn};
pub use debugger::{DebugConsole, SharedOutput, ShellExit};
pub use status::{FpRegFile, GenericRegFile, RegFile, Status, StatusSnapshot};
pub use trap::{add_overflows, sub_overflows, SimError};

use debugger::{Debugger, StopKind};

/// 指令宽度
pub const INSTR_SIZE: u32 = 4;
/// 放入 `ra` 的哨兵返回地址，PC 到达此值时模拟结束
pub const END_SIMULATION_PC: u32 = 0xFFFF_FFFF;
/// 栈溢出处理所需的额外空间
pub const STACK_SIZE_BUFFER: u32 = 16 * 1024;
/// 栈顶之上的下溢缓冲
pub const STACK_UNDERFLOW_SIZE: u32 = 64;
pub const DEFAULT_STACK_SIZE: u32 = 256 * 1024;
pub const DEFAULT_STACK_BASE: u32 = 0x7F00_0000;
/// 调用帧对齐
pub const FRAME_ALIGNMENT: u32 = 8;

/// 原生调试器钩子（`gdb` 命令）
pub type NativeDebugHook = Arc<dyn Fn() + Send + Sync>;

/// 模拟 CPU 的架构状态
///
/// 设计约定：
/// - r0 永远为 0，写入时丢弃
/// - PC 指向当前指令；执行完成后统一 +4，跳转指令把 PC 设为目标 - 4
/// - 延迟槽中的指令在跳转生效前执行，且自身不能是跳转
pub struct Cpu {
    status: Status,
    pc: u32,
    icount: u64,
    delay_slot: bool,
    /// 本条指令执行了 BREAK（记录 code）
    pending_break: Option<u32>,
    /// 延迟槽中到达了停止计数，推迟到下一条指令前处理
    stop_requested: bool,
    /// 覆盖进程级 `flags::stop_sim_at`
    stop_sim_at: Option<u64>,
    decoder: Arc<DecoderRegistry>,
}

impl Cpu {
    pub(crate) fn new(status: Status, decoder: Arc<DecoderRegistry>, stop_sim_at: Option<u64>) -> Self {
        Self {
            status,
            pc: 0,
            icount: 0,
            delay_slot: false,
            pending_break: None,
            stop_requested: false,
            stop_sim_at,
            decoder,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    /// 已执行的指令数
    pub fn icount(&self) -> u64 {
        self.icount
    }

    pub fn in_delay_slot(&self) -> bool {
        self.delay_slot
    }

    /// 读取 r0 总是返回 0
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.status.int_read(reg)
    }

    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.status.int_write(reg, value)
    }

    pub fn hi(&self) -> u32 {
        self.status.hi
    }

    pub fn lo(&self) -> u32 {
        self.status.lo
    }

    pub fn set_hi(&mut self, value: u32) {
        self.status.hi = value;
    }

    pub fn set_lo(&mut self, value: u32) {
        self.status.lo = value;
    }

    /// FPU 未启用时返回 None
    pub fn read_fp(&self, reg: u8) -> Option<u32> {
        self.status.fp_read(reg)
    }

    pub fn write_fp(&mut self, reg: u8, value: u32) -> bool {
        self.status.fp_write(reg, value)
    }

    pub fn read_double(&self, reg: u8) -> Option<f64> {
        self.status.double_read(reg).map(f64::from_bits)
    }

    pub fn write_double(&mut self, reg: u8, value: f64) -> bool {
        self.status.double_write(reg, value.to_bits())
    }

    pub fn has_fpu(&self) -> bool {
        self.status.fp.is_some()
    }

    pub fn fcsr(&self) -> u32 {
        self.status.fcsr
    }

    pub fn regs(&self) -> &[u32; 32] {
        self.status.int.snapshot()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    pub fn decode(&self, raw: u32) -> DecodedInstr {
        self.decoder.decode(raw)
    }

    /// 生效的停止计数；0 表示不停止
    fn stop_threshold(&self) -> u64 {
        self.stop_sim_at.unwrap_or_else(flags::stop_sim_at)
    }

    /// 执行 PC + 4 处的延迟槽指令
    pub(crate) fn execute_delay_slot(&mut self, bus: &mut AddressSpace<'_>) -> Result<(), SimError> {
        let slot_pc = self.pc.wrapping_add(INSTR_SIZE);
        self.icount += 1;
        let threshold = self.stop_threshold();
        if threshold != 0 && self.icount == threshold {
            self.stop_requested = true;
        }
        let raw = bus.fetch(slot_pc)?;
        let decoded = self.decode(raw);
        if decoded.instr.is_control_transfer() {
            return Err(SimError::JumpInDelaySlot { raw, pc: slot_pc });
        }
        trace!(pc = format_args!("0x{slot_pc:08x}"), raw = format_args!("0x{raw:08x}"), "delay slot");
        self.delay_slot = true;
        let result = exu::execute(self, bus, decoded, slot_pc);
        self.delay_slot = false;
        result
    }

    /// 打印所有寄存器状态（用于调试）
    pub fn dump_regs(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "═══════════════════════════════════════════════════════════════════")?;
        writeln!(out, "Simulator Status Dump")?;
        writeln!(out, "═══════════════════════════════════════════════════════════════════")?;
        writeln!(
            out,
            "PC: 0x{:08x}  HI: 0x{:08x}  LO: 0x{:08x}  icount: {}",
            self.pc, self.status.hi, self.status.lo, self.icount
        )?;
        writeln!(out)?;

        writeln!(out, "─── Integer Registers (r0-r31) ───────────────────────────────────")?;
        for (i, value) in self.regs().iter().enumerate() {
            if i % 4 == 0 {
                write!(out, "  ")?;
            }
            write!(out, "{:>4}: 0x{:08x}  ", cpu_reg_name(i as u8), value)?;
            if i % 4 == 3 {
                writeln!(out)?;
            }
        }

        if let Some(fp) = &self.status.fp {
            writeln!(out)?;
            writeln!(out, "─── Floating-Point Registers (f0-f31) ────────────────────────────")?;
            for (i, bits) in fp.snapshot().iter().enumerate() {
                if i % 4 == 0 {
                    write!(out, "  ")?;
                }
                write!(out, "f{:02}: 0x{:08x}  ", i, bits)?;
                if i % 4 == 3 {
                    writeln!(out)?;
                }
            }
            writeln!(out, "  (double pairs):")?;
            for pair in (0..32u8).step_by(2) {
                if pair % 8 == 0 {
                    write!(out, "  ")?;
                }
                let value = self.read_double(pair).unwrap_or(0.0);
                write!(out, "f{:02}: {:14.6e} ", pair, value)?;
                if pair % 8 == 6 {
                    writeln!(out)?;
                }
            }
            writeln!(out, "  FCSR: 0x{:08x}", self.status.fcsr)?;
        }

        writeln!(out, "═══════════════════════════════════════════════════════════════════")
    }
}

/// 指令集模拟器
///
/// 每个 isolate 至多持有一个，由 `Simulator::current` 惰性创建。
pub struct Simulator {
    cpu: Cpu,
    stack: FlatMemory,
    stack_size: u32,
    frame_alignment: u32,
    illegal: IllegalAddressFn,
    /// 唯一的地址断点及其原始指令
    break_pc: Option<u32>,
    break_instr: u32,
    /// 嵌套调试器 shell 的层数
    shell_depth: u32,
    console: DebugConsole,
    disassembler: Arc<dyn Disassembler>,
    heap: Option<Arc<dyn HeapInspector>>,
    native_debug_hook: Option<NativeDebugHook>,
}

impl Simulator {
    /// 获取（必要时创建）isolate 的模拟器
    pub fn current(isolate: &mut Isolate) -> Result<&mut Simulator, SimError> {
        isolate.simulator()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn pc(&self) -> u32 {
        self.cpu.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.cpu.pc = pc;
    }

    pub fn register(&self, reg: u8) -> u32 {
        self.cpu.read_reg(reg)
    }

    pub fn set_register(&mut self, reg: u8, value: u32) {
        self.cpu.write_reg(reg, value)
    }

    pub fn icount(&self) -> u64 {
        self.cpu.icount
    }

    /// 栈区最低地址
    pub fn stack_limit(&self) -> u32 {
        self.stack.base_addr()
    }

    /// 复位时 sp 的值；其上保留下溢缓冲
    pub fn stack_top(&self) -> u32 {
        self.stack.base_addr() + self.stack_size + STACK_SIZE_BUFFER
    }

    pub fn break_pc(&self) -> Option<u32> {
        self.break_pc
    }

    /// 读取模拟器可见的内存（栈区或宿主内存）
    pub fn read_word(&mut self, mem: &mut dyn Memory, addr: u32) -> Result<u32, SimError> {
        let bus = AddressSpace::new(&mut self.stack, mem, &*self.illegal);
        bus.read(addr, crate::memory::AccessSize::Word, "read", self.cpu.pc)
    }

    fn debugger<'a>(&'a mut self, mem: &'a mut dyn Memory) -> Debugger<'a> {
        Debugger::new(self, mem)
    }

    /// 交互式打开调试器
    pub fn debug(&mut self, mem: &mut dyn Memory) -> Result<ShellExit, SimError> {
        self.debugger(mem).stop("debugger request", StopKind::Resumable)
    }

    /// 执行一条指令（含停止计数检查）
    pub fn step(&mut self, mem: &mut dyn Memory) -> Result<(), SimError> {
        self.cpu.icount += 1;
        let threshold = self.cpu.stop_threshold();
        if threshold != 0 && self.cpu.icount == threshold {
            let message = format!("stop_sim_at {threshold}");
            match self.debugger(mem).stop(&message, StopKind::Resumable)? {
                // shell 已经执行了当前指令
                ShellExit::Continued | ShellExit::Detached { stepped: true } => return Ok(()),
                ShellExit::Detached { stepped: false } => {}
            }
        }
        self.execute_one(mem)
    }

    /// 一直执行到 PC 到达 `END_SIMULATION_PC`
    pub fn execute(&mut self, mem: &mut dyn Memory) -> Result<(), SimError> {
        while self.cpu.pc != END_SIMULATION_PC {
            self.step(mem)?;
        }
        Ok(())
    }

    /// 执行当前 PC 处的指令，不计数；陷入时以终止状态打开调试器
    pub(crate) fn execute_one(&mut self, mem: &mut dyn Memory) -> Result<(), SimError> {
        match self.execute_instruction(mem) {
            Err(err) if err.is_trap() => {
                let message = err.to_string();
                self.debugger(mem).stop(&message, StopKind::Terminal)?;
                Err(err)
            }
            other => other,
        }
    }

    fn execute_instruction(&mut self, mem: &mut dyn Memory) -> Result<(), SimError> {
        let pc = self.cpu.pc;
        {
            let mut bus = AddressSpace::new(&mut self.stack, &mut *mem, &*self.illegal);
            let raw = bus.fetch(pc)?;
            let decoded = self.cpu.decode(raw);
            trace!(pc = format_args!("0x{pc:08x}"), raw = format_args!("0x{raw:08x}"), instr = ?decoded.instr, "exec");
            exu::execute(&mut self.cpu, &mut bus, decoded, pc)?;
        }
        if let Some(code) = self.cpu.pending_break.take() {
            self.on_break(mem, pc, code)?;
        }
        if std::mem::take(&mut self.cpu.stop_requested) {
            self.on_delay_slot_stop(mem)?;
        }
        self.cpu.pc = self.cpu.pc.wrapping_add(INSTR_SIZE);
        Ok(())
    }

    /// 停止计数落在延迟槽上：转移完成后、目标指令执行前停下
    fn on_delay_slot_stop(&mut self, mem: &mut dyn Memory) -> Result<(), SimError> {
        self.cpu.pc = self.cpu.pc.wrapping_add(INSTR_SIZE);
        let message = format!("stop_sim_at {}", self.cpu.stop_threshold());
        self.debugger(mem).stop(&message, StopKind::Resumable)?;
        self.cpu.pc = self.cpu.pc.wrapping_sub(INSTR_SIZE);
        Ok(())
    }

    /// BREAK 指令：进入调试器
    ///
    /// 硬编码的 BREAK 视为已执行，shell 从下一条指令继续；
    /// 地址断点处已恢复原指令，shell 从断点处继续。
    fn on_break(&mut self, mem: &mut dyn Memory, pc: u32, code: u32) -> Result<(), SimError> {
        let at_breakpoint = self.break_pc == Some(pc);
        let message = if at_breakpoint {
            format!("breakpoint at 0x{pc:08x}")
        } else {
            self.cpu.pc = pc.wrapping_add(INSTR_SIZE);
            format!("break {code} at 0x{pc:08x}")
        };
        self.debugger(mem).stop(&message, StopKind::Resumable)?;
        // 抵消调用方随后的 +4
        self.cpu.pc = self.cpu.pc.wrapping_sub(INSTR_SIZE);
        Ok(())
    }

    /// 模拟一次函数调用，返回 (v1 << 32) | v0
    ///
    /// callee-saved 寄存器在调用前被写入标记值（当前指令计数），返回后必须保持不变。
    /// 新建模拟器的第一次调用标记为 0，与寄存器初值相同，此时被写成 0 的情况无法发现。
    pub fn call(&mut self, mem: &mut dyn Memory, entry: u32, args: [u32; 4]) -> Result<i64, SimError> {
        let sp_before_call = self.cpu.read_reg(SP);
        self.cpu.stop_requested = false;

        for (reg, value) in [A0, A1, A2, A3].into_iter().zip(args) {
            self.cpu.write_reg(reg, value);
        }

        let mut stack_pointer = sp_before_call;
        if self.frame_alignment > 0 {
            stack_pointer -= stack_pointer % self.frame_alignment;
        }
        self.cpu.write_reg(SP, stack_pointer);

        self.cpu.pc = entry;
        self.cpu.write_reg(RA, END_SIMULATION_PC);

        let saved = CALLEE_SAVED.map(|reg| self.cpu.read_reg(reg));
        let marker = self.cpu.icount as u32;
        for reg in CALLEE_SAVED {
            self.cpu.write_reg(reg, marker);
        }

        debug!(entry = format_args!("0x{entry:08x}"), ?args, sp = format_args!("0x{stack_pointer:08x}"), "simulated call");
        if let Err(err) = self.execute(mem) {
            error!(pc = format_args!("0x{:08x}", self.cpu.pc), icount = self.cpu.icount, %err, "simulated call aborted");
            return Err(err);
        }

        let clobbered = CALLEE_SAVED
            .into_iter()
            .map(|reg| (reg, self.cpu.read_reg(reg)))
            .find(|&(_, found)| found != marker);
        for (reg, value) in CALLEE_SAVED.into_iter().zip(saved) {
            self.cpu.write_reg(reg, value);
        }
        self.cpu.write_reg(SP, sp_before_call);
        if let Some((reg, found)) = clobbered {
            return Err(SimError::CalleeSavedClobbered {
                reg: cpu_reg_name(reg),
                expected: marker,
                found,
            });
        }

        let result = (((self.cpu.read_reg(V1) as u64) << 32) | self.cpu.read_reg(V0) as u64) as i64;
        debug!(result, icount = self.cpu.icount, "simulated call returned");
        Ok(result)
    }
}

#[cfg(test)]
mod tests;
