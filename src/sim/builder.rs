//! 模拟器配置器
//!
//! 统一配置解码器、浮点单元、栈区、调试器与宿主钩子。
//!
//! # 示例
//!
//! ```
//! use archsim::sim::{SimulatorBuilder, END_SIMULATION_PC};
//!
//! let sim = SimulatorBuilder::new()
//!     .with_fpu()
//!     .with_stack_size(64 * 1024)
//!     .build()
//!     .expect("配置有效");
//! assert_eq!(sim.pc(), END_SIMULATION_PC);
//! ```

use std::sync::Arc;

use tracing::debug;

use super::bus::{default_illegal_address, IllegalAddressFn};
use super::status::Status;
use super::{
    Cpu, DebugConsole, NativeDebugHook, SimError, Simulator, DEFAULT_STACK_BASE, DEFAULT_STACK_SIZE,
    END_SIMULATION_PC, FRAME_ALIGNMENT, STACK_SIZE_BUFFER, STACK_UNDERFLOW_SIZE,
};
use crate::isa::regs::{RA, SP};
use crate::isa::{ConflictInfo, Disassembler, InstrDecoder, InstrDef, IsaConfig, IsaExtension, MipsDisassembler};
use crate::isolate::HeapInspector;
use crate::memory::FlatMemory;

/// 模拟器构建器
///
/// 默认：整数指令集、无 FPU、256 KiB 栈、8 字节帧对齐、
/// 低 64 KiB 为非法地址、调试器脱离（无输入）。
pub struct SimulatorBuilder {
    isa_config: IsaConfig,
    enable_fpu: bool,
    stack_size: u32,
    stack_base: u32,
    frame_alignment: u32,
    stop_sim_at: Option<u64>,
    illegal: IllegalAddressFn,
    console: DebugConsole,
    disassembler: Option<Arc<dyn Disassembler>>,
    heap: Option<Arc<dyn HeapInspector>>,
    native_debug_hook: Option<NativeDebugHook>,
}

impl SimulatorBuilder {
    pub fn new() -> Self {
        Self {
            isa_config: IsaConfig::new(),
            enable_fpu: false,
            stack_size: DEFAULT_STACK_SIZE,
            stack_base: DEFAULT_STACK_BASE,
            frame_alignment: FRAME_ALIGNMENT,
            stop_sim_at: None,
            illegal: default_illegal_address(),
            console: DebugConsole::detached(),
            disassembler: None,
            heap: None,
            native_debug_hook: None,
        }
    }

    /// 启用 COP1（双精度浮点）
    pub fn with_fpu(mut self) -> Self {
        self.enable_fpu = true;
        self.isa_config = self.isa_config.with_fpu();
        self
    }

    /// 添加自定义解码器
    pub fn with_custom_decoder(
        mut self,
        extension: IsaExtension,
        decoder: Arc<dyn InstrDecoder>,
        defs: &'static [InstrDef],
    ) -> Self {
        self.isa_config = self.isa_config.with_custom_decoder(extension, decoder, defs);
        self
    }

    /// 可用栈大小，不含溢出缓冲
    pub fn with_stack_size(mut self, size: u32) -> Self {
        self.stack_size = size;
        self
    }

    pub fn with_stack_base(mut self, base: u32) -> Self {
        self.stack_base = base;
        self
    }

    /// 调用入口处 sp 向下对齐的边界，必须是 2 的幂
    pub fn with_frame_alignment(mut self, alignment: u32) -> Self {
        self.frame_alignment = alignment;
        self
    }

    /// 覆盖进程级的 `stop_sim_at`
    pub fn with_stop_sim_at(mut self, count: u64) -> Self {
        self.stop_sim_at = Some(count);
        self
    }

    pub fn with_illegal_address(mut self, illegal: IllegalAddressFn) -> Self {
        self.illegal = illegal;
        self
    }

    pub fn with_console(mut self, console: DebugConsole) -> Self {
        self.console = console;
        self
    }

    pub fn with_disassembler(mut self, disassembler: Arc<dyn Disassembler>) -> Self {
        self.disassembler = Some(disassembler);
        self
    }

    /// `printobject` 使用的堆查询
    pub fn with_heap_inspector(mut self, heap: Arc<dyn HeapInspector>) -> Self {
        self.heap = Some(heap);
        self
    }

    /// `gdb` 命令调用的钩子
    pub fn with_native_debug_hook(mut self, hook: NativeDebugHook) -> Self {
        self.native_debug_hook = Some(hook);
        self
    }

    /// 检测配置中的指令冲突
    pub fn detect_conflicts(&self) -> Vec<ConflictInfo> {
        self.isa_config.detect_conflicts()
    }

    /// 构建模拟器
    ///
    /// 返回 `Err` 如果检测到指令冲突或栈参数无效
    pub fn build(self) -> Result<Simulator, SimError> {
        // 1. 校验栈参数
        if !self.frame_alignment.is_power_of_two() {
            return Err(SimError::InvalidConfig("frame alignment must be a power of two"));
        }
        if self.stack_size == 0 || !self.stack_size.is_multiple_of(self.frame_alignment.max(4)) {
            return Err(SimError::InvalidConfig("stack size must be a non-zero multiple of the frame alignment"));
        }
        let region = self
            .stack_size
            .checked_add(STACK_SIZE_BUFFER + STACK_UNDERFLOW_SIZE)
            .filter(|len| self.stack_base.checked_add(*len).is_some())
            .ok_or(SimError::InvalidConfig("stack region exceeds the address space"))?;
        if (self.illegal)(self.stack_base) {
            return Err(SimError::InvalidConfig("stack base lies in the illegal address range"));
        }

        // 2. 构建解码器
        let decoder = Arc::new(self.isa_config.build()?);

        // 3. 构建架构状态
        let mut status = Status::new();
        if self.enable_fpu {
            status.enable_fp();
        }

        // 4. 创建模拟器；pc 与 ra 指向结束哨兵
        let mut cpu = Cpu::new(status, Arc::clone(&decoder), self.stop_sim_at);
        let stack_top = self.stack_base + self.stack_size + STACK_SIZE_BUFFER;
        cpu.write_reg(SP, stack_top);
        cpu.write_reg(RA, END_SIMULATION_PC);
        cpu.set_pc(END_SIMULATION_PC);

        let disassembler = self
            .disassembler
            .unwrap_or_else(|| Arc::new(MipsDisassembler::new(decoder)));

        debug!(
            stack_base = format_args!("0x{:08x}", self.stack_base),
            stack_top = format_args!("0x{stack_top:08x}"),
            fpu = self.enable_fpu,
            "simulator created"
        );

        Ok(Simulator {
            cpu,
            stack: FlatMemory::new(region as usize, self.stack_base),
            stack_size: self.stack_size,
            frame_alignment: self.frame_alignment,
            illegal: self.illegal,
            break_pc: None,
            break_instr: 0,
            shell_depth: 0,
            console: self.console,
            disassembler,
            heap: self.heap,
            native_debug_hook: self.native_debug_hook,
        })
    }
}

impl Default for SimulatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build() {
        let sim = SimulatorBuilder::new().build().unwrap();
        assert_eq!(sim.pc(), END_SIMULATION_PC);
        assert_eq!(sim.register(RA), END_SIMULATION_PC);
        assert_eq!(sim.register(SP), sim.stack_top());
        assert_eq!(sim.stack_top(), DEFAULT_STACK_BASE + DEFAULT_STACK_SIZE + STACK_SIZE_BUFFER);
        assert!(!sim.cpu().has_fpu());
    }

    #[test]
    fn test_fpu_enabled() {
        let sim = SimulatorBuilder::new().with_fpu().build().unwrap();
        assert!(sim.cpu().has_fpu());
        assert_eq!(sim.cpu().read_fp(31), Some(0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            SimulatorBuilder::new().with_frame_alignment(12).build(),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimulatorBuilder::new().with_stack_size(0).build(),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimulatorBuilder::new().with_stack_base(0xFFFF_0000).build(),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimulatorBuilder::new().with_stack_base(0x1000).build(),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_no_conflicts_by_default() {
        assert!(SimulatorBuilder::new().with_fpu().detect_conflicts().is_empty());
    }
}
