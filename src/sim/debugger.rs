//! 行命令调试器
//!
//! 在断点、BREAK 指令、停止计数或陷入处打开。命令从 `DebugConsole` 读取，
//! 以反斜杠结尾的行与下一行拼接。
//!
//! 唯一的地址断点只在 shell 退出时写入内存（`redo`），进入时恢复原指令（`undo`），
//! 因此 shell 内看到的总是原始代码。

use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::bus::AddressSpace;
use super::{SimError, Simulator, END_SIMULATION_PC, INSTR_SIZE};
use crate::isa::regs::{cpu_reg_name, lookup_cpu_register, lookup_fpu_register, NUM_CPU_REGS, SP};
use crate::isa::{MipsInstr, BREAK_INSTR, NOP_INSTR};
use crate::memory::Memory;

const PROMPT: &str = "sim> ";
const DEFAULT_DISASM_COUNT: u32 = 10;
const DEFAULT_MEM_WORDS: u32 = 10;

const HELP: &str = "\
c/cont
  continue execution (alias 'c')
si/stepi
  step one instruction (alias 'si')
p/print <register>
p/print <value>
p/print *<address>
  print register or value (alias 'p'); 'print all' prints all registers
pf/printfloat <fpu register>
pf/printfloat *<address>
  print a double register pair, a single register or a float in memory
po/printobject <register>
po/printobject *<address>
  print an object from the heap
mem <address> [<words>]
stack [<words>]
  dump memory words
di/disasm [<instructions>]
di/disasm [<address/register>]
di/disasm [[<address/register>] <instructions>]
  disassemble code, default is 10 instructions from pc
dump
  print the full register state
gdb
  enter the native debugger
break <address>
  set the breakpoint
del/delete
  delete the breakpoint
unstop
  turn off the stop instruction that caused this stop
h/help
  print this help
q/quit
  quit the simulation";

/// shell 的退出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// `cont`：当前指令已经由 shell 执行
    Continued,
    /// 输入结束；`stepped` 表示 shell 是否执行过指令
    Detached { stepped: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopKind {
    Resumable,
    /// 陷入之后不能继续执行
    Terminal,
}

/// 调试器的输入输出
pub struct DebugConsole {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
}

impl DebugConsole {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self { input, output }
    }

    /// 交互终端
    pub fn stdio() -> Self {
        Self::new(Box::new(BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    /// 无输入、丢弃输出：每次停止立即脱离
    pub fn detached() -> Self {
        Self::new(Box::new(io::empty()), Box::new(io::sink()))
    }

    /// 预置命令脚本，输出收集到返回的缓冲区
    pub fn scripted(script: &str) -> (Self, SharedOutput) {
        let output = SharedOutput::default();
        let console = Self::new(
            Box::new(Cursor::new(script.as_bytes().to_vec())),
            Box::new(output.clone()),
        );
        (console, output)
    }

    /// 读取一条命令；反斜杠续行。输入结束返回 None
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut command = String::new();
        let mut got_any = false;
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            got_any = true;
            let line = line.trim_end_matches(['\n', '\r']);
            match line.strip_suffix('\\') {
                Some(head) => command.push_str(head),
                None => {
                    command.push_str(line);
                    return Ok(Some(command));
                }
            }
        }
        Ok(got_any.then_some(command))
    }
}

impl Default for DebugConsole {
    fn default() -> Self {
        Self::detached()
    }
}

impl Write for DebugConsole {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// 可共享的输出缓冲
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.0.lock().map_err(|_| io::Error::other("output buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 解析数值：`0x` 十六进制，其次十进制（可为负），最后尝试无前缀十六进制
pub fn parse_literal(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    text.parse::<u32>()
        .ok()
        .or_else(|| text.parse::<i32>().ok().map(|v| v as u32))
        .or_else(|| u32::from_str_radix(text, 16).ok())
}

/// `%.{precision}g`
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_fraction_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// 绑定到一次停止的调试器
pub(crate) struct Debugger<'a> {
    sim: &'a mut Simulator,
    mem: &'a mut dyn Memory,
}

macro_rules! say {
    ($dbg:expr, $($arg:tt)*) => {
        writeln!($dbg.sim.console, $($arg)*)?
    };
}

impl<'a> Debugger<'a> {
    pub(crate) fn new(sim: &'a mut Simulator, mem: &'a mut dyn Memory) -> Self {
        Self { sim, mem }
    }

    fn bus(&mut self) -> AddressSpace<'_> {
        AddressSpace::new(&mut self.sim.stack, &mut *self.mem, &*self.sim.illegal)
    }

    /// 报告停止原因并运行 shell
    pub(crate) fn stop(&mut self, message: &str, kind: StopKind) -> Result<ShellExit, SimError> {
        warn!(pc = format_args!("0x{:08x}", self.sim.cpu.pc), reason = message, ?kind, "debugger entered");
        say!(self, "Simulator hit {}", message);

        let outermost = self.sim.shell_depth == 0;
        if outermost {
            self.undo_breakpoint();
        }
        self.sim.shell_depth += 1;
        let result = self.shell(kind);
        self.sim.shell_depth -= 1;
        if outermost {
            match result {
                Ok(ShellExit::Continued) => self.redo_breakpoint(),
                _ => self.sim.break_pc = None,
            }
        }
        result
    }

    fn shell(&mut self, kind: StopKind) -> Result<ShellExit, SimError> {
        let mut stepped = false;
        self.print_current()?;
        loop {
            let Some(line) = self.sim.console.read_line(PROMPT)? else {
                return Ok(ShellExit::Detached { stepped });
            };
            let args: Vec<&str> = line.split_whitespace().collect();
            let Some((&cmd, args)) = args.split_first() else {
                continue;
            };

            match cmd {
                "si" | "stepi" => {
                    if self.can_resume(kind, "Stepping disabled.")? {
                        self.sim.execute_one(&mut *self.mem)?;
                        stepped = true;
                        self.print_current()?;
                    }
                }
                "c" | "cont" => {
                    // 调用已返回到结束哨兵，没有可执行的指令
                    if self.sim.cpu.pc == END_SIMULATION_PC {
                        return Ok(ShellExit::Continued);
                    }
                    if self.can_resume(kind, "Cannot continue.")? {
                        self.sim.execute_one(&mut *self.mem)?;
                        return Ok(ShellExit::Continued);
                    }
                }
                "p" | "print" => self.cmd_print(args)?,
                "pf" | "printfloat" => self.cmd_print_float(args)?,
                "po" | "printobject" => self.cmd_print_object(args)?,
                "mem" => self.cmd_mem(args)?,
                "stack" => self.cmd_stack(args)?,
                "di" | "disasm" => self.cmd_disasm(args)?,
                "dump" => self.sim.cpu.dump_regs(&mut self.sim.console)?,
                "gdb" => {
                    say!(self, "relinquishing control to gdb");
                    if let Some(hook) = self.sim.native_debug_hook.clone() {
                        hook();
                    }
                    say!(self, "regaining control from gdb");
                }
                "break" => self.cmd_break(args)?,
                "del" | "delete" => self.sim.break_pc = None,
                "unstop" => self.cmd_unstop()?,
                "h" | "help" => say!(self, "{}", HELP),
                "q" | "quit" | "exit" => {
                    say!(self, "Quitting");
                    return Err(SimError::Quit);
                }
                _ => say!(self, "Unknown command: {}", cmd),
            }
        }
    }

    /// 陷入后或当前指令无法解码时拒绝执行
    fn can_resume(&mut self, kind: StopKind, refusal: &str) -> Result<bool, SimError> {
        if kind == StopKind::Terminal {
            say!(self, "Execution cannot resume after this trap.");
            return Ok(false);
        }
        let pc = self.sim.cpu.pc;
        let decodable = self
            .read_word(pc)
            .is_some_and(|raw| !self.sim.cpu.decode(raw).is_illegal());
        if !decodable {
            say!(self, "Instruction could not be decoded. {}", refusal);
        }
        Ok(decodable)
    }

    fn print_current(&mut self) -> Result<(), SimError> {
        let pc = self.sim.cpu.pc;
        if self.read_word(pc).is_some() {
            self.disassemble(pc, pc.wrapping_add(INSTR_SIZE));
        } else {
            say!(self, "0x{:08x}  <not readable>", pc);
        }
        Ok(())
    }

    fn disassemble(&mut self, start: u32, end: u32) -> bool {
        let sim = &mut *self.sim;
        let bus = AddressSpace::new(&mut sim.stack, &mut *self.mem, &*sim.illegal);
        sim.disassembler.disassemble(&bus, start, end, &mut sim.console)
    }

    /// 经过非法地址判定的原始读
    fn read_word(&mut self, addr: u32) -> Option<u32> {
        let bus = self.bus();
        if bus.is_illegal(addr) || !addr.is_multiple_of(4) {
            return None;
        }
        bus.load32(addr).ok()
    }

    fn write_word(&mut self, addr: u32, value: u32) -> bool {
        let mut bus = self.bus();
        !bus.is_illegal(addr) && bus.store32(addr, value).is_ok()
    }

    /// 寄存器名、`pc` 或数值
    fn value_of(&self, arg: &str) -> Option<u32> {
        if arg == "pc" {
            return Some(self.sim.cpu.pc);
        }
        if let Some(reg) = lookup_cpu_register(arg) {
            return Some(self.sim.cpu.read_reg(reg));
        }
        parse_literal(arg)
    }

    fn cmd_print(&mut self, args: &[&str]) -> Result<(), SimError> {
        let [arg] = args else {
            say!(self, "print <reg or value or *addr>");
            return Ok(());
        };
        if *arg == "all" {
            for reg in 0..NUM_CPU_REGS as u8 {
                let value = self.sim.cpu.read_reg(reg);
                say!(self, "{:>3}: 0x{:08x} {:>10}", cpu_reg_name(reg), value, value as i32);
            }
            say!(self, " pc: 0x{:08x}", self.sim.cpu.pc);
            say!(self, " hi: 0x{:08x}  lo: 0x{:08x}", self.sim.cpu.hi(), self.sim.cpu.lo());
            return Ok(());
        }
        let value = match arg.strip_prefix('*') {
            Some(addr) => self.value_of(addr).and_then(|addr| self.read_word(addr)),
            None => self.value_of(arg),
        };
        match value {
            Some(v) => say!(self, "{}: {} 0x{:x}", arg, v, v),
            None => say!(self, "{} unrecognized", arg),
        }
        Ok(())
    }

    fn cmd_print_float(&mut self, args: &[&str]) -> Result<(), SimError> {
        let [arg] = args else {
            say!(self, "printfloat <dreg or *addr>");
            return Ok(());
        };
        let value = match arg.strip_prefix('*') {
            Some(addr) => self
                .value_of(addr)
                .and_then(|addr| self.read_word(addr))
                .map(|bits| f32::from_bits(bits) as f64),
            None => lookup_fpu_register(arg).and_then(|reg| {
                if reg % 2 == 0 {
                    self.sim.cpu.read_double(reg)
                } else {
                    self.sim.cpu.read_fp(reg).map(|bits| f32::from_bits(bits) as f64)
                }
            }),
        };
        match value {
            Some(v) => {
                let bits = v.to_bits();
                say!(self, "{}: {} 0x{:x} {}", arg, bits, bits, format_general(v, 8));
            }
            None => say!(self, "{} unrecognized", arg),
        }
        Ok(())
    }

    fn cmd_print_object(&mut self, args: &[&str]) -> Result<(), SimError> {
        let [arg] = args else {
            say!(self, "printobject <*reg or *addr>");
            return Ok(());
        };
        let name = arg.strip_prefix('*').unwrap_or(*arg);
        let Some(value) = self.value_of(name) else {
            say!(self, "{} unrecognized", arg);
            return Ok(());
        };
        let Some(heap) = self.sim.heap.clone().filter(|heap| heap.contains(value)) else {
            say!(self, "0x{:x} is not an object reference", value);
            return Ok(());
        };
        say!(self, "{}: ", arg);
        let description = heap.describe(&self.bus(), value);
        if let Some(text) = description {
            say!(self, "{}", text);
        }
        Ok(())
    }

    fn dump_words(&mut self, start: u32, words: u32) -> Result<(), SimError> {
        for i in 0..words {
            let addr = start.wrapping_add(i * INSTR_SIZE);
            match self.read_word(addr) {
                Some(value) => say!(self, "0x{:08x}:  0x{:08x} {:>10}", addr, value, value as i32),
                None => {
                    say!(self, "0x{:08x}:  <not readable>", addr);
                    break;
                }
            }
        }
        Ok(())
    }

    fn cmd_mem(&mut self, args: &[&str]) -> Result<(), SimError> {
        let (start, words) = match args {
            [addr] => (self.value_of(addr), Some(DEFAULT_MEM_WORDS)),
            [addr, count] => (self.value_of(addr), self.value_of(count)),
            _ => {
                say!(self, "mem <address> [<words>]");
                return Ok(());
            }
        };
        match (start, words) {
            (Some(start), Some(words)) => self.dump_words(start, words),
            _ => {
                say!(self, "{} unrecognized", args.join(" "));
                Ok(())
            }
        }
    }

    fn cmd_stack(&mut self, args: &[&str]) -> Result<(), SimError> {
        let words = match args {
            [] => Some(DEFAULT_MEM_WORDS),
            [count] => self.value_of(count),
            _ => None,
        };
        let Some(words) = words else {
            say!(self, "stack [<words>]");
            return Ok(());
        };
        let sp = self.sim.cpu.read_reg(SP);
        self.dump_words(sp, words)
    }

    fn cmd_disasm(&mut self, args: &[&str]) -> Result<(), SimError> {
        let pc = self.sim.cpu.pc;
        let (start, count) = match args {
            [] => (Some(pc), Some(DEFAULT_DISASM_COUNT)),
            // 寄存器名或 0x 开头视为地址，否则是指令条数
            [arg] if lookup_cpu_register(arg).is_some() || *arg == "pc" || arg.starts_with("0x") => {
                (self.value_of(arg), Some(DEFAULT_DISASM_COUNT))
            }
            [count] => (Some(pc), self.value_of(count)),
            [addr, count] => (self.value_of(addr), self.value_of(count)),
            _ => (None, None),
        };
        let (Some(mut start), Some(count)) = (start, count) else {
            say!(self, "disasm [[<address/register>] <instructions>]");
            return Ok(());
        };
        if self.bus().is_illegal(start) {
            say!(self, "First argument yields invalid address: 0x{:x}", start);
            say!(self, "Using PC instead");
            start = pc;
        }
        let end = start.saturating_add(count.saturating_mul(INSTR_SIZE));
        self.disassemble(start, end);
        Ok(())
    }

    fn cmd_break(&mut self, args: &[&str]) -> Result<(), SimError> {
        let [arg] = args else {
            say!(self, "break <addr>");
            return Ok(());
        };
        let Some(addr) = self.value_of(arg) else {
            say!(self, "{} unrecognized", arg);
            return Ok(());
        };
        if self.is_delay_slot(addr) {
            say!(self, "0x{:08x} is a delay slot", addr);
            say!(self, "setting breakpoint failed");
            return Ok(());
        }
        if !self.set_breakpoint(addr) {
            say!(self, "setting breakpoint failed");
        }
        Ok(())
    }

    /// 前一条指令是控制转移时，`addr` 是它的延迟槽
    fn is_delay_slot(&mut self, addr: u32) -> bool {
        self.read_word(addr.wrapping_sub(INSTR_SIZE))
            .is_some_and(|raw| self.sim.cpu.decode(raw).instr.is_control_transfer())
    }

    /// 只记录地址；shell 退出时写入 BREAK
    fn set_breakpoint(&mut self, addr: u32) -> bool {
        if self.sim.break_pc.is_some() || self.read_word(addr).is_none() {
            return false;
        }
        self.sim.break_pc = Some(addr);
        true
    }

    /// 关闭触发本次停止的 BREAK（位于 pc - 4）
    fn cmd_unstop(&mut self) -> Result<(), SimError> {
        let stop_pc = self.sim.cpu.pc.wrapping_sub(INSTR_SIZE);
        let is_break = self
            .read_word(stop_pc)
            .is_some_and(|raw| matches!(self.sim.cpu.decode(raw).instr, MipsInstr::Break { .. }));
        if is_break && self.write_word(stop_pc, NOP_INSTR) {
            debug!(pc = format_args!("0x{stop_pc:08x}"), "break instruction disabled");
        } else {
            say!(self, "Not at debugger stop.");
        }
        Ok(())
    }

    fn undo_breakpoint(&mut self) {
        if let Some(addr) = self.sim.break_pc {
            let original = self.sim.break_instr;
            self.write_word(addr, original);
        }
    }

    fn redo_breakpoint(&mut self) {
        let Some(addr) = self.sim.break_pc else {
            return;
        };
        match self.read_word(addr) {
            Some(original) if self.write_word(addr, BREAK_INSTR) => self.sim.break_instr = original,
            _ => self.sim.break_pc = None,
        }
    }
}
