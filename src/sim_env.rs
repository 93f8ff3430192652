//! 仿真环境初始化模块
//!
//! 本模块负责：
//! - 解析 MIPS32 小端 ELF 或原始二进制
//! - 将程序加载到宿主内存
//! - 构建 isolate 及其模拟器配置
//! - 以模拟调用的方式运行入口函数
//!
//! # 示例
//!
//! ```no_run
//! use archsim::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::new()
//!     .with_elf_path("program.elf")
//!     .with_memory(0x0040_0000, 1024 * 1024)
//!     .with_args([1, 2, 0, 0]);
//!
//! let mut env = SimEnv::from_config(config).expect("Failed to create sim env");
//! let result = env.run().expect("simulated call failed");
//! println!("v0:v1 = 0x{result:016x}");
//! ```

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use elf::abi::{EM_MIPS, PF_W, PF_X, PT_LOAD};
use elf::endian::AnyEndian;
use elf::ElfBytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::isolate::{HeapRegion, Isolate};
use crate::memory::{FlatMemory, MemError};
use crate::sim::{DebugConsole, SimError, SimulatorBuilder, DEFAULT_STACK_SIZE};

/// 仿真环境错误
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("ELF parse error: {0}")]
    ElfParse(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("memory error: {0}")]
    Memory(#[from] MemError),
    #[error("memory region '{region}' (0x{base:08x}..0x{end:08x}) cannot fit range 0x{start:08x}..0x{stop:08x}")]
    OutOfRegion { region: String, base: u32, end: u32, start: u32, stop: u32 },
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// 内存区域配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    /// 区域名称（用于诊断）
    pub name: String,
    pub base: u32,
    /// 大小（字节）
    pub size: usize,
}

impl Default for MemoryRegion {
    fn default() -> Self {
        Self {
            name: "ram".to_string(),
            base: 0x0040_0000,
            size: 1024 * 1024,
        }
    }
}

/// 仿真配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub elf_path: Option<String>,
    pub bin_path: Option<String>,
    /// 二进制加载地址（用于 bin_path）
    pub bin_load_addr: u32,
    /// 入口地址覆盖
    pub entry_pc: Option<u32>,
    /// 按符号名选取入口（仅 ELF）
    pub entry_symbol: Option<String>,
    pub memory: MemoryRegion,
    pub stack_size: u32,
    /// 传给入口函数的 a0..a3
    pub args: [u32; 4],
    pub stop_sim_at: Option<u64>,
    pub fpu: bool,
    /// 调试器使用标准输入输出
    pub interactive: bool,
    /// `printobject` 识别为堆的区间
    pub heap: Option<HeapRegion>,
    pub verbose: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            elf_path: None,
            bin_path: None,
            bin_load_addr: 0,
            entry_pc: None,
            entry_symbol: None,
            memory: MemoryRegion::default(),
            stack_size: DEFAULT_STACK_SIZE,
            args: [0; 4],
            stop_sim_at: None,
            fpu: false,
            interactive: false,
            heap: None,
            verbose: false,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elf_path(mut self, path: impl Into<String>) -> Self {
        self.elf_path = Some(path.into());
        self
    }

    pub fn with_bin_path(mut self, path: impl Into<String>, load_addr: u32) -> Self {
        self.bin_path = Some(path.into());
        self.bin_load_addr = load_addr;
        self
    }

    pub fn with_entry_pc(mut self, pc: u32) -> Self {
        self.entry_pc = Some(pc);
        self
    }

    pub fn with_entry_symbol(mut self, name: impl Into<String>) -> Self {
        self.entry_symbol = Some(name.into());
        self
    }

    /// 设置宿主内存区域
    pub fn with_memory(mut self, base: u32, size: usize) -> Self {
        self.memory.base = base;
        self.memory.size = size;
        self
    }

    pub fn with_stack_size(mut self, size: u32) -> Self {
        self.stack_size = size;
        self
    }

    pub fn with_args(mut self, args: [u32; 4]) -> Self {
        self.args = args;
        self
    }

    pub fn with_stop_sim_at(mut self, count: u64) -> Self {
        self.stop_sim_at = Some(count);
        self
    }

    pub fn with_fpu(mut self, enable: bool) -> Self {
        self.fpu = enable;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_heap(mut self, heap: HeapRegion) -> Self {
        self.heap = Some(heap);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 本配置对应的模拟器构建器
    fn simulator_builder(&self) -> SimulatorBuilder {
        let mut builder = SimulatorBuilder::new().with_stack_size(self.stack_size);
        if self.fpu {
            builder = builder.with_fpu();
        }
        if let Some(count) = self.stop_sim_at {
            builder = builder.with_stop_sim_at(count);
        }
        if self.interactive {
            builder = builder.with_console(DebugConsole::stdio());
        }
        builder
    }
}

/// ELF 程序段信息
#[derive(Debug, Clone)]
pub struct ElfSegment {
    pub vaddr: u32,
    pub file_size: usize,
    pub mem_size: usize,
    pub data: Vec<u8>,
    pub executable: bool,
    pub writable: bool,
}

/// ELF 符号信息
#[derive(Debug, Clone)]
pub struct ElfSymbol {
    pub name: String,
    pub addr: u32,
    pub size: u32,
}

/// ELF 文件解析结果
#[derive(Debug, Clone)]
pub struct ElfInfo {
    pub entry: u32,
    /// PT_LOAD 段
    pub segments: Vec<ElfSegment>,
    /// 有名字且有地址的符号
    pub symbols: Vec<ElfSymbol>,
}

impl ElfInfo {
    /// 解析 ELF 文件
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse_bytes(&data)
    }

    /// 从字节数组解析 ELF
    ///
    /// 只接受 32 位小端 `EM_MIPS` 文件
    pub fn parse_bytes(data: &[u8]) -> Result<Self, EnvError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| EnvError::ElfParse(format!("failed to parse ELF: {e}")))?;
        let header = &elf_file.ehdr;

        if header.e_machine != EM_MIPS {
            return Err(EnvError::ElfParse(format!(
                "not a MIPS ELF (machine type: 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_MIPS
            )));
        }
        if header.class != elf::file::Class::ELF32 {
            return Err(EnvError::ElfParse("only 32-bit ELF is supported".into()));
        }
        if header.endianness != AnyEndian::Little {
            return Err(EnvError::ElfParse("only little-endian ELF is supported".into()));
        }

        let mut segments = Vec::new();
        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
                let data = elf_file
                    .segment_data(&phdr)
                    .map_err(|e| EnvError::ElfParse(format!("failed to read segment data: {e}")))?;
                segments.push(ElfSegment {
                    vaddr: phdr.p_vaddr as u32,
                    file_size: phdr.p_filesz as usize,
                    mem_size: phdr.p_memsz as usize,
                    data: data.to_vec(),
                    executable: phdr.p_flags & PF_X != 0,
                    writable: phdr.p_flags & PF_W != 0,
                });
            }
        }

        let mut symbols = Vec::new();
        if let Ok(Some((symtab, strtab))) = elf_file.symbol_table() {
            for sym in symtab.iter().filter(|s| s.st_value != 0) {
                let Ok(name) = strtab.get(sym.st_name as usize) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                symbols.push(ElfSymbol {
                    name: name.to_string(),
                    addr: sym.st_value as u32,
                    size: sym.st_size as u32,
                });
            }
        }

        Ok(ElfInfo {
            entry: header.e_entry as u32,
            segments,
            symbols,
        })
    }

    /// 查找符号地址
    pub fn find_symbol(&self, name: &str) -> Option<u32> {
        self.symbols.iter().find(|s| s.name == name).map(|s| s.addr)
    }
}

fn range_end(addr: u32, len: usize) -> Option<u32> {
    u32::try_from(len).ok().and_then(|len| addr.checked_add(len))
}

fn ensure_range(region: &MemoryRegion, addr: u32, len: usize) -> Result<(), EnvError> {
    let region_end = range_end(region.base, region.size)
        .ok_or_else(|| EnvError::Config(format!("memory region '{}' exceeds the address space", region.name)))?;
    let target_end = range_end(addr, len).unwrap_or(u32::MAX);
    if addr < region.base || target_end > region_end {
        return Err(EnvError::OutOfRegion {
            region: region.name.clone(),
            base: region.base,
            end: region_end,
            start: addr,
            stop: target_end,
        });
    }
    Ok(())
}

fn load_segments_into_memory(
    memory: &mut FlatMemory,
    region: &MemoryRegion,
    segments: &[ElfSegment],
) -> Result<(), EnvError> {
    for seg in segments {
        if seg.mem_size == 0 {
            continue;
        }
        ensure_range(region, seg.vaddr, seg.mem_size)?;
        memory.write_bytes(seg.vaddr, &seg.data)?;

        // bss 清零
        if seg.mem_size > seg.file_size {
            memory.fill(seg.vaddr + seg.file_size as u32, seg.mem_size - seg.file_size, 0)?;
        }
        debug!(
            vaddr = format_args!("0x{:08x}", seg.vaddr),
            size = seg.mem_size,
            exec = seg.executable,
            write = seg.writable,
            "segment loaded"
        );
    }
    Ok(())
}

/// 仿真环境
///
/// 封装 isolate（宿主内存 + 模拟器）与入口地址
pub struct SimEnv {
    isolate: Isolate,
    entry: u32,
    config: SimConfig,
}

impl SimEnv {
    /// 从配置创建仿真环境
    ///
    /// 入口优先级：`entry_pc`、`entry_symbol`、ELF 入口、二进制加载地址、内存基址
    pub fn from_config(config: SimConfig) -> Result<Self, EnvError> {
        if config.memory.size == 0 {
            return Err(EnvError::Config("memory size must be non-zero".into()));
        }
        let mut memory = FlatMemory::new(config.memory.size, config.memory.base);
        let mut entry = config.memory.base;

        if let Some(ref elf_path) = config.elf_path {
            let elf = ElfInfo::parse(elf_path)?;
            load_segments_into_memory(&mut memory, &config.memory, &elf.segments)?;
            entry = elf.entry;
            if let Some(ref name) = config.entry_symbol {
                entry = elf
                    .find_symbol(name)
                    .ok_or_else(|| EnvError::Config(format!("entry symbol '{name}' not found")))?;
            }
            info!(
                path = %elf_path,
                entry = format_args!("0x{entry:08x}"),
                segments = elf.segments.len(),
                "ELF loaded"
            );
        } else if let Some(ref bin_path) = config.bin_path {
            let data = std::fs::read(bin_path)?;
            ensure_range(&config.memory, config.bin_load_addr, data.len())?;
            memory.write_bytes(config.bin_load_addr, &data)?;
            entry = config.bin_load_addr;
            info!(
                path = %bin_path,
                load_addr = format_args!("0x{:08x}", config.bin_load_addr),
                size = data.len(),
                "binary loaded"
            );
        } else if config.entry_symbol.is_some() {
            return Err(EnvError::Config("entry symbol requires an ELF file".into()));
        }

        if let Some(pc) = config.entry_pc {
            entry = pc;
        }
        Self::assemble(config, memory, entry)
    }

    /// 以指令字直接构建环境，常用于测试与演示
    pub fn from_words(config: SimConfig, load_addr: u32, words: &[u32]) -> Result<Self, EnvError> {
        ensure_range(&config.memory, load_addr, words.len() * 4)?;
        let mut memory = FlatMemory::new(config.memory.size, config.memory.base);
        memory.write_words(load_addr, words)?;
        let entry = config.entry_pc.unwrap_or(load_addr);
        Self::assemble(config, memory, entry)
    }

    fn assemble(config: SimConfig, memory: FlatMemory, entry: u32) -> Result<Self, EnvError> {
        let heap = config.heap.unwrap_or(HeapRegion::new(0, 0));
        let template = config.clone();
        let mut isolate = Isolate::new(Box::new(memory), Arc::new(heap))
            .with_simulator_builder(move || template.simulator_builder());
        // 提前创建以尽早暴露配置错误
        isolate.simulator()?;
        debug!(entry = format_args!("0x{entry:08x}"), "sim env ready");
        Ok(Self { isolate, entry, config })
    }

    pub fn entry(&self) -> u32 {
        self.entry
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn isolate(&self) -> &Isolate {
        &self.isolate
    }

    pub fn isolate_mut(&mut self) -> &mut Isolate {
        &mut self.isolate
    }

    /// 以配置的参数调用入口函数，返回 `(v1 << 32) | v0`
    pub fn run(&mut self) -> Result<i64, EnvError> {
        let result = self.isolate.call(self.entry, self.config.args)?;
        info!(result = format_args!("0x{result:016x}"), "simulated call returned");
        Ok(result)
    }

    /// 打印仿真状态
    pub fn dump(&mut self, out: &mut dyn Write) -> Result<(), EnvError> {
        let sim = self.isolate.simulator()?;
        writeln!(out, "=== SimEnv Status ===")?;
        writeln!(out, "Entry: 0x{:08x}", self.entry)?;
        writeln!(out, "Instructions executed: {}", sim.icount())?;
        sim.cpu().dump_regs(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::encode;
    use crate::isa::regs::*;
    use crate::memory::Memory;

    const BASE: u32 = 0x0040_0000;

    /// 手工构造的 ELF32 小端文件：一个 PT_LOAD 段，带 bss
    fn tiny_elf(machine: u16, words: &[u32], bss: u32) -> Vec<u8> {
        let code: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut out = Vec::new();
        // e_ident
        out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, 1, 1, 0]);
        out.extend_from_slice(&[0; 8]);
        out.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        out.extend_from_slice(&machine.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes()); // e_version
        out.extend_from_slice(&BASE.to_le_bytes()); // e_entry
        out.extend_from_slice(&52u32.to_le_bytes()); // e_phoff
        out.extend_from_slice(&0u32.to_le_bytes()); // e_shoff
        out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        out.extend_from_slice(&52u16.to_le_bytes()); // e_ehsize
        out.extend_from_slice(&32u16.to_le_bytes()); // e_phentsize
        out.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
        out.extend_from_slice(&40u16.to_le_bytes()); // e_shentsize
        out.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
        out.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx
        assert_eq!(out.len(), 52);
        // program header
        let filesz = code.len() as u32;
        out.extend_from_slice(&PT_LOAD.to_le_bytes());
        out.extend_from_slice(&84u32.to_le_bytes()); // p_offset
        out.extend_from_slice(&BASE.to_le_bytes()); // p_vaddr
        out.extend_from_slice(&BASE.to_le_bytes()); // p_paddr
        out.extend_from_slice(&filesz.to_le_bytes());
        out.extend_from_slice(&(filesz + bss).to_le_bytes());
        out.extend_from_slice(&(PF_X | 4).to_le_bytes()); // R+X
        out.extend_from_slice(&4u32.to_le_bytes()); // p_align
        assert_eq!(out.len(), 84);
        out.extend_from_slice(&code);
        out
    }

    fn adder() -> Vec<u32> {
        vec![encode::jr(RA), encode::addu(V0, A0, A1)]
    }

    #[test]
    fn test_parse_mips_elf() {
        let elf = ElfInfo::parse_bytes(&tiny_elf(EM_MIPS, &adder(), 16)).unwrap();
        assert_eq!(elf.entry, BASE);
        assert_eq!(elf.segments.len(), 1);
        let seg = &elf.segments[0];
        assert_eq!(seg.vaddr, BASE);
        assert_eq!(seg.file_size, 8);
        assert_eq!(seg.mem_size, 24);
        assert!(seg.executable);
        assert!(!seg.writable);
        assert!(elf.symbols.is_empty());
    }

    #[test]
    fn test_reject_foreign_machine() {
        let err = ElfInfo::parse_bytes(&tiny_elf(0xF3, &adder(), 0)).unwrap_err();
        assert!(matches!(err, EnvError::ElfParse(_)));
        assert!(ElfInfo::parse_bytes(b"not an elf").is_err());
    }

    #[test]
    fn test_segments_loaded_with_bss() {
        let elf = ElfInfo::parse_bytes(&tiny_elf(EM_MIPS, &adder(), 8)).unwrap();
        let region = MemoryRegion::default();
        let mut memory = FlatMemory::new(region.size, region.base);
        memory.fill(BASE, 32, 0xAA).unwrap();
        load_segments_into_memory(&mut memory, &region, &elf.segments).unwrap();
        assert_eq!(memory.load32(BASE).unwrap(), encode::jr(RA));
        assert_eq!(memory.load32(BASE + 8).unwrap(), 0);
        assert_eq!(memory.load32(BASE + 12).unwrap(), 0);
        assert_eq!(memory.load32(BASE + 16).unwrap(), 0xAAAA_AAAA);
    }

    #[test]
    fn test_segment_outside_region() {
        let elf = ElfInfo::parse_bytes(&tiny_elf(EM_MIPS, &adder(), 0)).unwrap();
        let region = MemoryRegion {
            name: "low".into(),
            base: 0x1_0000,
            size: 0x1000,
        };
        let mut memory = FlatMemory::new(region.size, region.base);
        let err = load_segments_into_memory(&mut memory, &region, &elf.segments).unwrap_err();
        assert!(matches!(err, EnvError::OutOfRegion { .. }));
    }

    #[test]
    fn test_run_from_elf_file() {
        let path = std::env::temp_dir().join(format!("archsim-env-{}.elf", std::process::id()));
        std::fs::write(&path, tiny_elf(EM_MIPS, &adder(), 0)).unwrap();
        let config = SimConfig::new()
            .with_elf_path(path.to_string_lossy())
            .with_args([40, 2, 0, 0]);
        let mut env = SimEnv::from_config(config).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(env.entry(), BASE);
        assert_eq!(env.run().unwrap(), 42);
    }

    #[test]
    fn test_run_from_words() {
        let config = SimConfig::new().with_args([7, 5, 0, 0]);
        let mut env = SimEnv::from_words(config, BASE + 0x100, &adder()).unwrap();
        assert_eq!(env.entry(), BASE + 0x100);
        assert_eq!(env.run().unwrap(), 12);

        let mut out = Vec::new();
        env.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Instructions executed: 2"));
    }

    #[test]
    fn test_config_errors() {
        let config = SimConfig::new().with_memory(BASE, 0);
        assert!(matches!(SimEnv::from_config(config), Err(EnvError::Config(_))));

        let config = SimConfig::new().with_entry_symbol("main");
        assert!(matches!(SimEnv::from_config(config), Err(EnvError::Config(_))));

        let config = SimConfig::new().with_stack_size(0);
        assert!(matches!(
            SimEnv::from_words(config, BASE, &adder()),
            Err(EnvError::Sim(SimError::InvalidConfig(_)))
        ));

        let config = SimConfig::new();
        assert!(matches!(
            SimEnv::from_words(config, BASE - 4, &adder()),
            Err(EnvError::OutOfRegion { .. })
        ));
    }

    #[test]
    fn test_trap_reported_as_sim_error() {
        // lw t0, 0(zero) 访问非法地址
        let words = [encode::lw(T0, ZR, 0), encode::jr(RA), encode::nop()];
        let mut env = SimEnv::from_words(SimConfig::new(), BASE, &words).unwrap();
        assert!(matches!(env.run(), Err(EnvError::Sim(SimError::IllegalAccess { addr: 0, .. }))));
    }
}
