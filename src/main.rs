//! archsim 命令行入口
//!
//! - `run`：加载 MIPS32 ELF 或原始二进制，以模拟调用的方式执行入口函数
//! - `demo`：内置程序与调用点/跳转模式改写演示

use std::process::ExitCode;

use archsim::arm::fields::{encode_movt, encode_movw, BX_IP, IP};
use archsim::arm::templates::{emit_call, TemplateError};
use archsim::isa::encode;
use archsim::isa::regs::*;
use archsim::memory::{FlatMemory, MemError, Memory, NoICache};
use archsim::pattern::{CallPattern, Code, JumpPattern, ObjectPool, ObjectRef, PatternError, PoolEntry};
use archsim::sim::debugger::parse_literal;
use archsim::sim::{flags, SimError};
use archsim::sim_env::{EnvError, SimConfig, SimEnv};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "archsim_cli", about = "MIPS32 simulator and ARM call-site patching tools")]
struct Cli {
    /// 日志级别（trace, debug, info, warn, error）；RUST_LOG 优先
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a program and call its entry point
    Run {
        /// ELF file, or raw binary with --bin
        file: String,
        /// Treat FILE as a raw little-endian binary
        #[arg(long)]
        bin: bool,
        /// Load address for --bin
        #[arg(long, value_parser = parse_number, default_value = "0x00400000")]
        load_addr: u32,
        /// Entry point override
        #[arg(long, value_parser = parse_number)]
        entry: Option<u32>,
        /// Entry symbol (ELF only)
        #[arg(long, conflicts_with = "entry")]
        symbol: Option<String>,
        /// Call arguments a0..a3
        #[arg(long = "arg", value_parser = parse_number, num_args = 1, action = clap::ArgAction::Append)]
        args: Vec<u32>,
        /// Open the debugger after N instructions
        #[arg(long)]
        stop_sim_at: Option<u64>,
        /// Host memory base
        #[arg(long, value_parser = parse_number, default_value = "0x00400000")]
        mem_base: u32,
        /// Host memory size in KiB
        #[arg(long, default_value_t = 1024)]
        mem_kib: usize,
        /// Enable the double-precision FPU
        #[arg(long)]
        fpu: bool,
        /// Dump registers after the call
        #[arg(long)]
        verbose: bool,
    },
    /// Run the built-in demonstration
    Demo {
        /// Argument passed to the built-in summation routine
        #[arg(long, default_value_t = 10)]
        n: u32,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("too many call arguments: {0} (at most 4)")]
    TooManyArgs(usize),
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Memory(#[from] MemError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// 调试器中的 quit 是正常结束
    fn is_quit(&self) -> bool {
        matches!(self, CliError::Env(EnvError::Sim(SimError::Quit)))
    }
}

fn parse_number(text: &str) -> Result<u32, String> {
    parse_literal(text).ok_or_else(|| format!("invalid number: {text}"))
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Command::Run {
            file,
            bin,
            load_addr,
            entry,
            symbol,
            args,
            stop_sim_at,
            mem_base,
            mem_kib,
            fpu,
            verbose,
        } => {
            let mut config = SimConfig::new()
                .with_memory(mem_base, mem_kib * 1024)
                .with_fpu(fpu)
                .with_interactive(true)
                .with_verbose(verbose);
            config = if bin { config.with_bin_path(file, load_addr) } else { config.with_elf_path(file) };
            if let Some(pc) = entry {
                config = config.with_entry_pc(pc);
            }
            if let Some(name) = symbol {
                config = config.with_entry_symbol(name);
            }
            if let Some(count) = stop_sim_at {
                config = config.with_stop_sim_at(count);
            }
            run(config, &args)
        }
        Command::Demo { n } => demo(n),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_quit() => {
            info!("quit from debugger");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "archsim failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: SimConfig, args: &[u32]) -> Result<(), CliError> {
    if args.len() > 4 {
        return Err(CliError::TooManyArgs(args.len()));
    }
    let mut call_args = [0u32; 4];
    call_args[..args.len()].copy_from_slice(args);

    let verbose = config.verbose;
    let mut env = SimEnv::from_config(config.with_args(call_args))?;
    let result = env.run()?;
    println!("v0 = 0x{:08x} ({})", result as u32, result as u32 as i32);
    println!("v1 = 0x{:08x}", (result >> 32) as u32);
    if verbose {
        env.dump(&mut std::io::stdout())?;
    }
    Ok(())
}

/// 内置演示：MIPS 求和循环 + ARM 调用点与跳转改写
fn demo(n: u32) -> Result<(), CliError> {
    println!("=== archsim demo ===\n");

    // 1. 模拟执行：v0 = 1 + 2 + ... + a0
    //   0x00 addu v0, zr, zr
    //   0x04 blez a0, done
    //   0x08 nop
    // loop:
    //   0x0C addu v0, v0, a0
    //   0x10 addiu a0, a0, -1
    //   0x14 bgtz a0, loop
    //   0x18 nop
    // done:
    //   0x1C jr ra
    //   0x20 nop
    let program = [
        encode::addu(V0, ZR, ZR),
        encode::blez(A0, 5),
        encode::nop(),
        encode::addu(V0, V0, A0),
        encode::addiu(A0, A0, -1),
        encode::bgtz(A0, -3),
        encode::nop(),
        encode::jr(RA),
        encode::nop(),
    ];
    let config = SimConfig::new().with_args([n, 0, 0, 0]);
    let load_addr = config.memory.base;
    let mut env = SimEnv::from_words(config, load_addr, &program)?;
    let sum = env.run()? as u32;
    let icount = env.isolate_mut().simulator().map_err(EnvError::from)?.icount();
    println!("sum(1..={n}) = {sum}  [{icount} instructions, stop_sim_at={}]", flags::stop_sim_at());

    // 2. 调用点改写
    const CODE_BASE: u32 = 0x1_0000;
    const TARGET: usize = 2;
    let mut pool: ObjectPool = (0..4).map(|_| PoolEntry::Null).collect();
    pool.set_at(0, PoolEntry::IcData(ObjectRef(0xA001)))?;
    pool.set_at(1, PoolEntry::ArgumentsDescriptor(ObjectRef(0x9001)))?;
    pool.set_at(TARGET, PoolEntry::Smi(0x0002_0000))?;

    let words = emit_call(TARGET, 1, 0)?;
    let mut mem = FlatMemory::new(0x1000, CODE_BASE);
    // 调用点前放一条 mov r0, r0
    mem.store32(CODE_BASE, 0xE1A0_0000)?;
    mem.write_words(CODE_BASE + 4, &words)?;
    let size = 4 + 4 * words.len() as u32;
    let mut code = Code::new(CODE_BASE, size, pool);
    {
        let mut call = CallPattern::new(CODE_BASE + size, &mut code, &mem)?;
        println!("\ncall site returning to 0x{:08x}:", call.pc());
        println!("  target    = 0x{:08x} (pool[{}])", call.target_address()?, call.target_index());
        println!("  args desc = {}", call.arguments_descriptor()?);
        println!("  ic data   = {}", call.ic_data()?);
        call.set_target_address(0x0003_0000)?;
        println!("  patched   = 0x{:08x}", call.target_address()?);
    }

    // 3. 跳转改写
    let jump_pc = CODE_BASE + 0x100;
    mem.write_words(
        jump_pc,
        &[encode_movw(IP, 0x5678), encode_movt(IP, 0x1234), BX_IP],
    )?;
    let jump = JumpPattern::new(jump_pc);
    println!("\njump at 0x{jump_pc:08x}:");
    println!("  target  = 0x{:08x}", jump.target_address(&mem)?);
    jump.set_target_address(&mut mem, &mut NoICache, 0xCAFE_BABE)?;
    println!("  patched = 0x{:08x}", jump.target_address(&mem)?);
    println!("  movw    = 0x{:08x}", mem.load32(jump_pc)?);

    Ok(())
}
