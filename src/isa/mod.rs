//! MIPS32 ISA 抽象与解码框架
//!
//! 本模块提供可扩展的指令解码系统：
//! - `MipsInstr`: 指令的语义表示
//! - `InstrDecoder`: 解码器 trait，允许插件式扩展
//! - `DecoderRegistry`: 按主 opcode 分桶的解码器注册表
//! - `InstrDef`: 统一的指令定义，同时用于解码和冲突检测
//! - `IsaConfig`: ISA 配置构建器，支持冲突检测
//! - `encode` / `disasm`: 指令编码与反汇编

mod config;
mod decoder;
mod fields;
mod instr;
mod instr_def;
pub mod cop1;
pub mod disasm;
pub mod encode;
pub mod mips32;
pub mod regs;

pub use config::{ConflictInfo, IsaConfig, IsaExtension};
pub use decoder::{DecoderError, DecoderRegistry, InstrDecoder, NUM_OPCODES};
pub use disasm::{format_instr, Disassembler, MipsDisassembler};
pub use fields::*;
pub use instr::{DecodedInstr, MipsInstr};
pub use instr_def::{InstrDef, TableDrivenDecoder};

/// 便捷函数：使用整数 + COP1 解码器解码指令
pub fn decode(raw: u32) -> DecodedInstr {
    use std::sync::OnceLock;
    static REGISTRY: OnceLock<DecoderRegistry> = OnceLock::new();
    REGISTRY
        .get_or_init(|| {
            IsaConfig::new()
                .with_fpu()
                .build()
                .unwrap_or_else(|_| DecoderRegistry::with_mips32())
        })
        .decode(raw)
}

#[cfg(test)]
mod tests;
