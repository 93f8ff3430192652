//! ISA 配置与冲突检测
//!
//! 选择启用的指令表（整数基础集、COP1、自定义扩展），
//! 在构建解码器注册表之前做跨表的 mask/match 冲突检测。

use std::sync::Arc;

use super::cop1::{COP1_DECODER, COP1_INSTRS};
use super::decoder::{DecoderError, DecoderRegistry, InstrDecoder};
use super::instr_def::InstrDef;
use super::mips32::{MIPS32_DECODER, MIPS32_INSTRS};

/// 支持的 ISA 扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsaExtension {
    /// 整数基础集（必选）
    Mips32,
    /// 浮点协处理器
    Cop1,
    /// 自定义扩展
    Custom(&'static str),
}

impl std::fmt::Display for IsaExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsaExtension::Mips32 => write!(f, "MIPS32"),
            IsaExtension::Cop1 => write!(f, "COP1"),
            IsaExtension::Custom(name) => write!(f, "X{}", name),
        }
    }
}

/// 冲突信息
#[derive(Debug, Clone)]
pub struct ConflictInfo {
    pub extension1: IsaExtension,
    pub name1: &'static str,
    pub extension2: IsaExtension,
    pub name2: &'static str,
    /// 同时匹配两者的示例编码
    pub example_raw: u32,
}

impl std::fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "冲突: {}:{} 与 {}:{} (示例: 0x{:08X})",
            self.extension1, self.name1, self.extension2, self.name2, self.example_raw
        )
    }
}

/// ISA 配置构建器
///
/// # 示例
///
/// ```
/// use archsim::isa::IsaConfig;
///
/// let registry = IsaConfig::new()
///     .with_fpu()
///     .build()
///     .expect("无冲突");
/// assert_eq!(registry.decoder_count(), 2);
/// ```
pub struct IsaConfig {
    tables: Vec<(IsaExtension, &'static [InstrDef])>,
    custom_decoders: Vec<Arc<dyn InstrDecoder>>,
}

impl IsaConfig {
    /// 创建新的 ISA 配置（默认只有整数基础集）
    pub fn new() -> Self {
        Self {
            tables: vec![(IsaExtension::Mips32, MIPS32_INSTRS)],
            custom_decoders: Vec::new(),
        }
    }

    /// 启用浮点协处理器
    pub fn with_fpu(mut self) -> Self {
        if !self.has(IsaExtension::Cop1) {
            self.tables.push((IsaExtension::Cop1, COP1_INSTRS));
        }
        self
    }

    /// 添加自定义解码器，`defs` 用于冲突检测
    pub fn with_custom_decoder(
        mut self,
        extension: IsaExtension,
        decoder: Arc<dyn InstrDecoder>,
        defs: &'static [InstrDef],
    ) -> Self {
        self.tables.push((extension, defs));
        self.custom_decoders.push(decoder);
        self
    }

    pub fn has(&self, extension: IsaExtension) -> bool {
        self.tables.iter().any(|(ext, _)| *ext == extension)
    }

    /// 检测不同扩展之间的指令冲突
    pub fn detect_conflicts(&self) -> Vec<ConflictInfo> {
        let mut conflicts = Vec::new();

        for (i, (ext1, defs1)) in self.tables.iter().enumerate() {
            for (ext2, defs2) in self.tables.iter().skip(i + 1) {
                for d1 in defs1.iter() {
                    for d2 in defs2.iter() {
                        if d1.conflicts_with(d2) {
                            conflicts.push(ConflictInfo {
                                extension1: *ext1,
                                name1: d1.name,
                                extension2: *ext2,
                                name2: d2.name,
                                example_raw: (d1.match_val & d1.mask) | (d2.match_val & d2.mask),
                            });
                        }
                    }
                }
            }
        }

        conflicts
    }

    /// 构建解码器注册表；存在冲突时返回错误
    pub fn build(self) -> Result<DecoderRegistry, DecoderError> {
        let conflicts = self.detect_conflicts();
        if let Some(first) = conflicts.first() {
            return Err(DecoderError::Conflicts {
                count: conflicts.len(),
                first: first.to_string(),
            });
        }

        let mut registry = DecoderRegistry::new();
        registry.register(Arc::new(MIPS32_DECODER))?;
        if self.has(IsaExtension::Cop1) {
            registry.register(Arc::new(COP1_DECODER))?;
        }
        for decoder in self.custom_decoders {
            registry.register(decoder)?;
        }

        Ok(registry)
    }
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self::new()
    }
}
