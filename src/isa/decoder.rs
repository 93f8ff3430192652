//! 解码器框架
//!
//! 提供可扩展的指令解码系统

use std::sync::Arc;

use thiserror::Error;

use super::fields;
use super::instr::{DecodedInstr, MipsInstr};

/// 主 opcode 的取值个数（6 bit）
pub const NUM_OPCODES: usize = 64;

/// 解码器注册/配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    #[error("opcode 0x{opcode:02X} already handled; rejecting decoder {decoder}")]
    OpcodeTaken { opcode: u32, decoder: String },
    #[error("wildcard decoder {0} cannot register due to overlap")]
    WildcardOverlap(String),
    #[error("decoder {decoder} claims opcode 0x{opcode:02X} outside the 6-bit range")]
    OpcodeOutOfRange { opcode: u32, decoder: String },
    #[error("{count} instruction conflicts, first: {first}")]
    Conflicts { count: usize, first: String },
}

/// 指令解码器 trait
///
/// 实现此 trait 以创建自定义解码器
pub trait InstrDecoder: Send + Sync {
    /// 解码器名称
    fn name(&self) -> &str;

    /// 尝试解码指令
    ///
    /// 返回 `Some(decoded)` 如果能解码，否则返回 `None`
    fn decode(&self, raw: u32) -> Option<DecodedInstr>;

    /// 此解码器处理的主 opcode 列表
    ///
    /// 注册表只对对应 opcode 调用相应解码器
    fn handled_opcodes(&self) -> Option<&[u32]> {
        None
    }

    /// 是否允许与其他解码器在同一 opcode 上共存
    fn allow_opcode_overlap(&self) -> bool {
        false
    }
}

/// 解码器注册表
///
/// 管理多个解码器，支持运行时注册，按主 opcode 分桶解码
pub struct DecoderRegistry {
    /// 注册的解码器列表（按注册顺序）
    decoders: Vec<Arc<dyn InstrDecoder>>,
    /// 按 opcode 分桶的解码器索引
    opcode_map: [Vec<usize>; NUM_OPCODES],
}

impl DecoderRegistry {
    /// 创建空的解码器注册表
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
            opcode_map: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// 创建只包含整数指令的注册表
    pub fn with_mips32() -> Self {
        let mut registry = Self::new();
        // 空表上注册单个解码器不会失败
        let _ = registry.register(Arc::new(super::mips32::MIPS32_DECODER));
        registry
    }

    /// 注册一个解码器；若声明的 opcode 已被占用则返回 Err
    pub fn register(&mut self, decoder: Arc<dyn InstrDecoder>) -> Result<(), DecoderError> {
        let idx = self.decoders.len();

        // 先做冲突检测，避免错误时污染注册表
        if let Some(opcodes) = decoder.handled_opcodes() {
            for &op in opcodes {
                if op as usize >= NUM_OPCODES {
                    return Err(DecoderError::OpcodeOutOfRange {
                        opcode: op,
                        decoder: decoder.name().to_string(),
                    });
                }
                let bucket = &self.opcode_map[op as usize];
                if !bucket.is_empty() {
                    let existing_conflict = bucket
                        .iter()
                        .any(|&i| !self.decoders[i].allow_opcode_overlap());
                    if existing_conflict || !decoder.allow_opcode_overlap() {
                        return Err(DecoderError::OpcodeTaken {
                            opcode: op,
                            decoder: decoder.name().to_string(),
                        });
                    }
                }
            }
        } else {
            let has_blocking = self
                .opcode_map
                .iter()
                .any(|bucket| bucket.iter().any(|&i| !self.decoders[i].allow_opcode_overlap()));
            if has_blocking || !decoder.allow_opcode_overlap() {
                return Err(DecoderError::WildcardOverlap(decoder.name().to_string()));
            }
        }

        self.decoders.push(decoder);

        if let Some(opcodes) = self.decoders[idx].handled_opcodes() {
            for &op in opcodes {
                self.opcode_map[op as usize].push(idx);
            }
        } else {
            for bucket in &mut self.opcode_map {
                bucket.push(idx);
            }
        }

        tracing::debug!(decoder = self.decoders[idx].name(), "decoder registered");
        Ok(())
    }

    /// 解码指令
    ///
    /// 仅按 opcode 分桶的解码器尝试，命中即返回；都不命中时返回 `Illegal`
    pub fn decode(&self, raw: u32) -> DecodedInstr {
        let opcode = fields::opcode(raw);

        for &idx in &self.opcode_map[opcode as usize] {
            if let Some(decoded) = self.decoders[idx].decode(raw) {
                return decoded;
            }
        }

        DecodedInstr {
            raw,
            instr: MipsInstr::Illegal { raw },
        }
    }

    /// 获取已注册的解码器数量
    pub fn decoder_count(&self) -> usize {
        self.decoders.len()
    }

    /// 列出所有已注册的解码器名称
    pub fn decoder_names(&self) -> Vec<&str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_mips32()
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("decoders", &self.decoder_names())
            .finish()
    }
}
