//! 指令定义结构
//!
//! 统一的指令定义，同时用于解码和冲突检测

use super::decoder::InstrDecoder;
use super::instr::{DecodedInstr, MipsInstr};

/// 指令定义
///
/// 一处定义，两处使用：
/// - 解码：通过 mask/match 匹配后调用 decode 函数
/// - 冲突检测：通过 mask/match 判断两条指令是否可能冲突
#[derive(Clone)]
pub struct InstrDef {
    /// 指令名称（用于调试和冲突报告）
    pub name: &'static str,
    /// 匹配掩码：哪些位需要检查
    pub mask: u32,
    /// 匹配值：这些位应该是什么
    pub match_val: u32,
    /// 解码函数：从原始编码提取字段并构造 MipsInstr
    pub decode: fn(u32) -> MipsInstr,
}

impl InstrDef {
    /// 创建新的指令定义
    pub const fn new(
        name: &'static str,
        mask: u32,
        match_val: u32,
        decode: fn(u32) -> MipsInstr,
    ) -> Self {
        Self {
            name,
            mask,
            match_val,
            decode,
        }
    }

    /// 检查指令是否匹配此定义
    #[inline]
    pub fn matches(&self, raw: u32) -> bool {
        (raw & self.mask) == self.match_val
    }

    /// 解码指令
    #[inline]
    pub fn decode_instr(&self, raw: u32) -> DecodedInstr {
        DecodedInstr {
            raw,
            instr: (self.decode)(raw),
        }
    }

    /// 定义所属的主 opcode
    #[inline]
    pub fn primary_opcode(&self) -> u32 {
        self.match_val >> 26
    }

    /// 检查两个指令定义是否冲突
    ///
    /// 两个定义冲突当且仅当存在某个指令字同时匹配两者
    pub fn conflicts_with(&self, other: &InstrDef) -> bool {
        let common_mask = self.mask & other.mask;
        (self.match_val & common_mask) == (other.match_val & common_mask)
    }
}

impl std::fmt::Debug for InstrDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrDef")
            .field("name", &self.name)
            .field("mask", &format_args!("0x{:08X}", self.mask))
            .field("match_val", &format_args!("0x{:08X}", self.match_val))
            .finish()
    }
}

// ========== 类型掩码常量 ==========

/// 只检查主 opcode（I-type / J-type）
pub const OP_MASK: u32 = 0xFC00_0000;

/// 主 opcode + rs 必须为 0（LUI）
pub const OP_RS0_MASK: u32 = 0xFFE0_0000;

/// 主 opcode + rt 必须为 0（BLEZ/BGTZ）
pub const OP_RT0_MASK: u32 = 0xFC1F_0000;

/// R-type：opcode + sa=0 + funct
pub const R_TYPE_MASK: u32 = 0xFC00_07FF;

/// 立即数移位：opcode + rs=0 + funct
pub const SHIFT_IMM_MASK: u32 = 0xFFE0_003F;

/// HI/LO 乘除：opcode + rd=0 + sa=0 + funct
pub const MULDIV_MASK: u32 = 0xFC00_FFFF;

/// MFHI/MFLO：只有 rd 可变
pub const MOVE_FROM_HILO_MASK: u32 = 0xFFFF_07FF;

/// MTHI/MTLO：只有 rs 可变
pub const MOVE_TO_HILO_MASK: u32 = 0xFC1F_FFFF;

/// JR：rt=0, rd=0（sa 为 hint，不检查）
pub const JR_MASK: u32 = 0xFC1F_F83F;

/// JALR：rt=0（sa 为 hint，不检查）
pub const JALR_MASK: u32 = 0xFC1F_003F;

/// BREAK：opcode + funct，code 字段任意
pub const FUNCT_ONLY_MASK: u32 = 0xFC00_003F;

/// REGIMM：opcode + rt
pub const REGIMM_MASK: u32 = 0xFC1F_0000;

/// COP1 寄存器搬移：opcode + fmt + 低 11 位为 0
pub const COP1_MOVE_MASK: u32 = 0xFFE0_07FF;

/// BC1F/BC1T：opcode + fmt + cc=0 + nd=0 + tf
pub const COP1_BRANCH_MASK: u32 = 0xFFFF_0000;

/// 三操作数 .D：fs/ft/fd 的最低位必须为 0（偶数寄存器）
pub const COP1_D3_MASK: u32 = 0xFFE1_087F;

/// 双操作数 .D（ft=0）：fs/fd 必须为偶数
pub const COP1_D2_MASK: u32 = 0xFFFF_087F;

/// .D -> .W 转换：fs 必须为偶数，fd 为单个 32-bit 寄存器
pub const COP1_D_TO_W_MASK: u32 = 0xFFFF_083F;

/// .W -> .D 转换：fd 必须为偶数，fs 为单个 32-bit 寄存器
pub const COP1_W_TO_D_MASK: u32 = 0xFFFF_007F;

/// C.cond.D：cc=0，fs/ft 偶数，低 4 位为条件
pub const COP1_COND_MASK: u32 = 0xFFE1_0FF0;

/// LDC1/SDC1：ft 必须为偶数
pub const COP1_PAIR_MEM_MASK: u32 = 0xFC01_0000;

// ========== 辅助函数：构造 match 值 ==========

/// 构造主 opcode 的 match 值
#[inline]
pub const fn op_match(opcode: u32) -> u32 {
    opcode << 26
}

/// 构造 SPECIAL / SPECIAL2 的 match 值
#[inline]
pub const fn funct_match(opcode: u32, funct: u32) -> u32 {
    (opcode << 26) | funct
}

/// 构造 REGIMM 的 match 值
#[inline]
pub const fn regimm_match(rt: u32) -> u32 {
    (super::fields::OP_REGIMM << 26) | (rt << 16)
}

/// 构造 COP1 的 match 值
#[inline]
pub const fn cop1_match(fmt: u32, funct: u32) -> u32 {
    (super::fields::OP_COP1 << 26) | (fmt << 21) | funct
}

// ========== 表驱动解码器 ==========

/// 表驱动解码器
///
/// 通用解码器，使用 InstrDef 数组进行解码
#[derive(Clone, Copy)]
pub struct TableDrivenDecoder {
    /// 解码器名称
    name: &'static str,
    /// 指令定义表
    instrs: &'static [InstrDef],
    /// 处理的主 opcode（用于分桶）
    opcodes: Option<&'static [u32]>,
    /// 是否允许与其他解码器共享 opcode
    allow_overlap: bool,
}

impl TableDrivenDecoder {
    /// 创建新的表驱动解码器
    pub const fn new(
        name: &'static str,
        instrs: &'static [InstrDef],
        opcodes: Option<&'static [u32]>,
        allow_overlap: bool,
    ) -> Self {
        Self { name, instrs, opcodes, allow_overlap }
    }

    /// 获取指令定义表
    pub fn instrs(&self) -> &'static [InstrDef] {
        self.instrs
    }
}

impl InstrDecoder for TableDrivenDecoder {
    fn name(&self) -> &str {
        self.name
    }

    fn decode(&self, raw: u32) -> Option<DecodedInstr> {
        self.instrs
            .iter()
            .find(|def| def.matches(raw))
            .map(|def| def.decode_instr(raw))
    }

    fn handled_opcodes(&self) -> Option<&[u32]> {
        self.opcodes
    }

    fn allow_opcode_overlap(&self) -> bool {
        self.allow_overlap
    }
}
