//! 指令字段提取辅助函数
//!
//! 提供从 32-bit MIPS 指令字中提取各字段的工具函数

/// 提取主 opcode 字段 [31:26]
#[inline]
pub fn opcode(raw: u32) -> u32 {
    raw >> 26
}

/// 提取 rs 字段 [25:21]
#[inline]
pub fn rs(raw: u32) -> u8 {
    ((raw >> 21) & 0x1F) as u8
}

/// 提取 rt 字段 [20:16]
#[inline]
pub fn rt(raw: u32) -> u8 {
    ((raw >> 16) & 0x1F) as u8
}

/// 提取 rd 字段 [15:11]
#[inline]
pub fn rd(raw: u32) -> u8 {
    ((raw >> 11) & 0x1F) as u8
}

/// 提取移位量 sa 字段 [10:6]
#[inline]
pub fn sa(raw: u32) -> u8 {
    ((raw >> 6) & 0x1F) as u8
}

/// 提取 function 字段 [5:0]
#[inline]
pub fn funct(raw: u32) -> u32 {
    raw & 0x3F
}

/// 提取 16-bit 立即数（零扩展）
#[inline]
pub fn imm_u(raw: u32) -> u32 {
    raw & 0xFFFF
}

/// 提取 16-bit 立即数并符号扩展
#[inline]
pub fn imm_s(raw: u32) -> i32 {
    (raw as u16) as i16 as i32
}

/// 分支偏移：imm_s << 2
#[inline]
pub fn branch_offset(raw: u32) -> i32 {
    imm_s(raw) << 2
}

/// J-type 的 26-bit instr_index [25:0]
#[inline]
pub fn jump_index(raw: u32) -> u32 {
    raw & 0x03FF_FFFF
}

/// BREAK 指令携带的 code 字段 [25:6]
#[inline]
pub fn break_code(raw: u32) -> u32 {
    (raw >> 6) & 0xFFFFF
}

// ========== COP1 字段（与通用字段同位置，换个名字） ==========

/// COP1 fmt 字段 [25:21]
#[inline]
pub fn fmt(raw: u32) -> u32 {
    (raw >> 21) & 0x1F
}

/// COP1 ft 字段 [20:16]
#[inline]
pub fn ft(raw: u32) -> u8 {
    rt(raw)
}

/// COP1 fs 字段 [15:11]
#[inline]
pub fn fs(raw: u32) -> u8 {
    rd(raw)
}

/// COP1 fd 字段 [10:6]
#[inline]
pub fn fd(raw: u32) -> u8 {
    sa(raw)
}

/// C.cond.fmt 的条件编码 [3:0]
#[inline]
pub fn fp_cond(raw: u32) -> u8 {
    (raw & 0xF) as u8
}

// ========== 主 Opcode 常量 ==========
pub const OP_SPECIAL: u32 = 0;
pub const OP_REGIMM: u32 = 1;
pub const OP_J: u32 = 2;
pub const OP_JAL: u32 = 3;
pub const OP_BEQ: u32 = 4;
pub const OP_BNE: u32 = 5;
pub const OP_BLEZ: u32 = 6;
pub const OP_BGTZ: u32 = 7;
pub const OP_ADDI: u32 = 8;
pub const OP_ADDIU: u32 = 9;
pub const OP_SLTI: u32 = 10;
pub const OP_SLTIU: u32 = 11;
pub const OP_ANDI: u32 = 12;
pub const OP_ORI: u32 = 13;
pub const OP_XORI: u32 = 14;
pub const OP_LUI: u32 = 15;
pub const OP_COP1: u32 = 17;
pub const OP_SPECIAL2: u32 = 28;
pub const OP_LB: u32 = 32;
pub const OP_LH: u32 = 33;
pub const OP_LW: u32 = 35;
pub const OP_LBU: u32 = 36;
pub const OP_LHU: u32 = 37;
pub const OP_SB: u32 = 40;
pub const OP_SH: u32 = 41;
pub const OP_SW: u32 = 43;
pub const OP_LWC1: u32 = 49;
pub const OP_LDC1: u32 = 53;
pub const OP_SWC1: u32 = 57;
pub const OP_SDC1: u32 = 61;

// ========== SPECIAL function 常量 ==========
pub const FN_SLL: u32 = 0;
pub const FN_SRL: u32 = 2;
pub const FN_SRA: u32 = 3;
pub const FN_SLLV: u32 = 4;
pub const FN_SRLV: u32 = 6;
pub const FN_SRAV: u32 = 7;
pub const FN_JR: u32 = 8;
pub const FN_JALR: u32 = 9;
pub const FN_MOVZ: u32 = 10;
pub const FN_MOVN: u32 = 11;
pub const FN_BREAK: u32 = 13;
pub const FN_MFHI: u32 = 16;
pub const FN_MTHI: u32 = 17;
pub const FN_MFLO: u32 = 18;
pub const FN_MTLO: u32 = 19;
pub const FN_MULT: u32 = 24;
pub const FN_MULTU: u32 = 25;
pub const FN_DIV: u32 = 26;
pub const FN_DIVU: u32 = 27;
pub const FN_ADD: u32 = 32;
pub const FN_ADDU: u32 = 33;
pub const FN_SUB: u32 = 34;
pub const FN_SUBU: u32 = 35;
pub const FN_AND: u32 = 36;
pub const FN_OR: u32 = 37;
pub const FN_XOR: u32 = 38;
pub const FN_NOR: u32 = 39;
pub const FN_SLT: u32 = 42;
pub const FN_SLTU: u32 = 43;

// ========== SPECIAL2 function 常量 ==========
pub const FN2_MADD: u32 = 0;
pub const FN2_MADDU: u32 = 1;
pub const FN2_MUL: u32 = 2;
pub const FN2_CLZ: u32 = 32;
pub const FN2_CLO: u32 = 33;

// ========== REGIMM rt 常量 ==========
pub const RI_BLTZ: u32 = 0;
pub const RI_BGEZ: u32 = 1;
pub const RI_BLTZAL: u32 = 16;
pub const RI_BGEZAL: u32 = 17;

// ========== COP1 fmt / function 常量 ==========
pub const FMT_MF: u32 = 0;
pub const FMT_CF: u32 = 2;
pub const FMT_MT: u32 = 4;
pub const FMT_CT: u32 = 6;
pub const FMT_BC: u32 = 8;
pub const FMT_S: u32 = 16;
pub const FMT_D: u32 = 17;
pub const FMT_W: u32 = 20;

pub const FP_ADD: u32 = 0;
pub const FP_SUB: u32 = 1;
pub const FP_MUL: u32 = 2;
pub const FP_DIV: u32 = 3;
pub const FP_SQRT: u32 = 4;
pub const FP_ABS: u32 = 5;
pub const FP_MOV: u32 = 6;
pub const FP_NEG: u32 = 7;
pub const FP_TRUNC_W: u32 = 13;
pub const FP_CVT_D: u32 = 33;
pub const FP_CVT_W: u32 = 36;
pub const FP_C_COND: u32 = 48;

/// 软件断点陷阱字：`break 0`
pub const BREAK_INSTR: u32 = 0x0000_000D;
/// 空操作：`sll zr, zr, 0`
pub const NOP_INSTR: u32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imm_s_negative() {
        let raw = 0x2484FFFC; // addiu a0, a0, -4
        assert_eq!(imm_s(raw), -4);
        assert_eq!(imm_u(raw), 0xFFFC);
    }

    #[test]
    fn test_r_type_fields() {
        let raw = 0x00851821; // addu v1, a0, a1
        assert_eq!(opcode(raw), OP_SPECIAL);
        assert_eq!(rs(raw), 4);
        assert_eq!(rt(raw), 5);
        assert_eq!(rd(raw), 3);
        assert_eq!(sa(raw), 0);
        assert_eq!(funct(raw), FN_ADDU);
    }

    #[test]
    fn test_branch_offset() {
        let raw = 0x1000FFFF; // beq zr, zr, -4
        assert_eq!(branch_offset(raw), -4);
    }

    #[test]
    fn test_break_code() {
        assert_eq!(break_code(BREAK_INSTR), 0);
        assert_eq!(break_code(0x0001_234D), 0x48D);
    }
}
