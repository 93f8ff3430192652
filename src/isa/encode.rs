//! 指令编码辅助函数
//!
//! 调试器用它们生成断点/NOP，演示程序和测试用它们拼装目标代码。

use super::fields::*;

#[inline]
pub const fn r_type(opcode: u32, rs: u8, rt: u8, rd: u8, sa: u8, funct: u32) -> u32 {
    (opcode << 26)
        | ((rs as u32 & 0x1F) << 21)
        | ((rt as u32 & 0x1F) << 16)
        | ((rd as u32 & 0x1F) << 11)
        | ((sa as u32 & 0x1F) << 6)
        | (funct & 0x3F)
}

#[inline]
pub const fn i_type(opcode: u32, rs: u8, rt: u8, imm: u16) -> u32 {
    (opcode << 26) | ((rs as u32 & 0x1F) << 21) | ((rt as u32 & 0x1F) << 16) | imm as u32
}

#[inline]
pub const fn j_type(opcode: u32, index: u32) -> u32 {
    (opcode << 26) | (index & 0x03FF_FFFF)
}

#[inline]
pub const fn special(rs: u8, rt: u8, rd: u8, funct: u32) -> u32 {
    r_type(OP_SPECIAL, rs, rt, rd, 0, funct)
}

// ========== 常用指令 ==========

pub const fn nop() -> u32 {
    NOP_INSTR
}

pub const fn break_(code: u32) -> u32 {
    ((code & 0xFFFFF) << 6) | FN_BREAK
}

pub const fn sll(rd: u8, rt: u8, sa: u8) -> u32 {
    r_type(OP_SPECIAL, 0, rt, rd, sa, FN_SLL)
}

pub const fn srl(rd: u8, rt: u8, sa: u8) -> u32 {
    r_type(OP_SPECIAL, 0, rt, rd, sa, FN_SRL)
}

pub const fn sra(rd: u8, rt: u8, sa: u8) -> u32 {
    r_type(OP_SPECIAL, 0, rt, rd, sa, FN_SRA)
}

pub const fn jr(rs: u8) -> u32 {
    special(rs, 0, 0, FN_JR)
}

pub const fn jalr(rd: u8, rs: u8) -> u32 {
    special(rs, 0, rd, FN_JALR)
}

pub const fn add(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_ADD)
}

pub const fn addu(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_ADDU)
}

pub const fn sub(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_SUB)
}

pub const fn subu(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_SUBU)
}

pub const fn and(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_AND)
}

pub const fn or(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_OR)
}

pub const fn slt(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_SLT)
}

pub const fn movz(rd: u8, rs: u8, rt: u8) -> u32 {
    special(rs, rt, rd, FN_MOVZ)
}

pub const fn mult(rs: u8, rt: u8) -> u32 {
    special(rs, rt, 0, FN_MULT)
}

pub const fn multu(rs: u8, rt: u8) -> u32 {
    special(rs, rt, 0, FN_MULTU)
}

pub const fn div(rs: u8, rt: u8) -> u32 {
    special(rs, rt, 0, FN_DIV)
}

pub const fn divu(rs: u8, rt: u8) -> u32 {
    special(rs, rt, 0, FN_DIVU)
}

pub const fn mfhi(rd: u8) -> u32 {
    special(0, 0, rd, FN_MFHI)
}

pub const fn mflo(rd: u8) -> u32 {
    special(0, 0, rd, FN_MFLO)
}

pub const fn mul(rd: u8, rs: u8, rt: u8) -> u32 {
    r_type(OP_SPECIAL2, rs, rt, rd, 0, FN2_MUL)
}

pub const fn madd(rs: u8, rt: u8) -> u32 {
    r_type(OP_SPECIAL2, rs, rt, 0, 0, FN2_MADD)
}

pub const fn clz(rd: u8, rs: u8) -> u32 {
    r_type(OP_SPECIAL2, rs, rd, rd, 0, FN2_CLZ)
}

pub const fn clo(rd: u8, rs: u8) -> u32 {
    r_type(OP_SPECIAL2, rs, rd, rd, 0, FN2_CLO)
}

pub const fn addi(rt: u8, rs: u8, imm: i16) -> u32 {
    i_type(OP_ADDI, rs, rt, imm as u16)
}

pub const fn addiu(rt: u8, rs: u8, imm: i16) -> u32 {
    i_type(OP_ADDIU, rs, rt, imm as u16)
}

pub const fn slti(rt: u8, rs: u8, imm: i16) -> u32 {
    i_type(OP_SLTI, rs, rt, imm as u16)
}

pub const fn sltiu(rt: u8, rs: u8, imm: i16) -> u32 {
    i_type(OP_SLTIU, rs, rt, imm as u16)
}

pub const fn andi(rt: u8, rs: u8, imm: u16) -> u32 {
    i_type(OP_ANDI, rs, rt, imm)
}

pub const fn ori(rt: u8, rs: u8, imm: u16) -> u32 {
    i_type(OP_ORI, rs, rt, imm)
}

pub const fn lui(rt: u8, imm: u16) -> u32 {
    i_type(OP_LUI, 0, rt, imm)
}

pub const fn lb(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_LB, base, rt, offset as u16)
}

pub const fn lbu(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_LBU, base, rt, offset as u16)
}

pub const fn lh(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_LH, base, rt, offset as u16)
}

pub const fn lhu(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_LHU, base, rt, offset as u16)
}

pub const fn lw(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_LW, base, rt, offset as u16)
}

pub const fn sb(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_SB, base, rt, offset as u16)
}

pub const fn sh(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_SH, base, rt, offset as u16)
}

pub const fn sw(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_SW, base, rt, offset as u16)
}

/// `offset` 为以指令为单位的偏移（相对延迟槽）
pub const fn beq(rs: u8, rt: u8, offset: i16) -> u32 {
    i_type(OP_BEQ, rs, rt, offset as u16)
}

pub const fn bne(rs: u8, rt: u8, offset: i16) -> u32 {
    i_type(OP_BNE, rs, rt, offset as u16)
}

pub const fn blez(rs: u8, offset: i16) -> u32 {
    i_type(OP_BLEZ, rs, 0, offset as u16)
}

pub const fn bgtz(rs: u8, offset: i16) -> u32 {
    i_type(OP_BGTZ, rs, 0, offset as u16)
}

pub const fn bltz(rs: u8, offset: i16) -> u32 {
    i_type(OP_REGIMM, rs, RI_BLTZ as u8, offset as u16)
}

pub const fn bgezal(rs: u8, offset: i16) -> u32 {
    i_type(OP_REGIMM, rs, RI_BGEZAL as u8, offset as u16)
}

/// `target` 为绝对地址，取其 [27:2]
pub const fn j(target: u32) -> u32 {
    j_type(OP_J, target >> 2)
}

pub const fn jal(target: u32) -> u32 {
    j_type(OP_JAL, target >> 2)
}

// ========== COP1 ==========

pub const fn mtc1(rt: u8, fs: u8) -> u32 {
    r_type(OP_COP1, FMT_MT as u8, rt, fs, 0, 0)
}

pub const fn mfc1(rt: u8, fs: u8) -> u32 {
    r_type(OP_COP1, FMT_MF as u8, rt, fs, 0, 0)
}

pub const fn cfc1(rt: u8, fs: u8) -> u32 {
    r_type(OP_COP1, FMT_CF as u8, rt, fs, 0, 0)
}

pub const fn ctc1(rt: u8, fs: u8) -> u32 {
    r_type(OP_COP1, FMT_CT as u8, rt, fs, 0, 0)
}

pub const fn cop1_d(funct: u32, fd: u8, fs: u8, ft: u8) -> u32 {
    r_type(OP_COP1, FMT_D as u8, ft, fs, fd, funct)
}

pub const fn cvt_d_w(fd: u8, fs: u8) -> u32 {
    r_type(OP_COP1, FMT_W as u8, 0, fs, fd, FP_CVT_D)
}

pub const fn c_cond_d(cond: u8, fs: u8, ft: u8) -> u32 {
    r_type(OP_COP1, FMT_D as u8, ft, fs, 0, FP_C_COND | (cond as u32 & 0xF))
}

pub const fn bc1t(offset: i16) -> u32 {
    i_type(OP_COP1, FMT_BC as u8, 1, offset as u16)
}

pub const fn bc1f(offset: i16) -> u32 {
    i_type(OP_COP1, FMT_BC as u8, 0, offset as u16)
}

pub const fn ldc1(ft: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_LDC1, base, ft, offset as u16)
}

pub const fn sdc1(ft: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_SDC1, base, ft, offset as u16)
}

pub const fn lwc1(ft: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_LWC1, base, ft, offset as u16)
}

pub const fn swc1(ft: u8, base: u8, offset: i16) -> u32 {
    i_type(OP_SWC1, base, ft, offset as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::regs::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(addu(V1, A0, A1), 0x00851821);
        assert_eq!(jr(RA), 0x03E00008);
        assert_eq!(addiu(SP, SP, -8), 0x27BDFFF8);
        assert_eq!(lw(RA, SP, 4), 0x8FBF0004);
        assert_eq!(lui(AT, 0x1234), 0x3C011234);
        assert_eq!(break_(0), BREAK_INSTR);
        assert_eq!(nop(), NOP_INSTR);
    }

    #[test]
    fn test_mfc1_encoding() {
        assert_eq!(mfc1(V0, 4), 0x44022000);
        assert_eq!(mtc1(V0, 4), 0x44822000);
    }
}
