//! MIPS32 整数指令集解码器
//!
//! 基于表驱动的解码实现，覆盖代码生成器实际发出的整数子集

use crate::isa::fields::*;
use crate::isa::instr::MipsInstr;
use crate::isa::instr_def::{
    InstrDef, TableDrivenDecoder,
    OP_MASK, OP_RS0_MASK, OP_RT0_MASK, R_TYPE_MASK, SHIFT_IMM_MASK, MULDIV_MASK,
    MOVE_FROM_HILO_MASK, MOVE_TO_HILO_MASK, JR_MASK, JALR_MASK, FUNCT_ONLY_MASK,
    REGIMM_MASK,
    op_match, funct_match, regimm_match,
};

/// MIPS32 指令定义表
pub static MIPS32_INSTRS: &[InstrDef] = &[
    // ========== SPECIAL: 移位 ==========
    InstrDef::new("SLL", SHIFT_IMM_MASK, funct_match(OP_SPECIAL, FN_SLL), |raw| MipsInstr::Sll {
        rd: rd(raw),
        rt: rt(raw),
        sa: sa(raw),
    }),
    InstrDef::new("SRL", SHIFT_IMM_MASK, funct_match(OP_SPECIAL, FN_SRL), |raw| MipsInstr::Srl {
        rd: rd(raw),
        rt: rt(raw),
        sa: sa(raw),
    }),
    InstrDef::new("SRA", SHIFT_IMM_MASK, funct_match(OP_SPECIAL, FN_SRA), |raw| MipsInstr::Sra {
        rd: rd(raw),
        rt: rt(raw),
        sa: sa(raw),
    }),
    InstrDef::new("SLLV", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_SLLV), |raw| MipsInstr::Sllv {
        rd: rd(raw),
        rt: rt(raw),
        rs: rs(raw),
    }),
    InstrDef::new("SRLV", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_SRLV), |raw| MipsInstr::Srlv {
        rd: rd(raw),
        rt: rt(raw),
        rs: rs(raw),
    }),
    InstrDef::new("SRAV", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_SRAV), |raw| MipsInstr::Srav {
        rd: rd(raw),
        rt: rt(raw),
        rs: rs(raw),
    }),

    // ========== SPECIAL: 跳转 ==========
    InstrDef::new("JR", JR_MASK, funct_match(OP_SPECIAL, FN_JR), |raw| MipsInstr::Jr { rs: rs(raw) }),
    InstrDef::new("JALR", JALR_MASK, funct_match(OP_SPECIAL, FN_JALR), |raw| MipsInstr::Jalr {
        rd: rd(raw),
        rs: rs(raw),
    }),

    // ========== SPECIAL: 条件移动 / 断点 ==========
    InstrDef::new("MOVZ", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_MOVZ), |raw| MipsInstr::Movz {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("MOVN", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_MOVN), |raw| MipsInstr::Movn {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("BREAK", FUNCT_ONLY_MASK, funct_match(OP_SPECIAL, FN_BREAK), |raw| MipsInstr::Break {
        code: break_code(raw),
    }),

    // ========== SPECIAL: HI/LO ==========
    InstrDef::new("MFHI", MOVE_FROM_HILO_MASK, funct_match(OP_SPECIAL, FN_MFHI), |raw| MipsInstr::Mfhi { rd: rd(raw) }),
    InstrDef::new("MTHI", MOVE_TO_HILO_MASK, funct_match(OP_SPECIAL, FN_MTHI), |raw| MipsInstr::Mthi { rs: rs(raw) }),
    InstrDef::new("MFLO", MOVE_FROM_HILO_MASK, funct_match(OP_SPECIAL, FN_MFLO), |raw| MipsInstr::Mflo { rd: rd(raw) }),
    InstrDef::new("MTLO", MOVE_TO_HILO_MASK, funct_match(OP_SPECIAL, FN_MTLO), |raw| MipsInstr::Mtlo { rs: rs(raw) }),
    InstrDef::new("MULT", MULDIV_MASK, funct_match(OP_SPECIAL, FN_MULT), |raw| MipsInstr::Mult {
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("MULTU", MULDIV_MASK, funct_match(OP_SPECIAL, FN_MULTU), |raw| MipsInstr::Multu {
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("DIV", MULDIV_MASK, funct_match(OP_SPECIAL, FN_DIV), |raw| MipsInstr::Div {
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("DIVU", MULDIV_MASK, funct_match(OP_SPECIAL, FN_DIVU), |raw| MipsInstr::Divu {
        rs: rs(raw),
        rt: rt(raw),
    }),

    // ========== SPECIAL: 算术/逻辑 ==========
    InstrDef::new("ADD", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_ADD), |raw| MipsInstr::Add {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("ADDU", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_ADDU), |raw| MipsInstr::Addu {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("SUB", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_SUB), |raw| MipsInstr::Sub {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("SUBU", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_SUBU), |raw| MipsInstr::Subu {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("AND", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_AND), |raw| MipsInstr::And {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("OR", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_OR), |raw| MipsInstr::Or {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("XOR", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_XOR), |raw| MipsInstr::Xor {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("NOR", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_NOR), |raw| MipsInstr::Nor {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("SLT", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_SLT), |raw| MipsInstr::Slt {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("SLTU", R_TYPE_MASK, funct_match(OP_SPECIAL, FN_SLTU), |raw| MipsInstr::Sltu {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),

    // ========== SPECIAL2 ==========
    InstrDef::new("MADD", MULDIV_MASK, funct_match(OP_SPECIAL2, FN2_MADD), |raw| MipsInstr::Madd {
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("MADDU", MULDIV_MASK, funct_match(OP_SPECIAL2, FN2_MADDU), |raw| MipsInstr::Maddu {
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("MUL", R_TYPE_MASK, funct_match(OP_SPECIAL2, FN2_MUL), |raw| MipsInstr::Mul {
        rd: rd(raw),
        rs: rs(raw),
        rt: rt(raw),
    }),
    InstrDef::new("CLZ", R_TYPE_MASK, funct_match(OP_SPECIAL2, FN2_CLZ), |raw| MipsInstr::Clz {
        rd: rd(raw),
        rs: rs(raw),
    }),
    InstrDef::new("CLO", R_TYPE_MASK, funct_match(OP_SPECIAL2, FN2_CLO), |raw| MipsInstr::Clo {
        rd: rd(raw),
        rs: rs(raw),
    }),

    // ========== REGIMM ==========
    InstrDef::new("BLTZ", REGIMM_MASK, regimm_match(RI_BLTZ), |raw| MipsInstr::Bltz {
        rs: rs(raw),
        offset: branch_offset(raw),
    }),
    InstrDef::new("BGEZ", REGIMM_MASK, regimm_match(RI_BGEZ), |raw| MipsInstr::Bgez {
        rs: rs(raw),
        offset: branch_offset(raw),
    }),
    InstrDef::new("BLTZAL", REGIMM_MASK, regimm_match(RI_BLTZAL), |raw| MipsInstr::Bltzal {
        rs: rs(raw),
        offset: branch_offset(raw),
    }),
    InstrDef::new("BGEZAL", REGIMM_MASK, regimm_match(RI_BGEZAL), |raw| MipsInstr::Bgezal {
        rs: rs(raw),
        offset: branch_offset(raw),
    }),

    // ========== J-type ==========
    InstrDef::new("J", OP_MASK, op_match(OP_J), |raw| MipsInstr::J { index: jump_index(raw) }),
    InstrDef::new("JAL", OP_MASK, op_match(OP_JAL), |raw| MipsInstr::Jal { index: jump_index(raw) }),

    // ========== 比较分支 ==========
    InstrDef::new("BEQ", OP_MASK, op_match(OP_BEQ), |raw| MipsInstr::Beq {
        rs: rs(raw),
        rt: rt(raw),
        offset: branch_offset(raw),
    }),
    InstrDef::new("BNE", OP_MASK, op_match(OP_BNE), |raw| MipsInstr::Bne {
        rs: rs(raw),
        rt: rt(raw),
        offset: branch_offset(raw),
    }),
    InstrDef::new("BLEZ", OP_RT0_MASK, op_match(OP_BLEZ), |raw| MipsInstr::Blez {
        rs: rs(raw),
        offset: branch_offset(raw),
    }),
    InstrDef::new("BGTZ", OP_RT0_MASK, op_match(OP_BGTZ), |raw| MipsInstr::Bgtz {
        rs: rs(raw),
        offset: branch_offset(raw),
    }),

    // ========== 立即数算术/逻辑 ==========
    InstrDef::new("ADDI", OP_MASK, op_match(OP_ADDI), |raw| MipsInstr::Addi {
        rt: rt(raw),
        rs: rs(raw),
        imm: imm_s(raw),
    }),
    InstrDef::new("ADDIU", OP_MASK, op_match(OP_ADDIU), |raw| MipsInstr::Addiu {
        rt: rt(raw),
        rs: rs(raw),
        imm: imm_s(raw),
    }),
    InstrDef::new("SLTI", OP_MASK, op_match(OP_SLTI), |raw| MipsInstr::Slti {
        rt: rt(raw),
        rs: rs(raw),
        imm: imm_s(raw),
    }),
    InstrDef::new("SLTIU", OP_MASK, op_match(OP_SLTIU), |raw| MipsInstr::Sltiu {
        rt: rt(raw),
        rs: rs(raw),
        imm: imm_s(raw),
    }),
    InstrDef::new("ANDI", OP_MASK, op_match(OP_ANDI), |raw| MipsInstr::Andi {
        rt: rt(raw),
        rs: rs(raw),
        imm: imm_u(raw),
    }),
    InstrDef::new("ORI", OP_MASK, op_match(OP_ORI), |raw| MipsInstr::Ori {
        rt: rt(raw),
        rs: rs(raw),
        imm: imm_u(raw),
    }),
    InstrDef::new("XORI", OP_MASK, op_match(OP_XORI), |raw| MipsInstr::Xori {
        rt: rt(raw),
        rs: rs(raw),
        imm: imm_u(raw),
    }),
    InstrDef::new("LUI", OP_RS0_MASK, op_match(OP_LUI), |raw| MipsInstr::Lui {
        rt: rt(raw),
        imm: imm_u(raw),
    }),

    // ========== Load ==========
    InstrDef::new("LB", OP_MASK, op_match(OP_LB), |raw| MipsInstr::Lb {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("LH", OP_MASK, op_match(OP_LH), |raw| MipsInstr::Lh {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("LW", OP_MASK, op_match(OP_LW), |raw| MipsInstr::Lw {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("LBU", OP_MASK, op_match(OP_LBU), |raw| MipsInstr::Lbu {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("LHU", OP_MASK, op_match(OP_LHU), |raw| MipsInstr::Lhu {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),

    // ========== Store ==========
    InstrDef::new("SB", OP_MASK, op_match(OP_SB), |raw| MipsInstr::Sb {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("SH", OP_MASK, op_match(OP_SH), |raw| MipsInstr::Sh {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("SW", OP_MASK, op_match(OP_SW), |raw| MipsInstr::Sw {
        rt: rt(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
];

/// MIPS32 整数指令的主 opcode 列表
pub static MIPS32_OPCODES: [u32; 25] = [
    OP_SPECIAL, OP_REGIMM, OP_J, OP_JAL, OP_BEQ, OP_BNE, OP_BLEZ, OP_BGTZ,
    OP_ADDI, OP_ADDIU, OP_SLTI, OP_SLTIU, OP_ANDI, OP_ORI, OP_XORI, OP_LUI,
    OP_SPECIAL2, OP_LB, OP_LH, OP_LW, OP_LBU, OP_LHU, OP_SB, OP_SH, OP_SW,
];

// ========== 解码器实例 ==========

/// MIPS32 解码器（基于 TableDrivenDecoder）
pub static MIPS32_DECODER: TableDrivenDecoder = TableDrivenDecoder::new(
    "MIPS32",
    MIPS32_INSTRS,
    Some(&MIPS32_OPCODES),
    false,
);
