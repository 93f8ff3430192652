//! COP1 浮点协处理器指令解码器
//!
//! 只覆盖双精度 (.D) 运算、整数/浮点搬移、条件比较与 BC1 分支。
//! 双精度值占用偶/奇寄存器对，.D 操作数为奇数寄存器的编码不被接受。

use crate::isa::fields::*;
use crate::isa::instr::MipsInstr;
use crate::isa::instr_def::{
    InstrDef, TableDrivenDecoder,
    OP_MASK, COP1_MOVE_MASK, COP1_BRANCH_MASK, COP1_D3_MASK, COP1_D2_MASK,
    COP1_D_TO_W_MASK, COP1_W_TO_D_MASK, COP1_COND_MASK, COP1_PAIR_MEM_MASK,
    op_match, cop1_match,
};

/// C.cond.fmt 的 16 种条件名，按编码排列
pub const FP_COND_NAMES: [&str; 16] = [
    "f", "un", "eq", "ueq", "olt", "ult", "ole", "ule",
    "sf", "ngle", "seq", "ngl", "lt", "nge", "le", "ngt",
];

/// COP1 指令定义表
pub static COP1_INSTRS: &[InstrDef] = &[
    // ========== 寄存器搬移 ==========
    InstrDef::new("MFC1", COP1_MOVE_MASK, cop1_match(FMT_MF, 0), |raw| MipsInstr::Mfc1 {
        rt: rt(raw),
        fs: fs(raw),
    }),
    InstrDef::new("CFC1", COP1_MOVE_MASK, cop1_match(FMT_CF, 0), |raw| MipsInstr::Cfc1 {
        rt: rt(raw),
        fs: fs(raw),
    }),
    InstrDef::new("MTC1", COP1_MOVE_MASK, cop1_match(FMT_MT, 0), |raw| MipsInstr::Mtc1 {
        rt: rt(raw),
        fs: fs(raw),
    }),
    InstrDef::new("CTC1", COP1_MOVE_MASK, cop1_match(FMT_CT, 0), |raw| MipsInstr::Ctc1 {
        rt: rt(raw),
        fs: fs(raw),
    }),

    // ========== BC1F / BC1T ==========
    InstrDef::new("BC1F", COP1_BRANCH_MASK, cop1_match(FMT_BC, 0), |raw| MipsInstr::Bc1f {
        offset: branch_offset(raw),
    }),
    InstrDef::new("BC1T", COP1_BRANCH_MASK, cop1_match(FMT_BC, 0) | (1 << 16), |raw| MipsInstr::Bc1t {
        offset: branch_offset(raw),
    }),

    // ========== .D 算术 ==========
    InstrDef::new("ADD.D", COP1_D3_MASK, cop1_match(FMT_D, FP_ADD), |raw| MipsInstr::AddD {
        fd: fd(raw),
        fs: fs(raw),
        ft: ft(raw),
    }),
    InstrDef::new("SUB.D", COP1_D3_MASK, cop1_match(FMT_D, FP_SUB), |raw| MipsInstr::SubD {
        fd: fd(raw),
        fs: fs(raw),
        ft: ft(raw),
    }),
    InstrDef::new("MUL.D", COP1_D3_MASK, cop1_match(FMT_D, FP_MUL), |raw| MipsInstr::MulD {
        fd: fd(raw),
        fs: fs(raw),
        ft: ft(raw),
    }),
    InstrDef::new("DIV.D", COP1_D3_MASK, cop1_match(FMT_D, FP_DIV), |raw| MipsInstr::DivD {
        fd: fd(raw),
        fs: fs(raw),
        ft: ft(raw),
    }),
    InstrDef::new("SQRT.D", COP1_D2_MASK, cop1_match(FMT_D, FP_SQRT), |raw| MipsInstr::SqrtD {
        fd: fd(raw),
        fs: fs(raw),
    }),
    InstrDef::new("ABS.D", COP1_D2_MASK, cop1_match(FMT_D, FP_ABS), |raw| MipsInstr::AbsD {
        fd: fd(raw),
        fs: fs(raw),
    }),
    InstrDef::new("MOV.D", COP1_D2_MASK, cop1_match(FMT_D, FP_MOV), |raw| MipsInstr::MovD {
        fd: fd(raw),
        fs: fs(raw),
    }),
    InstrDef::new("NEG.D", COP1_D2_MASK, cop1_match(FMT_D, FP_NEG), |raw| MipsInstr::NegD {
        fd: fd(raw),
        fs: fs(raw),
    }),

    // ========== 转换 ==========
    InstrDef::new("TRUNC.W.D", COP1_D_TO_W_MASK, cop1_match(FMT_D, FP_TRUNC_W), |raw| MipsInstr::TruncWD {
        fd: fd(raw),
        fs: fs(raw),
    }),
    InstrDef::new("CVT.W.D", COP1_D_TO_W_MASK, cop1_match(FMT_D, FP_CVT_W), |raw| MipsInstr::CvtWD {
        fd: fd(raw),
        fs: fs(raw),
    }),
    InstrDef::new("CVT.D.W", COP1_W_TO_D_MASK, cop1_match(FMT_W, FP_CVT_D), |raw| MipsInstr::CvtDW {
        fd: fd(raw),
        fs: fs(raw),
    }),

    // ========== 比较 ==========
    InstrDef::new("C.cond.D", COP1_COND_MASK, cop1_match(FMT_D, FP_C_COND), |raw| MipsInstr::CondD {
        cond: fp_cond(raw),
        fs: fs(raw),
        ft: ft(raw),
    }),

    // ========== 访存 ==========
    InstrDef::new("LWC1", OP_MASK, op_match(OP_LWC1), |raw| MipsInstr::Lwc1 {
        ft: ft(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("SWC1", OP_MASK, op_match(OP_SWC1), |raw| MipsInstr::Swc1 {
        ft: ft(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("LDC1", COP1_PAIR_MEM_MASK, op_match(OP_LDC1), |raw| MipsInstr::Ldc1 {
        ft: ft(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
    InstrDef::new("SDC1", COP1_PAIR_MEM_MASK, op_match(OP_SDC1), |raw| MipsInstr::Sdc1 {
        ft: ft(raw),
        base: rs(raw),
        offset: imm_s(raw),
    }),
];

/// COP1 的主 opcode 列表
pub static COP1_OPCODES: [u32; 5] = [OP_COP1, OP_LWC1, OP_LDC1, OP_SWC1, OP_SDC1];

/// COP1 解码器（基于 TableDrivenDecoder）
pub static COP1_DECODER: TableDrivenDecoder = TableDrivenDecoder::new(
    "COP1",
    COP1_INSTRS,
    Some(&COP1_OPCODES),
    false,
);
