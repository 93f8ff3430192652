//! 定义指令的语义表达式，用于解码、执行和反汇编阶段

/// MIPS32 指令的语义化表示
///
/// 解码阶段一次性完成字段提取与符号扩展，执行单元只面对操作数。
/// 分支偏移已左移 2 位；J/JAL 的 `index` 保留原始 26-bit 字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipsInstr {
    // ========== SPECIAL: 移位 ==========
    /// SLL: rd = rt << sa（rd = rt = sa = 0 即 NOP）
    Sll { rd: u8, rt: u8, sa: u8 },
    /// SRL: rd = rt >> sa (逻辑右移)
    Srl { rd: u8, rt: u8, sa: u8 },
    /// SRA: rd = rt >> sa (算术右移)
    Sra { rd: u8, rt: u8, sa: u8 },
    /// SLLV: rd = rt << rs[4:0]
    Sllv { rd: u8, rt: u8, rs: u8 },
    /// SRLV: rd = rt >> rs[4:0]
    Srlv { rd: u8, rt: u8, rs: u8 },
    /// SRAV: rd = rt >> rs[4:0] (算术)
    Srav { rd: u8, rt: u8, rs: u8 },

    // ========== SPECIAL: 寄存器跳转 ==========
    /// JR: pc = rs（带延迟槽）
    Jr { rs: u8 },
    /// JALR: rd = pc + 8; pc = rs（带延迟槽）
    Jalr { rd: u8, rs: u8 },

    // ========== SPECIAL: 条件移动 / 陷阱 ==========
    /// MOVZ: if rt == 0 { rd = rs }
    Movz { rd: u8, rs: u8, rt: u8 },
    /// MOVN: if rt != 0 { rd = rs }
    Movn { rd: u8, rs: u8, rt: u8 },
    /// BREAK: 软件断点，进入调试器
    Break { code: u32 },

    // ========== SPECIAL: HI/LO ==========
    Mfhi { rd: u8 },
    Mthi { rs: u8 },
    Mflo { rd: u8 },
    Mtlo { rs: u8 },
    /// MULT: hi:lo = rs * rt (有符号)
    Mult { rs: u8, rt: u8 },
    /// MULTU: hi:lo = rs * rt (无符号)
    Multu { rs: u8, rt: u8 },
    /// DIV: lo = rs / rt, hi = rs % rt (有符号)
    Div { rs: u8, rt: u8 },
    /// DIVU: lo = rs / rt, hi = rs % rt (无符号)
    Divu { rs: u8, rt: u8 },

    // ========== SPECIAL: 三寄存器算术/逻辑 ==========
    /// ADD: rd = rs + rt，有符号溢出时陷入
    Add { rd: u8, rs: u8, rt: u8 },
    /// ADDU: rd = rs + rt，不检查溢出
    Addu { rd: u8, rs: u8, rt: u8 },
    /// SUB: rd = rs - rt，有符号溢出时陷入
    Sub { rd: u8, rs: u8, rt: u8 },
    /// SUBU: rd = rs - rt
    Subu { rd: u8, rs: u8, rt: u8 },
    And { rd: u8, rs: u8, rt: u8 },
    Or { rd: u8, rs: u8, rt: u8 },
    Xor { rd: u8, rs: u8, rt: u8 },
    Nor { rd: u8, rs: u8, rt: u8 },
    /// SLT: rd = (rs < rt) ? 1 : 0 (有符号比较)
    Slt { rd: u8, rs: u8, rt: u8 },
    /// SLTU: rd = (rs < rt) ? 1 : 0 (无符号比较)
    Sltu { rd: u8, rs: u8, rt: u8 },

    // ========== SPECIAL2 ==========
    /// MADD: hi:lo += rs * rt (有符号)
    Madd { rs: u8, rt: u8 },
    /// MADDU: hi:lo += rs * rt (无符号)
    Maddu { rs: u8, rt: u8 },
    /// MUL: rd = (rs * rt)[31:0]，hi/lo 不可预测，此处保持不变
    Mul { rd: u8, rs: u8, rt: u8 },
    /// CLZ: rd = 前导零个数
    Clz { rd: u8, rs: u8 },
    /// CLO: rd = 前导一个数
    Clo { rd: u8, rs: u8 },

    // ========== REGIMM 分支 ==========
    Bltz { rs: u8, offset: i32 },
    Bgez { rs: u8, offset: i32 },
    /// BLTZAL: ra = pc + 8，无论是否跳转
    Bltzal { rs: u8, offset: i32 },
    Bgezal { rs: u8, offset: i32 },

    // ========== 跳转与比较分支 ==========
    /// J: pc = (pc + 4)[31:28] | index << 2
    J { index: u32 },
    /// JAL: ra = pc + 8; 同 J
    Jal { index: u32 },
    Beq { rs: u8, rt: u8, offset: i32 },
    Bne { rs: u8, rt: u8, offset: i32 },
    Blez { rs: u8, offset: i32 },
    Bgtz { rs: u8, offset: i32 },

    // ========== 立即数算术/逻辑 ==========
    /// ADDI: rt = rs + imm，有符号溢出时陷入
    Addi { rt: u8, rs: u8, imm: i32 },
    /// ADDIU: rt = rs + imm，溢出时照常写回
    Addiu { rt: u8, rs: u8, imm: i32 },
    Slti { rt: u8, rs: u8, imm: i32 },
    /// SLTIU: 立即数先符号扩展再按无符号比较
    Sltiu { rt: u8, rs: u8, imm: i32 },
    /// ANDI/ORI/XORI 的立即数为零扩展
    Andi { rt: u8, rs: u8, imm: u32 },
    Ori { rt: u8, rs: u8, imm: u32 },
    Xori { rt: u8, rs: u8, imm: u32 },
    /// LUI: rt = imm << 16
    Lui { rt: u8, imm: u32 },

    // ========== Load / Store ==========
    Lb { rt: u8, base: u8, offset: i32 },
    Lh { rt: u8, base: u8, offset: i32 },
    Lw { rt: u8, base: u8, offset: i32 },
    Lbu { rt: u8, base: u8, offset: i32 },
    Lhu { rt: u8, base: u8, offset: i32 },
    Sb { rt: u8, base: u8, offset: i32 },
    Sh { rt: u8, base: u8, offset: i32 },
    Sw { rt: u8, base: u8, offset: i32 },

    // ========== COP1（浮点）==========
    /// MFC1: rt = fs 的位模式
    Mfc1 { rt: u8, fs: u8 },
    /// MTC1: fs = rt 的位模式
    Mtc1 { rt: u8, fs: u8 },
    /// CFC1: rt = FCR[fs]
    Cfc1 { rt: u8, fs: u8 },
    /// CTC1: FCR[fs] = rt
    Ctc1 { rt: u8, fs: u8 },
    Lwc1 { ft: u8, base: u8, offset: i32 },
    Swc1 { ft: u8, base: u8, offset: i32 },
    /// LDC1: 偶/奇寄存器对 = M[base + offset]（64-bit）
    Ldc1 { ft: u8, base: u8, offset: i32 },
    Sdc1 { ft: u8, base: u8, offset: i32 },
    AddD { fd: u8, fs: u8, ft: u8 },
    SubD { fd: u8, fs: u8, ft: u8 },
    MulD { fd: u8, fs: u8, ft: u8 },
    DivD { fd: u8, fs: u8, ft: u8 },
    SqrtD { fd: u8, fs: u8 },
    AbsD { fd: u8, fs: u8 },
    MovD { fd: u8, fs: u8 },
    NegD { fd: u8, fs: u8 },
    /// CVT.D.W: fd(双精度) = fs 中的 32-bit 整数
    CvtDW { fd: u8, fs: u8 },
    /// CVT.W.D: 按 FCSR 舍入模式转为整数
    CvtWD { fd: u8, fs: u8 },
    /// TRUNC.W.D: 向零舍入转为整数
    TruncWD { fd: u8, fs: u8 },
    /// C.cond.D: FCSR 条件位 = cond(fs, ft)
    CondD { cond: u8, fs: u8, ft: u8 },
    Bc1f { offset: i32 },
    Bc1t { offset: i32 },

    // ========== 特殊 ==========
    /// 指令子集之外的编码
    Illegal { raw: u32 },
}

impl MipsInstr {
    /// 是否为控制转移指令（带延迟槽）
    pub fn is_control_transfer(&self) -> bool {
        matches!(
            self,
            MipsInstr::Jr { .. }
                | MipsInstr::Jalr { .. }
                | MipsInstr::J { .. }
                | MipsInstr::Jal { .. }
                | MipsInstr::Beq { .. }
                | MipsInstr::Bne { .. }
                | MipsInstr::Blez { .. }
                | MipsInstr::Bgtz { .. }
                | MipsInstr::Bltz { .. }
                | MipsInstr::Bgez { .. }
                | MipsInstr::Bltzal { .. }
                | MipsInstr::Bgezal { .. }
                | MipsInstr::Bc1f { .. }
                | MipsInstr::Bc1t { .. }
        )
    }

    /// 是否为 NOP（`sll zr, zr, 0`）
    pub fn is_nop(&self) -> bool {
        matches!(self, MipsInstr::Sll { rd: 0, rt: 0, sa: 0 })
    }
}

/// 已解码的指令
///
/// 包含原始编码与解码后的语义信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstr {
    /// 原始 32-bit 指令编码
    pub raw: u32,
    /// 解码后的语义表示
    pub instr: MipsInstr,
}

impl DecodedInstr {
    pub fn is_illegal(&self) -> bool {
        matches!(self.instr, MipsInstr::Illegal { .. })
    }
}
