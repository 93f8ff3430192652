//! Text disassembler for the simulated instruction set.
//!
//! The debugger only depends on the [`Disassembler`] trait; hosts with a
//! richer disassembler plug theirs in through the simulator builder.

use std::io::Write;
use std::sync::Arc;

use super::decoder::DecoderRegistry;
use super::instr::MipsInstr;
use super::regs::cpu_reg_name;
use super::cop1::FP_COND_NAMES;
use super::IsaConfig;
use crate::memory::Memory;

/// Produces human-readable text for the words in `[start, end)`.
pub trait Disassembler: Send + Sync {
    /// Writes one line per instruction word. Returns false if any word could
    /// not be read or decoded.
    fn disassemble(&self, mem: &dyn Memory, start: u32, end: u32, out: &mut dyn Write) -> bool;
}

/// Built-in disassembler backed by the decoder tables.
pub struct MipsDisassembler {
    decoder: Arc<DecoderRegistry>,
}

impl MipsDisassembler {
    pub fn new(decoder: Arc<DecoderRegistry>) -> Self {
        Self { decoder }
    }
}

impl Default for MipsDisassembler {
    fn default() -> Self {
        let registry = IsaConfig::new()
            .with_fpu()
            .build()
            .unwrap_or_else(|_| DecoderRegistry::with_mips32());
        Self::new(Arc::new(registry))
    }
}

impl Disassembler for MipsDisassembler {
    fn disassemble(&self, mem: &dyn Memory, start: u32, end: u32, out: &mut dyn Write) -> bool {
        let mut ok = true;
        let mut pc = start;
        while pc < end {
            let line = match mem.load32(pc) {
                Ok(raw) => {
                    let decoded = self.decoder.decode(raw);
                    if decoded.is_illegal() {
                        ok = false;
                    }
                    format!("0x{:08x}  {:08x}  {}", pc, raw, format_instr(pc, &decoded.instr))
                }
                Err(err) => {
                    ok = false;
                    format!("0x{:08x}  ????????  <{}>", pc, err)
                }
            };
            if writeln!(out, "{}", line).is_err() {
                return false;
            }
            pc = match pc.checked_add(4) {
                Some(next) => next,
                None => break,
            };
        }
        ok
    }
}

fn r(reg: u8) -> &'static str {
    cpu_reg_name(reg)
}

fn branch_target(pc: u32, offset: i32) -> u32 {
    pc.wrapping_add(4).wrapping_add(offset as u32)
}

/// Formats one decoded instruction located at `pc`.
pub fn format_instr(pc: u32, instr: &MipsInstr) -> String {
    use MipsInstr::*;
    match *instr {
        Sll { rd: 0, rt: 0, sa: 0 } => "nop".to_string(),
        Sll { rd, rt, sa } => format!("sll {}, {}, {}", r(rd), r(rt), sa),
        Srl { rd, rt, sa } => format!("srl {}, {}, {}", r(rd), r(rt), sa),
        Sra { rd, rt, sa } => format!("sra {}, {}, {}", r(rd), r(rt), sa),
        Sllv { rd, rt, rs } => format!("sllv {}, {}, {}", r(rd), r(rt), r(rs)),
        Srlv { rd, rt, rs } => format!("srlv {}, {}, {}", r(rd), r(rt), r(rs)),
        Srav { rd, rt, rs } => format!("srav {}, {}, {}", r(rd), r(rt), r(rs)),
        Jr { rs } => format!("jr {}", r(rs)),
        Jalr { rd, rs } => format!("jalr {}, {}", r(rd), r(rs)),
        Movz { rd, rs, rt } => format!("movz {}, {}, {}", r(rd), r(rs), r(rt)),
        Movn { rd, rs, rt } => format!("movn {}, {}, {}", r(rd), r(rs), r(rt)),
        Break { code } => format!("break 0x{:x}", code),
        Mfhi { rd } => format!("mfhi {}", r(rd)),
        Mthi { rs } => format!("mthi {}", r(rs)),
        Mflo { rd } => format!("mflo {}", r(rd)),
        Mtlo { rs } => format!("mtlo {}", r(rs)),
        Mult { rs, rt } => format!("mult {}, {}", r(rs), r(rt)),
        Multu { rs, rt } => format!("multu {}, {}", r(rs), r(rt)),
        Div { rs, rt } => format!("div {}, {}", r(rs), r(rt)),
        Divu { rs, rt } => format!("divu {}, {}", r(rs), r(rt)),
        Add { rd, rs, rt } => format!("add {}, {}, {}", r(rd), r(rs), r(rt)),
        Addu { rd, rs, rt } => format!("addu {}, {}, {}", r(rd), r(rs), r(rt)),
        Sub { rd, rs, rt } => format!("sub {}, {}, {}", r(rd), r(rs), r(rt)),
        Subu { rd, rs, rt } => format!("subu {}, {}, {}", r(rd), r(rs), r(rt)),
        And { rd, rs, rt } => format!("and {}, {}, {}", r(rd), r(rs), r(rt)),
        Or { rd, rs, rt } => format!("or {}, {}, {}", r(rd), r(rs), r(rt)),
        Xor { rd, rs, rt } => format!("xor {}, {}, {}", r(rd), r(rs), r(rt)),
        Nor { rd, rs, rt } => format!("nor {}, {}, {}", r(rd), r(rs), r(rt)),
        Slt { rd, rs, rt } => format!("slt {}, {}, {}", r(rd), r(rs), r(rt)),
        Sltu { rd, rs, rt } => format!("sltu {}, {}, {}", r(rd), r(rs), r(rt)),
        Madd { rs, rt } => format!("madd {}, {}", r(rs), r(rt)),
        Maddu { rs, rt } => format!("maddu {}, {}", r(rs), r(rt)),
        Mul { rd, rs, rt } => format!("mul {}, {}, {}", r(rd), r(rs), r(rt)),
        Clz { rd, rs } => format!("clz {}, {}", r(rd), r(rs)),
        Clo { rd, rs } => format!("clo {}, {}", r(rd), r(rs)),
        Bltz { rs, offset } => format!("bltz {}, 0x{:08x}", r(rs), branch_target(pc, offset)),
        Bgez { rs, offset } => format!("bgez {}, 0x{:08x}", r(rs), branch_target(pc, offset)),
        Bltzal { rs, offset } => format!("bltzal {}, 0x{:08x}", r(rs), branch_target(pc, offset)),
        Bgezal { rs, offset } => format!("bgezal {}, 0x{:08x}", r(rs), branch_target(pc, offset)),
        J { index } => format!("j 0x{:08x}", (pc.wrapping_add(4) & 0xF000_0000) | (index << 2)),
        Jal { index } => format!("jal 0x{:08x}", (pc.wrapping_add(4) & 0xF000_0000) | (index << 2)),
        Beq { rs: 0, rt: 0, offset } => format!("b 0x{:08x}", branch_target(pc, offset)),
        Beq { rs, rt, offset } => format!("beq {}, {}, 0x{:08x}", r(rs), r(rt), branch_target(pc, offset)),
        Bne { rs, rt, offset } => format!("bne {}, {}, 0x{:08x}", r(rs), r(rt), branch_target(pc, offset)),
        Blez { rs, offset } => format!("blez {}, 0x{:08x}", r(rs), branch_target(pc, offset)),
        Bgtz { rs, offset } => format!("bgtz {}, 0x{:08x}", r(rs), branch_target(pc, offset)),
        Addi { rt, rs, imm } => format!("addi {}, {}, {}", r(rt), r(rs), imm),
        Addiu { rt, rs, imm } => format!("addiu {}, {}, {}", r(rt), r(rs), imm),
        Slti { rt, rs, imm } => format!("slti {}, {}, {}", r(rt), r(rs), imm),
        Sltiu { rt, rs, imm } => format!("sltiu {}, {}, {}", r(rt), r(rs), imm),
        Andi { rt, rs, imm } => format!("andi {}, {}, 0x{:x}", r(rt), r(rs), imm),
        Ori { rt, rs, imm } => format!("ori {}, {}, 0x{:x}", r(rt), r(rs), imm),
        Xori { rt, rs, imm } => format!("xori {}, {}, 0x{:x}", r(rt), r(rs), imm),
        Lui { rt, imm } => format!("lui {}, 0x{:x}", r(rt), imm),
        Lb { rt, base, offset } => format!("lb {}, {}({})", r(rt), offset, r(base)),
        Lh { rt, base, offset } => format!("lh {}, {}({})", r(rt), offset, r(base)),
        Lw { rt, base, offset } => format!("lw {}, {}({})", r(rt), offset, r(base)),
        Lbu { rt, base, offset } => format!("lbu {}, {}({})", r(rt), offset, r(base)),
        Lhu { rt, base, offset } => format!("lhu {}, {}({})", r(rt), offset, r(base)),
        Sb { rt, base, offset } => format!("sb {}, {}({})", r(rt), offset, r(base)),
        Sh { rt, base, offset } => format!("sh {}, {}({})", r(rt), offset, r(base)),
        Sw { rt, base, offset } => format!("sw {}, {}({})", r(rt), offset, r(base)),
        Mfc1 { rt, fs } => format!("mfc1 {}, f{}", r(rt), fs),
        Mtc1 { rt, fs } => format!("mtc1 {}, f{}", r(rt), fs),
        Cfc1 { rt, fs } => format!("cfc1 {}, f{}", r(rt), fs),
        Ctc1 { rt, fs } => format!("ctc1 {}, f{}", r(rt), fs),
        Lwc1 { ft, base, offset } => format!("lwc1 f{}, {}({})", ft, offset, r(base)),
        Swc1 { ft, base, offset } => format!("swc1 f{}, {}({})", ft, offset, r(base)),
        Ldc1 { ft, base, offset } => format!("ldc1 f{}, {}({})", ft, offset, r(base)),
        Sdc1 { ft, base, offset } => format!("sdc1 f{}, {}({})", ft, offset, r(base)),
        AddD { fd, fs, ft } => format!("add.d f{}, f{}, f{}", fd, fs, ft),
        SubD { fd, fs, ft } => format!("sub.d f{}, f{}, f{}", fd, fs, ft),
        MulD { fd, fs, ft } => format!("mul.d f{}, f{}, f{}", fd, fs, ft),
        DivD { fd, fs, ft } => format!("div.d f{}, f{}, f{}", fd, fs, ft),
        SqrtD { fd, fs } => format!("sqrt.d f{}, f{}", fd, fs),
        AbsD { fd, fs } => format!("abs.d f{}, f{}", fd, fs),
        MovD { fd, fs } => format!("mov.d f{}, f{}", fd, fs),
        NegD { fd, fs } => format!("neg.d f{}, f{}", fd, fs),
        CvtDW { fd, fs } => format!("cvt.d.w f{}, f{}", fd, fs),
        CvtWD { fd, fs } => format!("cvt.w.d f{}, f{}", fd, fs),
        TruncWD { fd, fs } => format!("trunc.w.d f{}, f{}", fd, fs),
        CondD { cond, fs, ft } => format!("c.{}.d f{}, f{}", FP_COND_NAMES[(cond & 0xF) as usize], fs, ft),
        Bc1f { offset } => format!("bc1f 0x{:08x}", branch_target(pc, offset)),
        Bc1t { offset } => format!("bc1t 0x{:08x}", branch_target(pc, offset)),
        Illegal { raw } => format!("<unknown 0x{:08x}>", raw),
    }
}
