//! ISA 模块测试

use super::*;
use super::regs::*;

#[test]
fn test_decode_addu() {
    let raw = 0x00851821; // addu v1, a0, a1
    let decoded = decode(raw);
    assert_eq!(decoded.instr, MipsInstr::Addu { rd: V1, rs: A0, rt: A1 });
}

#[test]
fn test_decode_addiu_negative() {
    let raw = 0x27BDFFF8; // addiu sp, sp, -8
    let decoded = decode(raw);
    assert_eq!(decoded.instr, MipsInstr::Addiu { rt: SP, rs: SP, imm: -8 });
}

#[test]
fn test_decode_nop_and_break() {
    assert!(decode(NOP_INSTR).instr.is_nop());
    assert_eq!(decode(BREAK_INSTR).instr, MipsInstr::Break { code: 0 });
}

#[test]
fn test_decode_jr() {
    let decoded = decode(0x03E00008); // jr ra
    assert_eq!(decoded.instr, MipsInstr::Jr { rs: RA });
    assert!(decoded.instr.is_control_transfer());
}

#[test]
fn test_decode_jr_with_rt_is_illegal() {
    // jr 的 rt 字段必须为 0
    assert!(decode(0x03E00008 | (1 << 16)).is_illegal());
}

#[test]
fn test_decode_load_store() {
    assert_eq!(decode(0x8FBF0004).instr, MipsInstr::Lw { rt: RA, base: SP, offset: 4 });
    assert_eq!(
        decode(encode::sh(T0, A0, -2)).instr,
        MipsInstr::Sh { rt: T0, base: A0, offset: -2 }
    );
    assert_eq!(
        decode(encode::lbu(T1, GP, 0x7FFF)).instr,
        MipsInstr::Lbu { rt: T1, base: GP, offset: 0x7FFF }
    );
}

#[test]
fn test_decode_branches() {
    assert_eq!(decode(encode::beq(A0, A1, 3)).instr, MipsInstr::Beq { rs: A0, rt: A1, offset: 12 });
    assert_eq!(decode(encode::bltz(A0, -1)).instr, MipsInstr::Bltz { rs: A0, offset: -4 });
    assert_eq!(decode(encode::bgezal(S0, 2)).instr, MipsInstr::Bgezal { rs: S0, offset: 8 });
    assert_eq!(decode(encode::jal(0x0040_0010)).instr, MipsInstr::Jal { index: 0x0010_0004 });
}

#[test]
fn test_decode_special2() {
    assert_eq!(decode(encode::mul(V0, A0, A1)).instr, MipsInstr::Mul { rd: V0, rs: A0, rt: A1 });
    assert_eq!(decode(encode::clz(V0, A0)).instr, MipsInstr::Clz { rd: V0, rs: A0 });
    assert_eq!(decode(encode::madd(A0, A1)).instr, MipsInstr::Madd { rs: A0, rt: A1 });
}

#[test]
fn test_decode_cop1() {
    assert_eq!(
        decode(encode::cop1_d(FP_ADD, 0, 2, 4)).instr,
        MipsInstr::AddD { fd: 0, fs: 2, ft: 4 }
    );
    assert_eq!(decode(encode::cvt_d_w(2, 5)).instr, MipsInstr::CvtDW { fd: 2, fs: 5 });
    assert_eq!(decode(encode::c_cond_d(2, 0, 2)).instr, MipsInstr::CondD { cond: 2, fs: 0, ft: 2 });
    assert_eq!(decode(encode::bc1t(4)).instr, MipsInstr::Bc1t { offset: 16 });
    assert_eq!(decode(encode::ldc1(4, SP, 8)).instr, MipsInstr::Ldc1 { ft: 4, base: SP, offset: 8 });
}

#[test]
fn test_decode_odd_double_register_illegal() {
    // add.d f1, f2, f4: fd 为奇数
    assert!(decode(encode::cop1_d(FP_ADD, 1, 2, 4)).is_illegal());
    // ldc1 f3, 0(sp)
    assert!(decode(encode::ldc1(3, SP, 0)).is_illegal());
}

#[test]
fn test_decode_unknown_opcode() {
    let decoded = decode(0xFC00_0000);
    assert_eq!(decoded.instr, MipsInstr::Illegal { raw: 0xFC00_0000 });
}

#[test]
fn test_encode_decode_all_arith() {
    let cases = [
        (encode::add(T0, T1, T2), MipsInstr::Add { rd: T0, rs: T1, rt: T2 }),
        (encode::sub(T0, T1, T2), MipsInstr::Sub { rd: T0, rs: T1, rt: T2 }),
        (encode::subu(T0, T1, T2), MipsInstr::Subu { rd: T0, rs: T1, rt: T2 }),
        (encode::and(T0, T1, T2), MipsInstr::And { rd: T0, rs: T1, rt: T2 }),
        (encode::or(T0, T1, T2), MipsInstr::Or { rd: T0, rs: T1, rt: T2 }),
        (encode::slt(T0, T1, T2), MipsInstr::Slt { rd: T0, rs: T1, rt: T2 }),
        (encode::movz(T0, T1, T2), MipsInstr::Movz { rd: T0, rs: T1, rt: T2 }),
        (encode::sra(T0, T1, 3), MipsInstr::Sra { rd: T0, rt: T1, sa: 3 }),
        (encode::div(T1, T2), MipsInstr::Div { rs: T1, rt: T2 }),
        (encode::mfhi(T3), MipsInstr::Mfhi { rd: T3 }),
        (encode::ori(T0, T1, 0xBEEF), MipsInstr::Ori { rt: T0, rs: T1, imm: 0xBEEF }),
        (encode::lui(T0, 0x8000), MipsInstr::Lui { rt: T0, imm: 0x8000 }),
    ];
    for (raw, expected) in cases {
        assert_eq!(decode(raw).instr, expected, "raw=0x{:08x}", raw);
    }
}
