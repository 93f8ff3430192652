//! SPECIAL2 execution unit: multiply-accumulate, MUL and bit counting

use super::super::{Cpu, SimError};
use crate::isa::MipsInstr;

pub(super) fn execute(cpu: &mut Cpu, instr: MipsInstr) -> Result<bool, SimError> {
    match instr {
        MipsInstr::Madd { rs, rt } => {
            let product = (cpu.read_reg(rs) as i32 as i64) * (cpu.read_reg(rt) as i32 as i64);
            let acc = (cpu.status.hilo() as i64).wrapping_add(product);
            cpu.status.set_hilo(acc as u64);
        }
        MipsInstr::Maddu { rs, rt } => {
            let product = (cpu.read_reg(rs) as u64) * (cpu.read_reg(rt) as u64);
            let acc = cpu.status.hilo().wrapping_add(product);
            cpu.status.set_hilo(acc);
        }
        // HI/LO 保持不变
        MipsInstr::Mul { rd, rs, rt } => {
            let result = (cpu.read_reg(rs) as i32).wrapping_mul(cpu.read_reg(rt) as i32);
            cpu.write_reg(rd, result as u32);
        }
        MipsInstr::Clz { rd, rs } => cpu.write_reg(rd, cpu.read_reg(rs).leading_zeros()),
        MipsInstr::Clo { rd, rs } => cpu.write_reg(rd, cpu.read_reg(rs).leading_ones()),
        _ => return Ok(false),
    }
    Ok(true)
}
