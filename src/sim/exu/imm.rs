//! Immediate-form execution unit: J/JAL, compare branches, immediate ALU ops, loads and stores

use super::super::bus::AddressSpace;
use super::super::trap::add_overflows;
use super::super::{Cpu, SimError, INSTR_SIZE};
use super::{branch, effective_address, jump, link_address};
use crate::isa::regs::RA;
use crate::isa::MipsInstr;
use crate::memory::AccessSize;

/// J/JAL 目标：延迟槽所在 256 MiB 区域内
#[inline]
fn region_target(pc: u32, index: u32) -> u32 {
    (pc.wrapping_add(INSTR_SIZE) & 0xF000_0000) | (index << 2)
}

pub(super) fn execute(
    cpu: &mut Cpu,
    bus: &mut AddressSpace<'_>,
    instr: MipsInstr,
    pc: u32,
) -> Result<bool, SimError> {
    match instr {
        // ========== 跳转 ==========
        MipsInstr::J { index } => jump(cpu, bus, region_target(pc, index))?,
        MipsInstr::Jal { index } => {
            cpu.write_reg(RA, link_address(pc));
            jump(cpu, bus, region_target(pc, index))?;
        }

        // ========== 比较分支 ==========
        MipsInstr::Beq { rs, rt, offset } => {
            let taken = cpu.read_reg(rs) == cpu.read_reg(rt);
            branch(cpu, bus, pc, taken, offset)?;
        }
        MipsInstr::Bne { rs, rt, offset } => {
            let taken = cpu.read_reg(rs) != cpu.read_reg(rt);
            branch(cpu, bus, pc, taken, offset)?;
        }
        MipsInstr::Blez { rs, offset } => {
            let taken = (cpu.read_reg(rs) as i32) <= 0;
            branch(cpu, bus, pc, taken, offset)?;
        }
        MipsInstr::Bgtz { rs, offset } => {
            let taken = (cpu.read_reg(rs) as i32) > 0;
            branch(cpu, bus, pc, taken, offset)?;
        }

        // ========== 立即数算术/逻辑 ==========
        MipsInstr::Addi { rt, rs, imm } => {
            let left = cpu.read_reg(rs);
            let result = left.wrapping_add(imm as u32);
            if add_overflows(left, imm as u32, result) {
                return Err(SimError::Overflow { pc });
            }
            cpu.write_reg(rt, result);
        }
        MipsInstr::Addiu { rt, rs, imm } => {
            cpu.write_reg(rt, cpu.read_reg(rs).wrapping_add(imm as u32));
        }
        MipsInstr::Slti { rt, rs, imm } => {
            let result = (cpu.read_reg(rs) as i32) < imm;
            cpu.write_reg(rt, result as u32);
        }
        MipsInstr::Sltiu { rt, rs, imm } => {
            let result = cpu.read_reg(rs) < imm as u32;
            cpu.write_reg(rt, result as u32);
        }
        MipsInstr::Andi { rt, rs, imm } => cpu.write_reg(rt, cpu.read_reg(rs) & imm),
        MipsInstr::Ori { rt, rs, imm } => cpu.write_reg(rt, cpu.read_reg(rs) | imm),
        MipsInstr::Xori { rt, rs, imm } => cpu.write_reg(rt, cpu.read_reg(rs) ^ imm),
        MipsInstr::Lui { rt, imm } => cpu.write_reg(rt, imm << 16),

        // ========== Load ==========
        MipsInstr::Lb { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            let value = bus.read(addr, AccessSize::Byte, "byte read", pc)?;
            cpu.write_reg(rt, value as u8 as i8 as i32 as u32);
        }
        MipsInstr::Lbu { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            let value = bus.read(addr, AccessSize::Byte, "byte read", pc)?;
            cpu.write_reg(rt, value);
        }
        MipsInstr::Lh { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            let value = bus.read(addr, AccessSize::Half, "signed halfword read", pc)?;
            cpu.write_reg(rt, value as u16 as i16 as i32 as u32);
        }
        MipsInstr::Lhu { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            let value = bus.read(addr, AccessSize::Half, "unsigned halfword read", pc)?;
            cpu.write_reg(rt, value);
        }
        MipsInstr::Lw { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            let value = bus.read(addr, AccessSize::Word, "read", pc)?;
            cpu.write_reg(rt, value);
        }

        // ========== Store ==========
        MipsInstr::Sb { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            bus.write(addr, AccessSize::Byte, cpu.read_reg(rt), "byte write", pc)?;
        }
        MipsInstr::Sh { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            bus.write(addr, AccessSize::Half, cpu.read_reg(rt), "halfword write", pc)?;
        }
        MipsInstr::Sw { rt, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            bus.write(addr, AccessSize::Word, cpu.read_reg(rt), "write", pc)?;
        }

        _ => return Ok(false),
    }
    Ok(true)
}
