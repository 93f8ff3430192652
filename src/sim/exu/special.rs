//! SPECIAL execution unit: shifts, register jumps, HI/LO and three-register ALU ops

use super::super::bus::AddressSpace;
use super::super::trap::{add_overflows, sub_overflows};
use super::super::{Cpu, SimError};
use super::{jump, link_address};
use crate::isa::MipsInstr;

pub(super) fn execute(
    cpu: &mut Cpu,
    bus: &mut AddressSpace<'_>,
    instr: MipsInstr,
    pc: u32,
) -> Result<bool, SimError> {
    match instr {
        // ========== 移位 ==========
        MipsInstr::Sll { rd, rt, sa } => {
            let result = cpu.read_reg(rt) << sa;
            cpu.write_reg(rd, result);
        }
        MipsInstr::Srl { rd, rt, sa } => {
            let result = cpu.read_reg(rt) >> sa;
            cpu.write_reg(rd, result);
        }
        MipsInstr::Sra { rd, rt, sa } => {
            let result = ((cpu.read_reg(rt) as i32) >> sa) as u32;
            cpu.write_reg(rd, result);
        }
        MipsInstr::Sllv { rd, rt, rs } => {
            let shamt = cpu.read_reg(rs) & 0x1F;
            cpu.write_reg(rd, cpu.read_reg(rt) << shamt);
        }
        MipsInstr::Srlv { rd, rt, rs } => {
            let shamt = cpu.read_reg(rs) & 0x1F;
            cpu.write_reg(rd, cpu.read_reg(rt) >> shamt);
        }
        MipsInstr::Srav { rd, rt, rs } => {
            let shamt = cpu.read_reg(rs) & 0x1F;
            cpu.write_reg(rd, ((cpu.read_reg(rt) as i32) >> shamt) as u32);
        }

        // ========== 寄存器跳转 ==========
        MipsInstr::Jr { rs } => {
            // 目标在延迟槽执行之前读取
            let target = cpu.read_reg(rs);
            jump(cpu, bus, target)?;
        }
        MipsInstr::Jalr { rd, rs } => {
            let target = cpu.read_reg(rs);
            cpu.write_reg(rd, link_address(pc));
            jump(cpu, bus, target)?;
        }

        // ========== 条件移动 / 断点 ==========
        MipsInstr::Movz { rd, rs, rt } => {
            if cpu.read_reg(rt) == 0 {
                cpu.write_reg(rd, cpu.read_reg(rs));
            }
        }
        MipsInstr::Movn { rd, rs, rt } => {
            if cpu.read_reg(rt) != 0 {
                cpu.write_reg(rd, cpu.read_reg(rs));
            }
        }
        MipsInstr::Break { code } => {
            if cpu.delay_slot {
                return Err(SimError::BreakInDelaySlot { pc });
            }
            cpu.pending_break = Some(code);
        }

        // ========== HI/LO ==========
        MipsInstr::Mfhi { rd } => cpu.write_reg(rd, cpu.status.hi),
        MipsInstr::Mflo { rd } => cpu.write_reg(rd, cpu.status.lo),
        MipsInstr::Mthi { rs } => cpu.status.hi = cpu.read_reg(rs),
        MipsInstr::Mtlo { rs } => cpu.status.lo = cpu.read_reg(rs),
        MipsInstr::Mult { rs, rt } => {
            let product = (cpu.read_reg(rs) as i32 as i64) * (cpu.read_reg(rt) as i32 as i64);
            cpu.status.set_hilo(product as u64);
        }
        MipsInstr::Multu { rs, rt } => {
            let product = (cpu.read_reg(rs) as u64) * (cpu.read_reg(rt) as u64);
            cpu.status.set_hilo(product);
        }
        MipsInstr::Div { rs, rt } => {
            let dividend = cpu.read_reg(rs) as i32;
            let divisor = cpu.read_reg(rt) as i32;
            // 除零结果未定义，这里清零；i32::MIN / -1 商为 i32::MIN、余数为 0
            let (quotient, remainder) = match divisor {
                0 => (0, 0),
                -1 if dividend == i32::MIN => (i32::MIN, 0),
                _ => (dividend / divisor, dividend % divisor),
            };
            cpu.status.lo = quotient as u32;
            cpu.status.hi = remainder as u32;
        }
        MipsInstr::Divu { rs, rt } => {
            let dividend = cpu.read_reg(rs);
            let divisor = cpu.read_reg(rt);
            let (quotient, remainder) = if divisor == 0 {
                (0, 0)
            } else {
                (dividend / divisor, dividend % divisor)
            };
            cpu.status.lo = quotient;
            cpu.status.hi = remainder;
        }

        // ========== 三寄存器算术/逻辑 ==========
        MipsInstr::Add { rd, rs, rt } => {
            let (left, right) = (cpu.read_reg(rs), cpu.read_reg(rt));
            let result = left.wrapping_add(right);
            if add_overflows(left, right, result) {
                return Err(SimError::Overflow { pc });
            }
            cpu.write_reg(rd, result);
        }
        MipsInstr::Addu { rd, rs, rt } => {
            cpu.write_reg(rd, cpu.read_reg(rs).wrapping_add(cpu.read_reg(rt)));
        }
        MipsInstr::Sub { rd, rs, rt } => {
            let (left, right) = (cpu.read_reg(rs), cpu.read_reg(rt));
            let result = left.wrapping_sub(right);
            if sub_overflows(left, right, result) {
                return Err(SimError::Overflow { pc });
            }
            cpu.write_reg(rd, result);
        }
        MipsInstr::Subu { rd, rs, rt } => {
            cpu.write_reg(rd, cpu.read_reg(rs).wrapping_sub(cpu.read_reg(rt)));
        }
        MipsInstr::And { rd, rs, rt } => cpu.write_reg(rd, cpu.read_reg(rs) & cpu.read_reg(rt)),
        MipsInstr::Or { rd, rs, rt } => cpu.write_reg(rd, cpu.read_reg(rs) | cpu.read_reg(rt)),
        MipsInstr::Xor { rd, rs, rt } => cpu.write_reg(rd, cpu.read_reg(rs) ^ cpu.read_reg(rt)),
        MipsInstr::Nor { rd, rs, rt } => cpu.write_reg(rd, !(cpu.read_reg(rs) | cpu.read_reg(rt))),
        MipsInstr::Slt { rd, rs, rt } => {
            let result = (cpu.read_reg(rs) as i32) < (cpu.read_reg(rt) as i32);
            cpu.write_reg(rd, result as u32);
        }
        MipsInstr::Sltu { rd, rs, rt } => {
            let result = cpu.read_reg(rs) < cpu.read_reg(rt);
            cpu.write_reg(rd, result as u32);
        }

        _ => return Ok(false),
    }
    Ok(true)
}
