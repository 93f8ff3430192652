//! Execution units split by instruction group
//!
//! 每个单元只处理自己的指令，返回 `Ok(true)` 表示已执行；
//! 所有单元都不认识的编码报告为 `SimError::Unimplemented`。

mod cop1;
mod imm;
mod regimm;
mod special;
mod special2;

use super::bus::AddressSpace;
use super::{Cpu, SimError, INSTR_SIZE};
use crate::isa::DecodedInstr;

/// 执行一条已解码的指令。PC 的推进由调用方负责
pub(super) fn execute(
    cpu: &mut Cpu,
    bus: &mut AddressSpace<'_>,
    decoded: DecodedInstr,
    pc: u32,
) -> Result<(), SimError> {
    let instr = decoded.instr;
    let handled = special::execute(cpu, bus, instr, pc)?
        || special2::execute(cpu, instr)?
        || regimm::execute(cpu, bus, instr, pc)?
        || imm::execute(cpu, bus, instr, pc)?
        || cop1::execute(cpu, bus, instr, pc)?;
    if handled {
        Ok(())
    } else {
        Err(SimError::Unimplemented { raw: decoded.raw, pc })
    }
}

/// 相对分支目标：延迟槽地址 + 偏移
#[inline]
pub(super) fn branch_target(pc: u32, offset: i32) -> u32 {
    pc.wrapping_add(INSTR_SIZE).wrapping_add(offset as u32)
}

/// 先执行延迟槽，再转移到 `target`
///
/// PC 设为 `target - 4`，由统一的 +4 落到目标上。
pub(super) fn jump(cpu: &mut Cpu, bus: &mut AddressSpace<'_>, target: u32) -> Result<(), SimError> {
    cpu.execute_delay_slot(bus)?;
    cpu.pc = target.wrapping_sub(INSTR_SIZE);
    Ok(())
}

/// 条件分支：延迟槽总是执行；不跳转时越过延迟槽
pub(super) fn branch(
    cpu: &mut Cpu,
    bus: &mut AddressSpace<'_>,
    pc: u32,
    taken: bool,
    offset: i32,
) -> Result<(), SimError> {
    let target = branch_target(pc, offset);
    cpu.execute_delay_slot(bus)?;
    cpu.pc = if taken {
        target.wrapping_sub(INSTR_SIZE)
    } else {
        pc.wrapping_add(INSTR_SIZE)
    };
    Ok(())
}

/// 跳转并链接时写入的返回地址（越过延迟槽）
#[inline]
pub(super) fn link_address(pc: u32) -> u32 {
    pc.wrapping_add(2 * INSTR_SIZE)
}

/// base + offset
#[inline]
pub(super) fn effective_address(cpu: &Cpu, base: u8, offset: i32) -> u32 {
    cpu.read_reg(base).wrapping_add(offset as u32)
}
