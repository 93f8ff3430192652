//! REGIMM execution unit: sign-test branches, with and without link

use super::super::bus::AddressSpace;
use super::super::{Cpu, SimError};
use super::{branch, link_address};
use crate::isa::regs::RA;
use crate::isa::MipsInstr;

pub(super) fn execute(
    cpu: &mut Cpu,
    bus: &mut AddressSpace<'_>,
    instr: MipsInstr,
    pc: u32,
) -> Result<bool, SimError> {
    match instr {
        MipsInstr::Bltz { rs, offset } => {
            let taken = (cpu.read_reg(rs) as i32) < 0;
            branch(cpu, bus, pc, taken, offset)?;
        }
        MipsInstr::Bgez { rs, offset } => {
            let taken = (cpu.read_reg(rs) as i32) >= 0;
            branch(cpu, bus, pc, taken, offset)?;
        }
        // 无论是否跳转都写 ra
        MipsInstr::Bltzal { rs, offset } => {
            let taken = (cpu.read_reg(rs) as i32) < 0;
            cpu.write_reg(RA, link_address(pc));
            branch(cpu, bus, pc, taken, offset)?;
        }
        MipsInstr::Bgezal { rs, offset } => {
            let taken = (cpu.read_reg(rs) as i32) >= 0;
            cpu.write_reg(RA, link_address(pc));
            branch(cpu, bus, pc, taken, offset)?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}
