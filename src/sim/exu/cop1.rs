//! COP1 execution unit: moves, double-precision arithmetic, conversions and compare/branch
//!
//! 运算使用 `simple-soft-float`，舍入与异常标志不依赖宿主 FPU。
//! 未启用 FPU 的模拟器不处理任何 COP1 指令。

use std::cmp::Ordering;

use simple_soft_float::{FPState, RoundingMode, StatusFlags, F64};

use super::super::bus::AddressSpace;
use super::super::status::{fcsr_flags, FCSR_RM_MASK};
use super::super::{Cpu, SimError};
use super::{branch, effective_address};
use crate::isa::MipsInstr;
use crate::memory::AccessSize;

/// FIR: 支持双精度与单精度
const FIR_VALUE: u32 = (1 << 17) | (1 << 16);
const FCR_FIR: u8 = 0;
const FCR_FCSR: u8 = 31;

/// FCSR.RM → 舍入模式
fn fcsr_rounding_mode(fcsr: u32) -> RoundingMode {
    match fcsr & FCSR_RM_MASK {
        0 => RoundingMode::TiesToEven,
        1 => RoundingMode::TowardZero,
        2 => RoundingMode::TowardPositive,
        _ => RoundingMode::TowardNegative,
    }
}

/// 把软浮点的异常标志累积进 FCSR
#[inline]
fn apply_fp_state(cpu: &mut Cpu, fp_state: &FPState) {
    let flags = fp_state.status_flags;
    let mut bits = 0;
    if flags.contains(StatusFlags::INVALID_OPERATION) {
        bits |= fcsr_flags::INVALID;
    }
    if flags.contains(StatusFlags::DIVISION_BY_ZERO) {
        bits |= fcsr_flags::DIV_BY_ZERO;
    }
    if flags.contains(StatusFlags::OVERFLOW) {
        bits |= fcsr_flags::OVERFLOW;
    }
    if flags.contains(StatusFlags::UNDERFLOW) {
        bits |= fcsr_flags::UNDERFLOW;
    }
    if flags.contains(StatusFlags::INEXACT) {
        bits |= fcsr_flags::INEXACT;
    }
    cpu.status.fcsr |= bits;
}

#[inline]
fn read_soft(cpu: &Cpu, reg: u8) -> F64 {
    F64::from_bits(cpu.status.double_read(reg).unwrap_or(0))
}

#[inline]
fn write_soft(cpu: &mut Cpu, reg: u8, value: F64) {
    cpu.status.double_write(reg, value.into_bits());
}

fn binary_op(cpu: &mut Cpu, fd: u8, fs: u8, ft: u8, op: fn(&F64, &F64, &mut FPState) -> F64) {
    let a = read_soft(cpu, fs);
    let b = read_soft(cpu, ft);
    let mut fp_state = FPState::default();
    let result = op(&a, &b, &mut fp_state);
    apply_fp_state(cpu, &fp_state);
    write_soft(cpu, fd, result);
}

fn to_word(cpu: &mut Cpu, fd: u8, fs: u8, rounding: RoundingMode) {
    let value = read_soft(cpu, fs);
    let mut fp_state = FPState::default();
    let result = value.to_i32(true, Some(rounding), Some(&mut fp_state));
    apply_fp_state(cpu, &fp_state);
    // NaN 与越界统一得到 2^31 - 1
    let word = result.unwrap_or(i32::MAX);
    cpu.status.fp_write(fd, word as u32);
}

pub(super) fn execute(
    cpu: &mut Cpu,
    bus: &mut AddressSpace<'_>,
    instr: MipsInstr,
    pc: u32,
) -> Result<bool, SimError> {
    if !cpu.has_fpu() {
        return Ok(false);
    }
    const RN: RoundingMode = RoundingMode::TiesToEven;

    match instr {
        // ========== 寄存器搬移 ==========
        MipsInstr::Mfc1 { rt, fs } => {
            let bits = cpu.status.fp_read(fs).unwrap_or(0);
            cpu.write_reg(rt, bits);
        }
        MipsInstr::Mtc1 { rt, fs } => {
            cpu.status.fp_write(fs, cpu.read_reg(rt));
        }
        MipsInstr::Cfc1 { rt, fs } => {
            let value = match fs {
                FCR_FCSR => cpu.status.fcsr,
                FCR_FIR => FIR_VALUE,
                _ => return Ok(false),
            };
            cpu.write_reg(rt, value);
        }
        MipsInstr::Ctc1 { rt, fs } => {
            if fs != FCR_FCSR {
                return Ok(false);
            }
            cpu.status.fcsr = cpu.read_reg(rt);
        }

        // ========== Load / Store ==========
        MipsInstr::Lwc1 { ft, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            let value = bus.read(addr, AccessSize::Word, "read", pc)?;
            cpu.status.fp_write(ft, value);
        }
        MipsInstr::Swc1 { ft, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            let value = cpu.status.fp_read(ft).unwrap_or(0);
            bus.write(addr, AccessSize::Word, value, "write", pc)?;
        }
        MipsInstr::Ldc1 { ft, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            if !addr.is_multiple_of(8) {
                return Err(SimError::Unaligned { access: "doubleword read", addr, pc });
            }
            let lo = bus.read(addr, AccessSize::Word, "doubleword read", pc)? as u64;
            let hi = bus.read(addr.wrapping_add(4), AccessSize::Word, "doubleword read", pc)? as u64;
            cpu.status.double_write(ft, (hi << 32) | lo);
        }
        MipsInstr::Sdc1 { ft, base, offset } => {
            let addr = effective_address(cpu, base, offset);
            if !addr.is_multiple_of(8) {
                return Err(SimError::Unaligned { access: "doubleword write", addr, pc });
            }
            let bits = cpu.status.double_read(ft).unwrap_or(0);
            bus.write(addr, AccessSize::Word, bits as u32, "doubleword write", pc)?;
            bus.write(addr.wrapping_add(4), AccessSize::Word, (bits >> 32) as u32, "doubleword write", pc)?;
        }

        // ========== 双精度算术 ==========
        MipsInstr::AddD { fd, fs, ft } => {
            binary_op(cpu, fd, fs, ft, |a, b, st| a.add(b, Some(RN), Some(st)));
        }
        MipsInstr::SubD { fd, fs, ft } => {
            binary_op(cpu, fd, fs, ft, |a, b, st| a.sub(b, Some(RN), Some(st)));
        }
        MipsInstr::MulD { fd, fs, ft } => {
            binary_op(cpu, fd, fs, ft, |a, b, st| a.mul(b, Some(RN), Some(st)));
        }
        MipsInstr::DivD { fd, fs, ft } => {
            binary_op(cpu, fd, fs, ft, |a, b, st| a.div(b, Some(RN), Some(st)));
        }
        MipsInstr::SqrtD { fd, fs } => {
            let value = read_soft(cpu, fs);
            let mut fp_state = FPState::default();
            let result = value.sqrt(Some(RN), Some(&mut fp_state));
            apply_fp_state(cpu, &fp_state);
            write_soft(cpu, fd, result);
        }
        // ABS/NEG/MOV 只改符号位，不产生异常
        MipsInstr::AbsD { fd, fs } => {
            let bits = cpu.status.double_read(fs).unwrap_or(0);
            cpu.status.double_write(fd, bits & !(1 << 63));
        }
        MipsInstr::NegD { fd, fs } => {
            let bits = cpu.status.double_read(fs).unwrap_or(0);
            cpu.status.double_write(fd, bits ^ (1 << 63));
        }
        MipsInstr::MovD { fd, fs } => {
            let bits = cpu.status.double_read(fs).unwrap_or(0);
            cpu.status.double_write(fd, bits);
        }

        // ========== 转换 ==========
        MipsInstr::CvtDW { fd, fs } => {
            let value = cpu.status.fp_read(fs).unwrap_or(0) as i32;
            let mut fp_state = FPState::default();
            let result = F64::from_i32(value, Some(RN), Some(&mut fp_state));
            apply_fp_state(cpu, &fp_state);
            write_soft(cpu, fd, result);
        }
        MipsInstr::CvtWD { fd, fs } => {
            let rounding = fcsr_rounding_mode(cpu.status.fcsr);
            to_word(cpu, fd, fs, rounding);
        }
        MipsInstr::TruncWD { fd, fs } => to_word(cpu, fd, fs, RoundingMode::TowardZero),

        // ========== 比较与条件分支 ==========
        MipsInstr::CondD { cond, fs, ft } => {
            let a = read_soft(cpu, fs);
            let b = read_soft(cpu, ft);
            let mut fp_state = FPState::default();
            // cond[3] 置位时任何 NaN 都报告无效操作
            let ordering = if cond & 0b1000 != 0 {
                a.compare_signaling(&b, Some(&mut fp_state))
            } else {
                a.compare_quiet(&b, Some(&mut fp_state))
            };
            apply_fp_state(cpu, &fp_state);
            let result = match ordering {
                None => cond & 0b001 != 0,
                Some(Ordering::Equal) => cond & 0b010 != 0,
                Some(Ordering::Less) => cond & 0b100 != 0,
                Some(Ordering::Greater) => false,
            };
            cpu.status.set_fp_condition(result);
        }
        MipsInstr::Bc1t { offset } => {
            let taken = cpu.status.fp_condition();
            branch(cpu, bus, pc, taken, offset)?;
        }
        MipsInstr::Bc1f { offset } => {
            let taken = !cpu.status.fp_condition();
            branch(cpu, bus, pc, taken, offset)?;
        }

        _ => return Ok(false),
    }
    Ok(true)
}
