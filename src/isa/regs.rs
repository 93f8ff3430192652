//! MIPS32 寄存器编号与名字

pub const ZR: u8 = 0;
pub const AT: u8 = 1;
pub const V0: u8 = 2;
pub const V1: u8 = 3;
pub const A0: u8 = 4;
pub const A1: u8 = 5;
pub const A2: u8 = 6;
pub const A3: u8 = 7;
pub const T0: u8 = 8;
pub const T1: u8 = 9;
pub const T2: u8 = 10;
pub const T3: u8 = 11;
pub const T4: u8 = 12;
pub const T5: u8 = 13;
pub const T6: u8 = 14;
pub const T7: u8 = 15;
pub const S0: u8 = 16;
pub const S1: u8 = 17;
pub const S2: u8 = 18;
pub const S3: u8 = 19;
pub const S4: u8 = 20;
pub const S5: u8 = 21;
pub const S6: u8 = 22;
pub const S7: u8 = 23;
pub const T8: u8 = 24;
pub const T9: u8 = 25;
pub const K0: u8 = 26;
pub const K1: u8 = 27;
pub const GP: u8 = 28;
pub const SP: u8 = 29;
pub const FP: u8 = 30;
pub const RA: u8 = 31;

pub const NUM_CPU_REGS: usize = 32;
pub const NUM_FPU_REGS: usize = 32;

/// 被调用者保存寄存器 s0..s7
pub const CALLEE_SAVED: [u8; 8] = [S0, S1, S2, S3, S4, S5, S6, S7];

/// ABI 名字，按编号排列
pub const CPU_REG_NAMES: [&str; NUM_CPU_REGS] = [
    "zr", "at", "v0", "v1", "a0", "a1", "a2", "a3",
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7",
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7",
    "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra",
];

pub fn cpu_reg_name(reg: u8) -> &'static str {
    CPU_REG_NAMES[(reg & 0x1F) as usize]
}

/// 按名字查找通用寄存器，接受 `r0`..`r31` 与 ABI 名字
pub fn lookup_cpu_register(name: &str) -> Option<u8> {
    if let Some(num) = name.strip_prefix('r') {
        if num.starts_with('+') {
            return None;
        }
        if let Ok(n) = num.parse::<u8>() {
            return ((n as usize) < NUM_CPU_REGS).then_some(n);
        }
    }
    CPU_REG_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|i| i as u8)
}

/// 按名字查找浮点寄存器 `f0`..`f31`
pub fn lookup_fpu_register(name: &str) -> Option<u8> {
    let num = name.strip_prefix('f')?;
    if num.starts_with('+') {
        return None;
    }
    let n = num.parse::<u8>().ok()?;
    ((n as usize) < NUM_FPU_REGS).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_cpu_register() {
        assert_eq!(lookup_cpu_register("r0"), Some(ZR));
        assert_eq!(lookup_cpu_register("r31"), Some(RA));
        assert_eq!(lookup_cpu_register("sp"), Some(SP));
        assert_eq!(lookup_cpu_register("a1"), Some(A1));
        assert_eq!(lookup_cpu_register("r32"), None);
        assert_eq!(lookup_cpu_register("pc"), None);
        assert_eq!(lookup_cpu_register("r+1"), None);
    }

    #[test]
    fn test_lookup_fpu_register() {
        assert_eq!(lookup_fpu_register("f0"), Some(0));
        assert_eq!(lookup_fpu_register("f31"), Some(31));
        assert_eq!(lookup_fpu_register("f32"), None);
        assert_eq!(lookup_fpu_register("fp"), None);
    }
}
