//! Simulator architectural state: register files, HI/LO and the FPU control register.

/// Generic register file with configurable count, element type, and zero-hardwire behavior.
///
/// - `N`: number of registers
/// - `T`: element type (u32, u64, etc.)
/// - `ZERO_HARDWIRE`: if true, register 0 always reads as zero and writes are ignored
#[derive(Clone)]
pub struct GenericRegFile<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> {
    regs: [T; N],
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> GenericRegFile<N, T, ZERO_HARDWIRE> {
    pub fn new() -> Self {
        Self { regs: [T::default(); N] }
    }

    #[inline]
    pub fn read(&self, reg: u8) -> T {
        if ZERO_HARDWIRE && reg == 0 {
            T::default()
        } else {
            self.regs[reg as usize % N]
        }
    }

    #[inline]
    pub fn write(&mut self, reg: u8, value: T) {
        if ZERO_HARDWIRE && reg == 0 {
            return;
        }
        self.regs[reg as usize % N] = value;
    }

    pub fn snapshot(&self) -> &[T; N] {
        &self.regs
    }
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> Default for GenericRegFile<N, T, ZERO_HARDWIRE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer register file r0..r31. r0 is hard-wired to zero.
pub type RegFile = GenericRegFile<32, u32, true>;

/// COP1 register file f0..f31. Doubles live in even/odd pairs.
pub type FpRegFile = GenericRegFile<32, u32, false>;

/// FCSR 条件码 0 所在位
pub const FCSR_CC_BIT: u32 = 1 << 23;
/// FCSR 舍入模式字段
pub const FCSR_RM_MASK: u32 = 0b11;

/// FCSR 异常标志位（Flags 字段）
pub mod fcsr_flags {
    pub const INEXACT: u32 = 1 << 2;
    pub const UNDERFLOW: u32 = 1 << 3;
    pub const OVERFLOW: u32 = 1 << 4;
    pub const DIV_BY_ZERO: u32 = 1 << 5;
    pub const INVALID: u32 = 1 << 6;
}

/// Aggregated architectural state.
#[derive(Clone, Default)]
pub struct Status {
    pub int: RegFile,
    pub fp: Option<FpRegFile>,
    pub hi: u32,
    pub lo: u32,
    pub fcsr: u32,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable COP1 state on demand.
    pub fn enable_fp(&mut self) {
        if self.fp.is_none() {
            self.fp = Some(FpRegFile::new());
        }
    }

    #[inline]
    pub fn int_read(&self, reg: u8) -> u32 {
        self.int.read(reg)
    }

    #[inline]
    pub fn int_write(&mut self, reg: u8, value: u32) {
        self.int.write(reg, value)
    }

    #[inline]
    pub fn fp_read(&self, reg: u8) -> Option<u32> {
        self.fp.as_ref().map(|f| f.read(reg))
    }

    #[inline]
    pub fn fp_write(&mut self, reg: u8, value: u32) -> bool {
        if let Some(f) = self.fp.as_mut() {
            f.write(reg, value);
            true
        } else {
            false
        }
    }

    /// 读取偶数寄存器 `reg` 起始的双精度寄存器对（低字在偶数寄存器）
    pub fn double_read(&self, reg: u8) -> Option<u64> {
        let fp = self.fp.as_ref()?;
        let lo = fp.read(reg & !1) as u64;
        let hi = fp.read(reg | 1) as u64;
        Some((hi << 32) | lo)
    }

    pub fn double_write(&mut self, reg: u8, bits: u64) -> bool {
        if let Some(fp) = self.fp.as_mut() {
            fp.write(reg & !1, bits as u32);
            fp.write(reg | 1, (bits >> 32) as u32);
            true
        } else {
            false
        }
    }

    /// HI:LO 作为一个 64-bit 累加器
    pub fn hilo(&self) -> u64 {
        ((self.hi as u64) << 32) | self.lo as u64
    }

    pub fn set_hilo(&mut self, value: u64) {
        self.hi = (value >> 32) as u32;
        self.lo = value as u32;
    }

    pub fn fp_condition(&self) -> bool {
        self.fcsr & FCSR_CC_BIT != 0
    }

    pub fn set_fp_condition(&mut self, value: bool) {
        if value {
            self.fcsr |= FCSR_CC_BIT;
        } else {
            self.fcsr &= !FCSR_CC_BIT;
        }
    }

    /// Snapshot all architectural state at once.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            int: *self.int.snapshot(),
            fp: self.fp.as_ref().map(|f| *f.snapshot()),
            hi: self.hi,
            lo: self.lo,
            fcsr: self.fcsr,
        }
    }
}

/// Snapshot of all architectural state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub int: [u32; 32],
    pub fp: Option<[u32; 32]>,
    pub hi: u32,
    pub lo: u32,
    pub fcsr: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_register_hardwired() {
        let mut status = Status::new();
        status.int_write(0, 0xDEAD);
        status.int_write(1, 0xBEEF);
        assert_eq!(status.int_read(0), 0);
        assert_eq!(status.int_read(1), 0xBEEF);
    }

    #[test]
    fn test_double_pairs() {
        let mut status = Status::new();
        assert_eq!(status.double_read(2), None);
        status.enable_fp();
        let bits = 1.5f64.to_bits();
        assert!(status.double_write(2, bits));
        assert_eq!(status.fp_read(2), Some(bits as u32));
        assert_eq!(status.fp_read(3), Some((bits >> 32) as u32));
        assert_eq!(status.double_read(2), Some(bits));
    }

    #[test]
    fn test_hilo_and_condition() {
        let mut status = Status::new();
        status.set_hilo(0x1234_5678_9ABC_DEF0);
        assert_eq!((status.hi, status.lo), (0x1234_5678, 0x9ABC_DEF0));
        status.set_fp_condition(true);
        assert_eq!(status.fcsr, FCSR_CC_BIT);
        assert!(status.fp_condition());
        status.set_fp_condition(false);
        assert!(!status.fp_condition());
    }
}
