//! 绝对跳转模式
//!
//! ```text
//! movw ip, #lo16
//! movt ip, #hi16
//! bx   ip
//! ```
//!
//! 不缓存任何状态，每次操作都重新读取内存。

use tracing::debug;

use super::PatternError;
use crate::arm::fields::{
    encode_movt, encode_movw, matches, mov_imm16, BX_IP, IP, MOVT_IP_MATCH, MOVW_IP_MATCH, MOV_IP_MASK,
};
use crate::memory::{ICache, MemResult, Memory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpPattern {
    pc: u32,
}

impl JumpPattern {
    pub const LENGTH_IN_BYTES: u32 = 12;

    pub fn new(pc: u32) -> Self {
        Self { pc }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    fn words(&self, mem: &dyn Memory) -> MemResult<[u32; 3]> {
        Ok([
            mem.load32(self.pc)?,
            mem.load32(self.pc.wrapping_add(4))?,
            mem.load32(self.pc.wrapping_add(8))?,
        ])
    }

    /// 三个字都严格匹配模板时为 true；读取失败视为不匹配
    pub fn is_valid(&self, mem: &dyn Memory) -> bool {
        match self.words(mem) {
            Ok([movw, movt, bx]) => {
                matches(movw, MOV_IP_MASK, MOVW_IP_MATCH)
                    && matches(movt, MOV_IP_MASK, MOVT_IP_MATCH)
                    && bx == BX_IP
            }
            Err(_) => false,
        }
    }

    fn ensure_valid(&self, mem: &dyn Memory) -> Result<(), PatternError> {
        if self.is_valid(mem) {
            Ok(())
        } else {
            Err(PatternError::NotAJump { pc: self.pc })
        }
    }

    pub fn target_address(&self, mem: &dyn Memory) -> Result<u32, PatternError> {
        self.ensure_valid(mem)?;
        let [movw, movt, _] = self.words(mem)?;
        Ok((mov_imm16(movt) << 16) | mov_imm16(movw))
    }

    /// 重写 movw/movt 两条指令，并刷新这 8 个字节的指令缓存
    pub fn set_target_address(
        &self,
        mem: &mut dyn Memory,
        icache: &mut dyn ICache,
        target: u32,
    ) -> Result<(), PatternError> {
        self.ensure_valid(mem)?;
        mem.store32(self.pc, encode_movw(IP, target & 0xFFFF))?;
        mem.store32(self.pc.wrapping_add(4), encode_movt(IP, target >> 16))?;
        icache.flush(self.pc, 2 * 4);
        debug!(pc = format_args!("0x{:08x}", self.pc), target = format_args!("0x{target:08x}"), "jump target patched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;
    use proptest::prelude::*;

    const BASE: u32 = 0x2000;
    const R_OTHER: u8 = 3;

    #[derive(Default)]
    struct RecordingICache {
        flushes: Vec<(u32, u32)>,
    }

    impl ICache for RecordingICache {
        fn flush(&mut self, start: u32, len: u32) {
            self.flushes.push((start, len));
        }
    }

    fn jump_mem(target: u32) -> FlatMemory {
        let mut mem = FlatMemory::new(0x40, BASE);
        mem.write_words(
            BASE,
            &[encode_movw(IP, target & 0xFFFF), encode_movt(IP, target >> 16), BX_IP, 0xE1A0_0000],
        )
        .unwrap();
        mem
    }

    #[test]
    fn test_read_target() {
        let mem = jump_mem(0xDEAD_BEEF);
        let jump = JumpPattern::new(BASE);
        assert!(jump.is_valid(&mem));
        assert_eq!(jump.target_address(&mem), Ok(0xDEAD_BEEF));
    }

    #[test]
    fn test_set_target_flushes_two_words() {
        let mut mem = jump_mem(0);
        let mut icache = RecordingICache::default();
        let jump = JumpPattern::new(BASE);
        jump.set_target_address(&mut mem, &mut icache, 0x1234_5678).unwrap();
        assert_eq!(icache.flushes, vec![(BASE, 8)]);
        assert_eq!(mem.load32(BASE + 8).unwrap(), BX_IP);
        assert_eq!(jump.target_address(&mem), Ok(0x1234_5678));
    }

    #[test]
    fn test_partial_template_invalid() {
        // 只匹配其中两条
        for broken in 0..3u32 {
            let mut mem = jump_mem(0x4000);
            let wrong = match broken {
                0 => encode_movw(R_OTHER, 0x4000),
                1 => encode_movt(R_OTHER, 0),
                _ => 0xE12F_FF1E, // bx lr
            };
            mem.store32(BASE + 4 * broken, wrong).unwrap();
            let jump = JumpPattern::new(BASE);
            assert!(!jump.is_valid(&mem), "word {broken} replaced");
            assert_eq!(jump.target_address(&mem), Err(PatternError::NotAJump { pc: BASE }));
            let mut icache = RecordingICache::default();
            assert!(jump.set_target_address(&mut mem, &mut icache, 0).is_err());
            assert!(icache.flushes.is_empty());
        }
    }

    #[test]
    fn test_swapped_halves_invalid() {
        let mut mem = FlatMemory::new(0x40, BASE);
        mem.write_words(BASE, &[encode_movt(IP, 1), encode_movw(IP, 2), BX_IP]).unwrap();
        assert!(!JumpPattern::new(BASE).is_valid(&mem));
    }

    #[test]
    fn test_unreadable_is_invalid() {
        let mem = FlatMemory::new(0x10, BASE);
        assert!(!JumpPattern::new(BASE + 8).is_valid(&mem));
    }

    proptest! {
        #[test]
        fn prop_set_then_read(target in any::<u32>(), initial in any::<u32>()) {
            let mut mem = jump_mem(initial);
            let mut icache = RecordingICache::default();
            let jump = JumpPattern::new(BASE);
            jump.set_target_address(&mut mem, &mut icache, target).unwrap();
            prop_assert!(jump.is_valid(&mem));
            prop_assert_eq!(jump.target_address(&mem), Ok(target));
            let lo = mov_imm16(mem.load32(BASE).unwrap());
            let hi = mov_imm16(mem.load32(BASE + 4).unwrap());
            prop_assert_eq!((hi << 16) | lo, target);
        }

        #[test]
        fn prop_random_words_rarely_valid(a in any::<u32>(), b in any::<u32>()) {
            let mut mem = FlatMemory::new(0x40, BASE);
            mem.write_words(BASE, &[a, b, BX_IP]).unwrap();
            let expected = matches(a, MOV_IP_MASK, MOVW_IP_MATCH) && matches(b, MOV_IP_MASK, MOVT_IP_MATCH);
            prop_assert_eq!(JumpPattern::new(BASE).is_valid(&mem), expected);
        }
    }
}
