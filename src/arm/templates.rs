//! 常量池加载与调用点模板
//!
//! 代码生成器只会发出以下四种“从常量池加载一个字”的序列（`rd` 为目标寄存器）：
//!
//! ```text
//! Short:        ldr rd, [pp, #off]
//! AddImmediate: add rd, pp, #hi        ; ldr rd, [rd, #lo]
//! MovwAdd:      movw rd, #off          ; add rd, pp, rd ; ldr rd, [rd, #0]
//! MovwMovtAdd:  movw rd, #lo ; movt rd, #hi ; add rd, pp, rd ; ldr rd, [rd, #0]
//! ```
//!
//! 解析（从序列末尾反向匹配）与合成共用同一套常量，保证两者描述的是同一文法。
//! 调用点模板为三段加载后跟 `blx lr`：
//!
//! ```text
//! <load r5 ← ic data> <load r4 ← args descriptor> <load lr ← target> blx lr
//! ```

use thiserror::Error;

use super::fields::*;
use crate::memory::{MemError, Memory};

/// 模板匹配 / 合成错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unexpected instruction 0x{raw:08x} at 0x{addr:08x}, expected `{expected}`")]
    UnexpectedWord { addr: u32, raw: u32, expected: &'static str },
    #[error("register mismatch in pool load at 0x{addr:08x}: `{expected}` uses r{found}, chain uses r{reg}")]
    BrokenChain { addr: u32, reg: u8, found: u8, expected: &'static str },
    #[error("pool load offset 0x{offset:x} is not a valid element offset")]
    BadOffset { offset: u32 },
    #[error("instruction window before 0x{end:08x} underflows the address space")]
    WindowUnderflow { end: u32 },
    #[error("pool index {0} cannot be encoded")]
    IndexTooLarge(usize),
    #[error("register r{0} is not an ARM core register")]
    BadRegister(u8),
    #[error(transparent)]
    Memory(#[from] MemError),
}

/// 常量池加载序列的形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolLoadForm {
    Short,
    AddImmediate,
    MovwAdd,
    MovwMovtAdd,
}

impl PoolLoadForm {
    /// 序列占用的指令字数
    pub fn len_words(self) -> u32 {
        match self {
            PoolLoadForm::Short => 1,
            PoolLoadForm::AddImmediate => 2,
            PoolLoadForm::MovwAdd => 3,
            PoolLoadForm::MovwMovtAdd => 4,
        }
    }
}

/// 一次成功匹配的常量池加载
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLoad {
    /// 被加载的寄存器
    pub reg: u8,
    /// 常量池索引
    pub index: usize,
    pub form: PoolLoadForm,
    /// 序列第一条指令的地址
    pub start: u32,
}

/// 常量池索引 → 相对 pp 的字节偏移
pub fn index_to_offset(index: usize) -> Option<u32> {
    let index = u32::try_from(index).ok()?;
    index
        .checked_mul(POOL_ELEMENT_SIZE)?
        .checked_add(ARRAY_DATA_OFFSET)?
        .checked_sub(HEAP_OBJECT_TAG)
}

/// 相对 pp 的字节偏移 → 常量池索引
pub fn offset_to_index(offset: u32) -> Result<usize, TemplateError> {
    let untagged = offset.checked_add(HEAP_OBJECT_TAG).ok_or(TemplateError::BadOffset { offset })?;
    if untagged % POOL_ELEMENT_SIZE != 0 || untagged < ARRAY_DATA_OFFSET {
        return Err(TemplateError::BadOffset { offset });
    }
    Ok(((untagged - ARRAY_DATA_OFFSET) / POOL_ELEMENT_SIZE) as usize)
}

/// 反向读取窗口：`back(n)` 为 `end` 之前第 n 个指令字
struct Window<'a> {
    mem: &'a dyn Memory,
    end: u32,
}

impl Window<'_> {
    fn addr(&self, n: u32) -> Result<u32, TemplateError> {
        self.end
            .checked_sub(n * 4)
            .ok_or(TemplateError::WindowUnderflow { end: self.end })
    }

    fn back(&self, n: u32) -> Result<(u32, u32), TemplateError> {
        let addr = self.addr(n)?;
        Ok((addr, self.mem.load32(addr)?))
    }
}

fn expect_same_reg(addr: u32, reg: u8, found: u8, expected: &'static str) -> Result<(), TemplateError> {
    if reg == found {
        Ok(())
    } else {
        Err(TemplateError::BrokenChain { addr, reg, found, expected })
    }
}

/// 匹配结束于 `end`（不含）的常量池加载序列
pub fn match_pool_load(mem: &dyn Memory, end: u32) -> Result<PoolLoad, TemplateError> {
    let window = Window { mem, end };

    let (ldr_addr, ldr) = window.back(1)?;
    if matches(ldr, LDR_PP_MASK, LDR_PP_MATCH) {
        let offset = imm12(ldr);
        return Ok(PoolLoad {
            reg: rd(ldr),
            index: offset_to_index(offset)?,
            form: PoolLoadForm::Short,
            start: ldr_addr,
        });
    }
    if !matches(ldr, LDR_IMM_MASK, LDR_IMM_MATCH) {
        return Err(TemplateError::UnexpectedWord {
            addr: ldr_addr,
            raw: ldr,
            expected: "ldr rd, [rn, #imm12]",
        });
    }
    let reg = rd(ldr);
    expect_same_reg(ldr_addr, reg, rn(ldr), "ldr rd, [rd, #imm12]")?;
    let ldr_offset = imm12(ldr);

    let (add_addr, add) = window.back(2)?;
    if matches(add, ADD_PP_IMM_MASK, ADD_PP_IMM_MATCH) {
        expect_same_reg(add_addr, reg, rd(add), "add rd, pp, #imm")?;
        let offset = rotated_imm(add).wrapping_add(ldr_offset);
        return Ok(PoolLoad {
            reg,
            index: offset_to_index(offset)?,
            form: PoolLoadForm::AddImmediate,
            start: add_addr,
        });
    }
    if !matches(add, ADD_PP_REG_MASK, ADD_PP_REG_MATCH) {
        return Err(TemplateError::UnexpectedWord {
            addr: add_addr,
            raw: add,
            expected: "add rd, pp, #imm | add rd, pp, rm",
        });
    }
    expect_same_reg(add_addr, reg, rd(add), "add rd, pp, rd")?;
    expect_same_reg(add_addr, reg, rm(add), "add rd, pp, rd")?;
    if ldr_offset != 0 {
        return Err(TemplateError::UnexpectedWord {
            addr: ldr_addr,
            raw: ldr,
            expected: "ldr rd, [rd, #0]",
        });
    }

    let (mut mov_addr, mut mov) = window.back(3)?;
    let mut offset = 0;
    let mut form = PoolLoadForm::MovwAdd;
    if matches(mov, MOVT_MASK, MOVT_MATCH) {
        expect_same_reg(mov_addr, reg, rd(mov), "movt rd, #imm16")?;
        offset = mov_imm16(mov) << 16;
        form = PoolLoadForm::MovwMovtAdd;
        (mov_addr, mov) = window.back(4)?;
    }
    if !matches(mov, MOVW_MASK, MOVW_MATCH) {
        return Err(TemplateError::UnexpectedWord {
            addr: mov_addr,
            raw: mov,
            expected: "movw rd, #imm16",
        });
    }
    expect_same_reg(mov_addr, reg, rd(mov), "movw rd, #imm16")?;
    offset |= mov_imm16(mov);

    Ok(PoolLoad {
        reg,
        index: offset_to_index(offset)?,
        form,
        start: mov_addr,
    })
}

/// 为 `index` 合成最短的常量池加载序列
pub fn emit_pool_load(reg: u8, index: usize) -> Result<Vec<u32>, TemplateError> {
    if reg > 15 {
        return Err(TemplateError::BadRegister(reg));
    }
    let offset = index_to_offset(index).ok_or(TemplateError::IndexTooLarge(index))?;

    if offset <= 0xFFF {
        return Ok(vec![encode_ldr_imm(reg, PP, offset)]);
    }
    if let Some((imm8, rot)) = encode_rotated_imm(offset & !0xFFF) {
        return Ok(vec![
            encode_add_pp_imm(reg, imm8, rot),
            encode_ldr_imm(reg, reg, offset & 0xFFF),
        ]);
    }
    let add = encode_add_pp_reg(reg, reg);
    let ldr = encode_ldr_imm(reg, reg, 0);
    if offset <= 0xFFFF {
        return Ok(vec![encode_movw(reg, offset), add, ldr]);
    }
    Ok(vec![
        encode_movw(reg, offset & 0xFFFF),
        encode_movt(reg, offset >> 16),
        add,
        ldr,
    ])
}

/// 合成完整调用点：三段加载 + `blx lr`
///
/// 返回的指令字依次排列；调用返回地址为 `start + 4 * len`。
pub fn emit_call(target_index: usize, args_desc_index: usize, ic_data_index: usize) -> Result<Vec<u32>, TemplateError> {
    let mut words = emit_pool_load(R5, ic_data_index)?;
    words.extend(emit_pool_load(R4, args_desc_index)?);
    words.extend(emit_pool_load(LR, target_index)?);
    words.push(BLX_LR);
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;

    const BASE: u32 = 0x8000;

    /// offset <= 0xFFFF 时合成器总会选择 add 立即数形态，MovwAdd 需要手工构造
    fn movw_add(reg: u8, index: usize) -> Vec<u32> {
        let offset = index_to_offset(index).unwrap();
        vec![encode_movw(reg, offset), encode_add_pp_reg(reg, reg), encode_ldr_imm(reg, reg, 0)]
    }

    fn place(words: &[u32]) -> (FlatMemory, u32) {
        let mut mem = FlatMemory::new(0x100, BASE);
        // 前面垫一个不相关的字，确保匹配不会越过序列起点
        mem.store32(BASE, 0xE1A0_0000).unwrap(); // mov r0, r0
        mem.write_words(BASE + 4, words).unwrap();
        (mem, BASE + 4 + 4 * words.len() as u32)
    }

    #[test]
    fn test_index_offset_mapping() {
        assert_eq!(index_to_offset(0), Some(11));
        assert_eq!(offset_to_index(11), Ok(0));
        assert_eq!(offset_to_index(15), Ok(1));
        assert!(offset_to_index(12).is_err());
        assert!(offset_to_index(7).is_err());
    }

    #[test]
    fn test_emit_picks_shortest_form() {
        assert_eq!(emit_pool_load(LR, 3).unwrap().len(), 1);
        assert_eq!(emit_pool_load(LR, 1024).unwrap().len(), 2);
        // offset = 0x48DB，高位 0x4000 可编码
        assert_eq!(emit_pool_load(LR, 0x1234).unwrap().len(), 2);
        // offset = 0x48D163，高位 0x48D000 不可编码
        assert_eq!(emit_pool_load(LR, 0x0012_3456).unwrap().len(), 4);
    }

    #[test]
    fn test_match_each_form() {
        for (index, form) in [
            (5, PoolLoadForm::Short),
            (1024, PoolLoadForm::AddImmediate),
            (0x1234, PoolLoadForm::MovwAdd),
            (0x0012_3456, PoolLoadForm::MovwMovtAdd),
        ] {
            let words = if form == PoolLoadForm::MovwAdd {
                movw_add(R4, index)
            } else {
                emit_pool_load(R4, index).unwrap()
            };
            assert_eq!(words.len() as u32, form.len_words());
            let (mem, end) = place(&words);
            let load = match_pool_load(&mem, end).unwrap();
            assert_eq!(load, PoolLoad { reg: R4, index, form, start: BASE + 4 });
        }
    }

    #[test]
    fn test_movw_add_requires_zero_ldr_offset() {
        let mut words = movw_add(R4, 0x1234);
        words[2] = encode_ldr_imm(R4, R4, 4);
        let (mem, end) = place(&words);
        assert!(matches!(
            match_pool_load(&mem, end),
            Err(TemplateError::UnexpectedWord { expected: "ldr rd, [rd, #0]", .. })
        ));
    }

    #[test]
    fn test_broken_register_chain() {
        // add r4, pp, #0x1000 ; ldr r5, [r5, #0xf]
        let words = [encode_add_pp_imm(R4, 1, 10), encode_ldr_imm(R5, R5, 0xF)];
        let (mem, end) = place(&words);
        assert!(matches!(match_pool_load(&mem, end), Err(TemplateError::BrokenChain { .. })));
    }

    #[test]
    fn test_unrelated_word_rejected() {
        let (mem, end) = place(&[0xE1A0_0000]);
        assert!(matches!(
            match_pool_load(&mem, end),
            Err(TemplateError::UnexpectedWord { addr, .. }) if addr == BASE + 4
        ));
    }

    #[test]
    fn test_shifted_register_add_rejected() {
        // add r4, pp, r4, lsl #2 不属于模板文法
        let mut words = movw_add(R4, 0x1234);
        words[1] |= 2 << 7;
        let (mem, end) = place(&words);
        assert!(match_pool_load(&mem, end).is_err());
    }

    #[test]
    fn test_emit_call_layout() {
        let words = emit_call(1, 2, 3).unwrap();
        assert_eq!(words.len(), 4);
        assert_eq!(*words.last().unwrap(), BLX_LR);
        assert_eq!(rd(words[0]), R5);
        assert_eq!(rd(words[1]), R4);
        assert_eq!(rd(words[2]), LR);
    }

    #[test]
    fn test_emit_rejects_bad_register() {
        assert_eq!(emit_pool_load(16, 0), Err(TemplateError::BadRegister(16)));
    }
}
