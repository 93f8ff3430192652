//! ARM (A32) 编码辅助函数
//!
//! 只覆盖调用/跳转模板用到的几种指令：
//! `ldr rd, [rn, #imm12]`、`add rd, rn, #rot_imm`、`add rd, rn, rm`、
//! `movw`/`movt`、`blx`/`bx`。

pub const R0: u8 = 0;
pub const R4: u8 = 4;
pub const R5: u8 = 5;
/// 常量池寄存器
pub const PP: u8 = 10;
/// 跳转模板使用的暂存寄存器
pub const IP: u8 = 12;
pub const LR: u8 = 14;

/// 堆对象指针的标签位
pub const HEAP_OBJECT_TAG: u32 = 1;
/// 数组首元素相对（未打标签的）对象起始的偏移
pub const ARRAY_DATA_OFFSET: u32 = 12;
/// 常量池元素步长
pub const POOL_ELEMENT_SIZE: u32 = 4;

// ========== 固定编码 ==========

/// `blx lr`
pub const BLX_LR: u32 = 0xE12F_FF3E;
/// `bx ip`
pub const BX_IP: u32 = 0xE12F_FF1C;

// ========== 掩码 / 匹配值 ==========

/// `ldr rd, [pp, #+imm12]`
pub const LDR_PP_MASK: u32 = 0xFFFF_0000;
pub const LDR_PP_MATCH: u32 = 0xE59A_0000;
/// `ldr rd, [rn, #+imm12]`
pub const LDR_IMM_MASK: u32 = 0xFFF0_0000;
pub const LDR_IMM_MATCH: u32 = 0xE590_0000;
/// `add rd, pp, #rot_imm`
pub const ADD_PP_IMM_MASK: u32 = 0xFFFF_0000;
pub const ADD_PP_IMM_MATCH: u32 = 0xE28A_0000;
/// `add rd, pp, rm`（不带移位）
pub const ADD_PP_REG_MASK: u32 = 0xFFFF_0FF0;
pub const ADD_PP_REG_MATCH: u32 = 0xE08A_0000;
/// `movw rd, #imm16`
pub const MOVW_MASK: u32 = 0xFFF0_0000;
pub const MOVW_MATCH: u32 = 0xE300_0000;
/// `movt rd, #imm16`
pub const MOVT_MASK: u32 = 0xFFF0_0000;
pub const MOVT_MATCH: u32 = 0xE340_0000;
/// `movw ip, #imm16` / `movt ip, #imm16`
pub const MOV_IP_MASK: u32 = 0xFFF0_F000;
pub const MOVW_IP_MATCH: u32 = 0xE300_C000;
pub const MOVT_IP_MATCH: u32 = 0xE340_C000;

#[inline]
pub fn matches(raw: u32, mask: u32, match_val: u32) -> bool {
    raw & mask == match_val
}

// ========== 字段提取 ==========

/// Rd [15:12]
#[inline]
pub fn rd(raw: u32) -> u8 {
    ((raw >> 12) & 0xF) as u8
}

/// Rn [19:16]
#[inline]
pub fn rn(raw: u32) -> u8 {
    ((raw >> 16) & 0xF) as u8
}

/// Rm [3:0]
#[inline]
pub fn rm(raw: u32) -> u8 {
    (raw & 0xF) as u8
}

/// 12-bit 无符号立即数 [11:0]
#[inline]
pub fn imm12(raw: u32) -> u32 {
    raw & 0xFFF
}

/// 数据处理指令的循环移位立即数：imm8 循环右移 2 * rot
#[inline]
pub fn rotated_imm(raw: u32) -> u32 {
    let rot = ((raw >> 8) & 0xF) * 2;
    (raw & 0xFF).rotate_right(rot)
}

/// movw/movt 的 16-bit 立即数：imm4 [19:16] : imm12 [11:0]
#[inline]
pub fn mov_imm16(raw: u32) -> u32 {
    (((raw >> 16) & 0xF) << 12) | (raw & 0xFFF)
}

// ========== 编码 ==========

#[inline]
pub fn encode_ldr_imm(rd: u8, rn: u8, imm12: u32) -> u32 {
    LDR_IMM_MATCH | ((rn as u32 & 0xF) << 16) | ((rd as u32 & 0xF) << 12) | (imm12 & 0xFFF)
}

#[inline]
pub fn encode_add_pp_imm(rd: u8, imm8: u32, rot: u32) -> u32 {
    ADD_PP_IMM_MATCH | ((rd as u32 & 0xF) << 12) | ((rot & 0xF) << 8) | (imm8 & 0xFF)
}

#[inline]
pub fn encode_add_pp_reg(rd: u8, rm: u8) -> u32 {
    ADD_PP_REG_MATCH | ((rd as u32 & 0xF) << 12) | (rm as u32 & 0xF)
}

#[inline]
pub fn encode_movw(rd: u8, imm16: u32) -> u32 {
    MOVW_MATCH | (((imm16 >> 12) & 0xF) << 16) | ((rd as u32 & 0xF) << 12) | (imm16 & 0xFFF)
}

#[inline]
pub fn encode_movt(rd: u8, imm16: u32) -> u32 {
    MOVT_MATCH | (((imm16 >> 12) & 0xF) << 16) | ((rd as u32 & 0xF) << 12) | (imm16 & 0xFFF)
}

/// 找到能表示 `value` 的 (imm8, rot)；不可表示时返回 None
pub fn encode_rotated_imm(value: u32) -> Option<(u32, u32)> {
    (0..16u32).find_map(|rot| {
        let imm8 = value.rotate_left(rot * 2);
        (imm8 <= 0xFF).then_some((imm8, rot))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_imm() {
        // add r0, pp, #0x1000: imm8 = 1, rot = 10
        let raw = encode_add_pp_imm(R0, 1, 10);
        assert_eq!(rotated_imm(raw), 0x1000);
        assert_eq!(encode_rotated_imm(0x1000), Some((1, 10)));
        assert_eq!(encode_rotated_imm(0xFF), Some((0xFF, 0)));
        assert_eq!(encode_rotated_imm(0x101), None);
    }

    #[test]
    fn test_rotated_imm_wraps_around() {
        // 0xF000000F = 0xFF 循环右移 4
        let raw = encode_add_pp_imm(R0, 0xFF, 2);
        assert_eq!(rotated_imm(raw), 0xF000_000F);
    }

    #[test]
    fn test_mov_imm16() {
        let movw = encode_movw(IP, 0xBEEF);
        assert!(matches(movw, MOV_IP_MASK, MOVW_IP_MATCH));
        assert_eq!(mov_imm16(movw), 0xBEEF);
        let movt = encode_movt(IP, 0x1234);
        assert!(matches(movt, MOV_IP_MASK, MOVT_IP_MATCH));
        assert_eq!(mov_imm16(movt), 0x1234);
    }

    #[test]
    fn test_ldr_fields() {
        let raw = encode_ldr_imm(LR, PP, 0x7B);
        assert!(matches(raw, LDR_PP_MASK, LDR_PP_MATCH));
        assert_eq!(rd(raw), LR);
        assert_eq!(rn(raw), PP);
        assert_eq!(imm12(raw), 0x7B);
    }
}
