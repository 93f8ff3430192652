//! 模拟器错误与陷入
//!
//! # 类别
//!
//! - **陷入 (trap)**: 非法地址、未对齐访问、整数溢出。先以终止状态打开调试器，再让本次调用失败
//! - **不变量违反**: 未实现的编码、延迟槽中的跳转、被破坏的 callee-saved 寄存器
//! - **操作员退出**: 调试器中的 `quit`

use thiserror::Error;

use crate::isa::DecoderError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("illegal memory access at 0x{addr:08x}, pc=0x{pc:08x}")]
    IllegalAccess { addr: u32, pc: u32 },
    #[error("unaligned {access} at 0x{addr:08x}, pc=0x{pc:08x}")]
    Unaligned { access: &'static str, addr: u32, pc: u32 },
    #[error("integer overflow at pc=0x{pc:08x}")]
    Overflow { pc: u32 },
    #[error("unimplemented instruction 0x{raw:08x} at pc=0x{pc:08x}")]
    Unimplemented { raw: u32, pc: u32 },
    #[error("control transfer 0x{raw:08x} in delay slot at pc=0x{pc:08x}")]
    JumpInDelaySlot { raw: u32, pc: u32 },
    #[error("breakpoint in delay slot at pc=0x{pc:08x}")]
    BreakInDelaySlot { pc: u32 },
    #[error("callee-saved register {reg} not preserved: expected 0x{expected:08x}, found 0x{found:08x}")]
    CalleeSavedClobbered { reg: &'static str, expected: u32, found: u32 },
    #[error("simulation quit from debugger")]
    Quit,
    #[error("invalid simulator configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("decoder configuration: {0}")]
    Decoder(#[from] DecoderError),
    #[error("debugger console: {0}")]
    Console(#[from] std::io::Error),
}

impl SimError {
    /// 模拟的硬件陷入：打开调试器后不可恢复
    pub fn is_trap(&self) -> bool {
        matches!(
            self,
            SimError::IllegalAccess { .. } | SimError::Unaligned { .. } | SimError::Overflow { .. }
        )
    }
}

/// 有符号加法溢出：两操作数同号且结果符号与之不同
#[inline]
pub fn add_overflows(left: u32, right: u32, result: u32) -> bool {
    let (l, r, o) = (left as i32, right as i32, result as i32);
    (l < 0) == (r < 0) && (l < 0) != (o < 0)
}

/// 有符号减法溢出：两操作数异号且结果符号与左操作数不同
#[inline]
pub fn sub_overflows(left: u32, right: u32, result: u32) -> bool {
    let (l, r, o) = (left as i32, right as i32, result as i32);
    (l < 0) != (r < 0) && (l < 0) != (o < 0)
}
