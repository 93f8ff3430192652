//! 调用点 / 跳转点模式识别
//!
//! 从已生成的 ARM 机器码中反推代码生成器的意图：
//! - `CallPattern`: 从调用返回地址向回解码，找到目标地址、参数描述符、IC 数据在常量池中的索引
//! - `JumpPattern`: 识别并改写 `movw ip / movt ip / bx ip` 绝对跳转
//! - `ObjectPool` / `Code`: 编译后代码对象及其常量池

mod call;
mod jump;
mod pool;

pub use call::CallPattern;
pub use jump::JumpPattern;
pub use pool::{Code, ObjectPool, ObjectRef, PoolEntry};

use thiserror::Error;

use crate::arm::TemplateError;
use crate::memory::MemError;

/// 模式解码错误
///
/// 出现任何一种都说明代码生成器与解码器已不同步，调用方应视为致命错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("no `blx lr` before return address 0x{pc:08x} (found 0x{found:08x})")]
    NotACall { pc: u32, found: u32 },
    #[error("return address 0x{pc:08x} lies outside code [0x{entry:08x}, 0x{end:08x})")]
    PcOutsideCode { pc: u32, entry: u32, end: u32 },
    #[error("{role} load targets r{found}, expected r{expected}")]
    UnexpectedRegister { role: &'static str, expected: u8, found: u8 },
    #[error("pool index {index} out of range (pool length {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("pool entry {index} is {found}, expected {expected}")]
    TypeMismatch { index: usize, expected: &'static str, found: &'static str },
    #[error("target address 0x{0:08x} is not 4-byte aligned")]
    MisalignedTarget(u32),
    #[error("no jump pattern at 0x{pc:08x}")]
    NotAJump { pc: u32 },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Memory(#[from] MemError),
}
