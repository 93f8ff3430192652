//! 模拟地址空间
//!
//! 模拟器自己的栈区由模拟器持有，其余地址转发给宿主内存。
//! 所有访问先经过非法地址判定，再检查自然对齐。

use std::sync::Arc;

use super::SimError;
use crate::memory::{AccessSize, FlatMemory, MemError, MemResult, Memory};

/// 非法地址判定
pub type IllegalAddressFn = Arc<dyn Fn(u32) -> bool + Send + Sync>;

/// 默认规则：低 64 KiB 视为非法（捕获空指针附近的访问）
pub fn default_illegal_address() -> IllegalAddressFn {
    Arc::new(|addr| addr < 64 * 1024)
}

pub struct AddressSpace<'a> {
    stack: &'a mut FlatMemory,
    host: &'a mut dyn Memory,
    illegal: &'a (dyn Fn(u32) -> bool + Send + Sync),
}

impl<'a> AddressSpace<'a> {
    pub fn new(
        stack: &'a mut FlatMemory,
        host: &'a mut dyn Memory,
        illegal: &'a (dyn Fn(u32) -> bool + Send + Sync),
    ) -> Self {
        Self { stack, host, illegal }
    }

    pub fn is_illegal(&self, addr: u32) -> bool {
        (self.illegal)(addr)
    }

    fn check(&self, addr: u32, size: AccessSize, access: &'static str, pc: u32) -> Result<(), SimError> {
        if self.is_illegal(addr) {
            return Err(SimError::IllegalAccess { addr, pc });
        }
        if !addr.is_multiple_of(size.bytes() as u32) {
            return Err(SimError::Unaligned { access, addr, pc });
        }
        Ok(())
    }

    fn map_err(err: MemError, access: &'static str, pc: u32) -> SimError {
        match err {
            MemError::Unaligned { addr, .. } => SimError::Unaligned { access, addr, pc },
            MemError::OutOfRange { addr, .. } => SimError::IllegalAccess { addr, pc },
        }
    }

    /// 取指
    pub fn fetch(&self, pc: u32) -> Result<u32, SimError> {
        self.check(pc, AccessSize::Word, "instruction fetch", pc)?;
        self.load32(pc).map_err(|e| Self::map_err(e, "instruction fetch", pc))
    }

    pub fn read(&self, addr: u32, size: AccessSize, access: &'static str, pc: u32) -> Result<u32, SimError> {
        self.check(addr, size, access, pc)?;
        let value = match size {
            AccessSize::Byte => self.load8(addr).map(u32::from),
            AccessSize::Half => self.load16(addr).map(u32::from),
            AccessSize::Word => self.load32(addr),
        };
        value.map_err(|e| Self::map_err(e, access, pc))
    }

    pub fn write(
        &mut self,
        addr: u32,
        size: AccessSize,
        value: u32,
        access: &'static str,
        pc: u32,
    ) -> Result<(), SimError> {
        self.check(addr, size, access, pc)?;
        let result = match size {
            AccessSize::Byte => self.store8(addr, value as u8),
            AccessSize::Half => self.store16(addr, value as u16),
            AccessSize::Word => self.store32(addr, value),
        };
        result.map_err(|e| Self::map_err(e, access, pc))
    }
}

impl AddressSpace<'_> {
    fn route(&self, addr: u32) -> &dyn Memory {
        if self.stack.contains(addr) {
            &*self.stack
        } else {
            &*self.host
        }
    }

    fn route_mut(&mut self, addr: u32) -> &mut dyn Memory {
        if self.stack.contains(addr) {
            &mut *self.stack
        } else {
            &mut *self.host
        }
    }
}

/// 不做合法性判定的原始访问，供调试器与反汇编器使用
impl Memory for AddressSpace<'_> {
    fn load8(&self, addr: u32) -> MemResult<u8> {
        self.route(addr).load8(addr)
    }

    fn load16(&self, addr: u32) -> MemResult<u16> {
        self.route(addr).load16(addr)
    }

    fn load32(&self, addr: u32) -> MemResult<u32> {
        self.route(addr).load32(addr)
    }

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()> {
        self.route_mut(addr).store8(addr, value)
    }

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()> {
        self.route_mut(addr).store16(addr, value)
    }

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.route_mut(addr).store32(addr, value)
    }
}
