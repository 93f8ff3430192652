//! 内存抽象层
//!
//! 本模块定义了内存访问的统一接口 `Memory` trait、
//! 线性内存实现 `FlatMemory`，以及代码改写后使用的指令缓存刷新接口 `ICache`。
//!
//! 仿真器与模式匹配器都只通过 `Memory` 看到“宿主地址空间”，
//! 具体的映射方式（单块内存、栈区 + 宿主区等）由实现决定。

use std::ops::Range;

use thiserror::Error;

/// 访存粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Half,
    Word,
}

impl AccessSize {
    pub fn bytes(self) -> usize {
        match self {
            AccessSize::Byte => 1,
            AccessSize::Half => 2,
            AccessSize::Word => 4,
        }
    }
}

/// 内存访问错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemError {
    /// 地址未按访问粒度对齐
    #[error("unaligned {access:?} access at 0x{addr:08x}")]
    Unaligned { addr: u32, access: AccessSize },
    /// 地址越界（未映射到当前内存区域）
    #[error(
        "out-of-range {access:?} access at 0x{addr:08x} (region=0x{base:08x}..0x{end:08x})",
        end = base.wrapping_add(*size as u32)
    )]
    OutOfRange { addr: u32, access: AccessSize, base: u32, size: usize },
}

pub type MemResult<T> = Result<T, MemError>;

/// 内存访问的统一接口（小端序）
pub trait Memory {
    fn load8(&self, addr: u32) -> MemResult<u8>;

    fn load16(&self, addr: u32) -> MemResult<u16>;

    fn load32(&self, addr: u32) -> MemResult<u32>;

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()>;

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()>;

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()>;
}

/// 指令缓存刷新原语
///
/// 代码被改写之后，调用方必须对改写过的字节范围调用 `flush`。
pub trait ICache {
    fn flush(&mut self, start: u32, len: u32);
}

/// 不维护指令缓存的宿主（例如仿真执行时）使用的空实现
#[derive(Debug, Default, Clone, Copy)]
pub struct NoICache;

impl ICache for NoICache {
    fn flush(&mut self, start: u32, len: u32) {
        tracing::trace!(start, len, "icache flush (no-op)");
    }
}

/// 简单线性内存实现
///
/// 使用 `Vec<u8>` 存储一段地址空间，支持基地址偏移。
pub struct FlatMemory {
    data: Vec<u8>,
    base_addr: u32,
}

impl FlatMemory {
    /// 创建一个指定大小的内存区域
    ///
    /// # 示例
    ///
    /// ```
    /// use archsim::memory::FlatMemory;
    ///
    /// let mem = FlatMemory::new(64 * 1024, 0x1_0000);
    /// assert!(mem.contains(0x1_0000));
    /// ```
    pub fn new(size: usize, base_addr: u32) -> Self {
        FlatMemory {
            data: vec![0; size],
            base_addr,
        }
    }

    pub fn base_addr(&self) -> u32 {
        self.base_addr
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 地址是否落在本区域内
    pub fn contains(&self, addr: u32) -> bool {
        addr.checked_sub(self.base_addr)
            .is_some_and(|offset| (offset as usize) < self.data.len())
    }

    /// 区域结束地址（不含），溢出时饱和
    pub fn end_addr(&self) -> u32 {
        self.base_addr.saturating_add(self.data.len() as u32)
    }

    /// 对齐与越界检查后返回数据区内的下标范围
    fn span(&self, addr: u32, access: AccessSize) -> MemResult<Range<usize>> {
        if !addr.is_multiple_of(access.bytes() as u32) {
            return Err(MemError::Unaligned { addr, access });
        }
        let start = self.bounds_check(addr, access.bytes(), access)?;
        Ok(start..start + access.bytes())
    }

    fn read<const N: usize>(&self, addr: u32, access: AccessSize) -> MemResult<[u8; N]> {
        let span = self.span(addr, access)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[span]);
        Ok(bytes)
    }

    fn write(&mut self, addr: u32, access: AccessSize, bytes: &[u8]) -> MemResult<()> {
        let span = self.span(addr, access)?;
        self.data[span].copy_from_slice(bytes);
        Ok(())
    }

    fn bounds_check(&self, addr: u32, len: usize, access: AccessSize) -> MemResult<usize> {
        let out_of_range = MemError::OutOfRange {
            addr,
            access,
            base: self.base_addr,
            size: self.data.len(),
        };
        let relative = addr.checked_sub(self.base_addr).ok_or(out_of_range)? as usize;
        let end = relative.checked_add(len).ok_or(out_of_range)?;
        if end > self.data.len() {
            return Err(out_of_range);
        }
        Ok(relative)
    }

    /// 批量写入字节
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> MemResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let start = self.bounds_check(addr, data.len(), AccessSize::Byte)?;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 批量读取字节（返回副本）
    pub fn read_bytes(&self, addr: u32, len: usize) -> MemResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = self.bounds_check(addr, len, AccessSize::Byte)?;
        Ok(self.data[start..start + len].to_vec())
    }

    /// 将一段指令字依次写入 `addr` 起始的位置
    pub fn write_words(&mut self, addr: u32, words: &[u32]) -> MemResult<()> {
        for (i, &word) in words.iter().enumerate() {
            self.store32(addr.wrapping_add((i * 4) as u32), word)?;
        }
        Ok(())
    }

    /// 将指定范围填充为固定字节
    pub fn fill(&mut self, addr: u32, len: usize, value: u8) -> MemResult<()> {
        if len == 0 {
            return Ok(());
        }
        let start = self.bounds_check(addr, len, AccessSize::Byte)?;
        self.data[start..start + len].fill(value);
        Ok(())
    }
}

impl Memory for FlatMemory {
    fn load8(&self, addr: u32) -> MemResult<u8> {
        self.read::<1>(addr, AccessSize::Byte).map(|[b]| b)
    }

    fn load16(&self, addr: u32) -> MemResult<u16> {
        self.read(addr, AccessSize::Half).map(u16::from_le_bytes)
    }

    fn load32(&self, addr: u32) -> MemResult<u32> {
        self.read(addr, AccessSize::Word).map(u32::from_le_bytes)
    }

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()> {
        self.write(addr, AccessSize::Byte, &[value])
    }

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()> {
        self.write(addr, AccessSize::Half, &value.to_le_bytes())
    }

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.write(addr, AccessSize::Word, &value.to_le_bytes())
    }
}
