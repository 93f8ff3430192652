//! 常量池与代码对象

use std::fmt;

use super::PatternError;

/// 带标签的堆对象引用（最低位为 1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub u32);

impl ObjectRef {
    pub fn raw(self) -> u32 {
        self.0
    }

    /// 去掉标签后的对象地址
    pub fn untagged(self) -> u32 {
        self.0 & !1
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj@0x{:08x}", self.untagged())
    }
}

/// 常量池条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEntry {
    /// 小整数；调用目标地址以按 4 字节对齐的值存放，不经写屏障
    Smi(u32),
    ArgumentsDescriptor(ObjectRef),
    IcData(ObjectRef),
    Object(ObjectRef),
    Null,
}

impl PoolEntry {
    pub fn type_name(&self) -> &'static str {
        match self {
            PoolEntry::Smi(_) => "Smi",
            PoolEntry::ArgumentsDescriptor(_) => "ArgumentsDescriptor",
            PoolEntry::IcData(_) => "ICData",
            PoolEntry::Object(_) => "Object",
            PoolEntry::Null => "null",
        }
    }
}

/// 代码对象的常量池
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPool {
    entries: Vec<PoolEntry>,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加条目并返回其索引
    pub fn push(&mut self, entry: PoolEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn at(&self, index: usize) -> Result<PoolEntry, PatternError> {
        self.entries.get(index).copied().ok_or(PatternError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn set_at(&mut self, index: usize, entry: PoolEntry) -> Result<(), PatternError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(PatternError::IndexOutOfRange { index, len })?;
        *slot = entry;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolEntry> {
        self.entries.iter()
    }
}

impl FromIterator<PoolEntry> for ObjectPool {
    fn from_iter<I: IntoIterator<Item = PoolEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// 编译后的代码对象：指令区间 + 常量池
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    entry: u32,
    size: u32,
    pool: ObjectPool,
}

impl Code {
    pub fn new(entry: u32, size: u32, pool: ObjectPool) -> Self {
        Self { entry, size, pool }
    }

    pub fn entry(&self) -> u32 {
        self.entry
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn end(&self) -> u32 {
        self.entry.saturating_add(self.size)
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ObjectPool {
        &mut self.pool
    }

    pub fn contains_instruction_at(&self, pc: u32) -> bool {
        pc >= self.entry && pc < self.end()
    }
}
