//! 执行上下文
//!
//! 每个 isolate 持有自己的宿主内存、堆描述，以及至多一个模拟器。
//! 模拟器在第一次使用时创建，之后从 isolate 自身状态中取得，不经过任何全局表。

use std::sync::Arc;

use tracing::debug;

use crate::memory::Memory;
use crate::sim::{ShellExit, SimError, Simulator, SimulatorBuilder};

/// 堆成员查询，供调试器的 `printobject` 使用
pub trait HeapInspector: Send + Sync {
    /// `addr` 是否指向堆中的对象
    fn contains(&self, addr: u32) -> bool;

    /// 对象的可读描述
    fn describe(&self, _mem: &dyn Memory, _addr: u32) -> Option<String> {
        None
    }
}

/// 以连续区间 `[start, end)` 表示的堆
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRegion {
    pub start: u32,
    pub end: u32,
}

impl HeapRegion {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl HeapInspector for HeapRegion {
    fn contains(&self, addr: u32) -> bool {
        (self.start..self.end).contains(&addr)
    }

    fn describe(&self, mem: &dyn Memory, addr: u32) -> Option<String> {
        let header = mem.load32(addr).ok()?;
        Some(format!("object at 0x{addr:08x}, header 0x{header:08x}"))
    }
}

type BuilderFactory = Box<dyn Fn() -> SimulatorBuilder + Send>;

pub struct Isolate {
    memory: Box<dyn Memory + Send>,
    heap: Arc<dyn HeapInspector>,
    builder: BuilderFactory,
    simulator: Option<Simulator>,
}

impl Isolate {
    pub fn new(memory: Box<dyn Memory + Send>, heap: Arc<dyn HeapInspector>) -> Self {
        Self {
            memory,
            heap,
            builder: Box::new(SimulatorBuilder::new),
            simulator: None,
        }
    }

    /// 设置之后创建模拟器时使用的配置；不影响已存在的模拟器
    pub fn with_simulator_builder(mut self, builder: impl Fn() -> SimulatorBuilder + Send + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn memory(&self) -> &dyn Memory {
        &*self.memory
    }

    pub fn memory_mut(&mut self) -> &mut dyn Memory {
        &mut *self.memory
    }

    pub fn heap(&self) -> &Arc<dyn HeapInspector> {
        &self.heap
    }

    pub fn has_simulator(&self) -> bool {
        self.simulator.is_some()
    }

    fn get_or_create<'s>(
        slot: &'s mut Option<Simulator>,
        builder: &BuilderFactory,
        heap: &Arc<dyn HeapInspector>,
    ) -> Result<&'s mut Simulator, SimError> {
        let sim = match slot.take() {
            Some(sim) => sim,
            None => {
                debug!("creating simulator for isolate");
                builder().with_heap_inspector(Arc::clone(heap)).build()?
            }
        };
        Ok(slot.insert(sim))
    }

    /// 取得（必要时创建）本 isolate 的模拟器
    pub fn simulator(&mut self) -> Result<&mut Simulator, SimError> {
        Self::get_or_create(&mut self.simulator, &self.builder, &self.heap)
    }

    /// 在本 isolate 的模拟器上执行一次调用
    pub fn call(&mut self, entry: u32, args: [u32; 4]) -> Result<i64, SimError> {
        let sim = Self::get_or_create(&mut self.simulator, &self.builder, &self.heap)?;
        sim.call(&mut *self.memory, entry, args)
    }

    /// 手动打开调试器
    pub fn debug(&mut self) -> Result<ShellExit, SimError> {
        let sim = Self::get_or_create(&mut self.simulator, &self.builder, &self.heap)?;
        sim.debug(&mut *self.memory)
    }

    /// 释放模拟器及其栈区
    pub fn shutdown_simulator(&mut self) {
        if self.simulator.take().is_some() {
            debug!("simulator shut down");
        }
    }
}
