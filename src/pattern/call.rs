//! 调用点模式
//!
//! 代码生成器为每个 IC 调用发出固定模板（见 `arm::templates`）：
//!
//! ```text
//! <load r5 ← ic data> <load r4 ← args descriptor> <load lr ← target> blx lr
//!                                                                         ^ pc
//! ```
//!
//! `pc` 为调用的返回地址。目标地址在构造时解码，参数描述符与 IC 数据按需解码，
//! 且 IC 数据的加载紧挨在参数描述符之前，必须先解出后者。

use tracing::{debug, trace};

use super::{Code, ObjectRef, PatternError, PoolEntry};
use crate::arm::fields::{BLX_LR, LR, R4, R5};
use crate::arm::templates::{match_pool_load, PoolLoad};
use crate::memory::Memory;

/// 匹配结束于 `end` 的加载，并要求其目标寄存器为 `reg`
fn load_into(mem: &dyn Memory, end: u32, reg: u8, role: &'static str) -> Result<PoolLoad, PatternError> {
    let load = match_pool_load(mem, end)?;
    if load.reg != reg {
        return Err(PatternError::UnexpectedRegister {
            role,
            expected: reg,
            found: load.reg,
        });
    }
    trace!(role, index = load.index, form = ?load.form, start = format_args!("0x{:08x}", load.start), "pool load decoded");
    Ok(load)
}

/// 已解码的常量池索引；每个字段只解码一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DecodeState {
    target: usize,
    /// 目标加载序列的起点，即参数描述符加载的终点
    target_start: u32,
    /// (索引, 序列起点)
    args_desc: Option<(usize, u32)>,
    ic_data: Option<usize>,
}

impl DecodeState {
    fn decode(mem: &dyn Memory, call_addr: u32) -> Result<Self, PatternError> {
        let load = load_into(mem, call_addr, LR, "target")?;
        Ok(Self {
            target: load.index,
            target_start: load.start,
            args_desc: None,
            ic_data: None,
        })
    }

    fn args_desc(&mut self, mem: &dyn Memory) -> Result<(usize, u32), PatternError> {
        if let Some(decoded) = self.args_desc {
            return Ok(decoded);
        }
        let load = load_into(mem, self.target_start, R4, "arguments descriptor")?;
        let decoded = (load.index, load.start);
        self.args_desc = Some(decoded);
        Ok(decoded)
    }

    fn ic_data(&mut self, mem: &dyn Memory) -> Result<usize, PatternError> {
        if let Some(index) = self.ic_data {
            return Ok(index);
        }
        let (_, args_start) = self.args_desc(mem)?;
        let load = load_into(mem, args_start, R5, "ic data")?;
        self.ic_data = Some(load.index);
        Ok(load.index)
    }
}

/// 调用点上的解码视图；按需构造，用完即弃
pub struct CallPattern<'a> {
    pc: u32,
    code: &'a mut Code,
    mem: &'a dyn Memory,
    state: DecodeState,
}

impl<'a> CallPattern<'a> {
    /// `pc` 为 `blx lr` 之后的返回地址
    pub fn new(pc: u32, code: &'a mut Code, mem: &'a dyn Memory) -> Result<Self, PatternError> {
        let call_addr = pc.wrapping_sub(4);
        if !code.contains_instruction_at(call_addr) {
            return Err(PatternError::PcOutsideCode {
                pc,
                entry: code.entry(),
                end: code.end(),
            });
        }
        let found = mem.load32(call_addr)?;
        if found != BLX_LR {
            return Err(PatternError::NotACall { pc, found });
        }
        let state = DecodeState::decode(mem, call_addr)?;
        Ok(Self { pc, code, mem, state })
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn target_index(&self) -> usize {
        self.state.target
    }

    pub fn target_address(&self) -> Result<u32, PatternError> {
        let index = self.state.target;
        match self.code.pool().at(index)? {
            PoolEntry::Smi(addr) => Ok(addr),
            other => Err(type_mismatch(index, "Smi", &other)),
        }
    }

    /// 只改写常量池槽位，不改指令，因此不需要刷新指令缓存
    pub fn set_target_address(&mut self, addr: u32) -> Result<(), PatternError> {
        if !addr.is_multiple_of(4) {
            return Err(PatternError::MisalignedTarget(addr));
        }
        let index = self.state.target;
        self.code.pool_mut().set_at(index, PoolEntry::Smi(addr))?;
        debug!(pc = format_args!("0x{:08x}", self.pc), index, target = format_args!("0x{addr:08x}"), "call target patched");
        Ok(())
    }

    pub fn arguments_descriptor(&mut self) -> Result<ObjectRef, PatternError> {
        let (index, _) = self.state.args_desc(self.mem)?;
        match self.code.pool().at(index)? {
            PoolEntry::ArgumentsDescriptor(obj) => Ok(obj),
            other => Err(type_mismatch(index, "ArgumentsDescriptor", &other)),
        }
    }

    pub fn ic_data(&mut self) -> Result<ObjectRef, PatternError> {
        let index = self.state.ic_data(self.mem)?;
        match self.code.pool().at(index)? {
            PoolEntry::IcData(obj) => Ok(obj),
            other => Err(type_mismatch(index, "ICData", &other)),
        }
    }
}

fn type_mismatch(index: usize, expected: &'static str, found: &PoolEntry) -> PatternError {
    PatternError::TypeMismatch {
        index,
        expected,
        found: found.type_name(),
    }
}
