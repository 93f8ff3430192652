//! 进程级可调参数
//!
//! 测试修改这些值时应放在独立的集成测试中，避免干扰并行运行的单元测试。

use std::sync::atomic::{AtomicU64, Ordering};

/// 执行到第 N 条指令时强制打开调试器；0 表示关闭
static STOP_SIM_AT: AtomicU64 = AtomicU64::new(0);

pub fn set_stop_sim_at(count: u64) {
    STOP_SIM_AT.store(count, Ordering::Relaxed);
}

pub fn stop_sim_at() -> u64 {
    STOP_SIM_AT.load(Ordering::Relaxed)
}
