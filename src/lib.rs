//! archsim: 动态语言执行引擎的体系结构抽象层
//!
//! 本库包含两个相互配合的子系统：
//! - 调用点 / 跳转点模式匹配：从已生成的机器码中反向恢复常量池索引，
//!   并就地改写调用目标
//! - MIPS32 指令集仿真器：在非目标架构的宿主机上执行目标代码，
//!   附带交互式调试器
//!
//! # 模块结构
//!
//! - `memory`: 内存抽象层与指令缓存刷新接口
//! - `isa`: MIPS32 指令字段、解码、编码与反汇编
//! - `arm`: 调用/跳转模板使用的 ARM 编码与模板语法
//! - `pattern`: 常量池、调用点模式、跳转模式
//! - `sim`: 仿真器核心与调试器
//! - `isolate`: 执行上下文（每个上下文至多一个仿真器）
//! - `sim_env`: 程序加载与运行环境

pub mod arm;
pub mod isa;
pub mod isolate;
pub mod memory;
pub mod pattern;
pub mod sim;
pub mod sim_env;
