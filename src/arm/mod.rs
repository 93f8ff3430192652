//! ARM 代码模板
//!
//! - `fields`: 指令字段提取与编码
//! - `templates`: 常量池加载 / 调用点序列的匹配与合成

pub mod fields;
pub mod templates;

pub use templates::{
    emit_call, emit_pool_load, index_to_offset, match_pool_load, offset_to_index, PoolLoad, PoolLoadForm,
    TemplateError,
};
