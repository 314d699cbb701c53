//! # 解析器模块
//!
//! 赝势名称规范化与队列提交脚本解析。
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `potcar/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: psp_name, queue_script

pub mod psp_name;
pub mod queue_script;

pub use psp_name::parse_psp_name;
pub use queue_script::parse_queue_script;
