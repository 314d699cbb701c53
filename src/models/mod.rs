//! # 数据模型模块
//!
//! 定义机器配置、队列脚本参数和赝势泛函族的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `writers/` 和 `commands/` 使用
//! - 子模块: machine, psp, queue_params

pub mod machine;
pub mod psp;
pub mod queue_params;

pub use machine::{MachineProfile, MachineRegistry, FALLBACK_MACHINE};
pub use psp::PspFunctional;
pub use queue_params::{QueueScriptParams, QueueType, RocketCommands};
