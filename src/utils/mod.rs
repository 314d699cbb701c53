//! # 工具函数模块
//!
//! 提供美化输出、spinner、文件系统包装、配置文件发现与 shell rc 补丁。
//!
//! ## 依赖关系
//! - 被 `commands/`, `writers/`, `potcar/` 模块使用
//! - 子模块: discovery, fs, output, progress, shell

pub mod discovery;
pub mod fs;
pub mod output;
pub mod progress;
pub mod shell;
