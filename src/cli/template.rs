//! # template 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/template.rs`

use clap::Args;
use std::path::PathBuf;

/// template 子命令参数
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Folder to write the templates into
    #[arg(default_value = "config")]
    pub dir: PathBuf,

    /// Overwrite existing files
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
