//! # parse 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use crate::models::QueueType;
use clap::Args;
use std::path::PathBuf;

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Queue submission script
    #[arg(default_value = "vaspjob.pbs")]
    pub script: PathBuf,

    /// Queue system of the script
    #[arg(long, value_enum, default_value = "pbs")]
    pub queue_type: QueueType,

    /// Substring marking the VASP run line
    #[arg(short = 'v', long, default_value = "vasp_std")]
    pub vasp_cmd_flag: String,
}
