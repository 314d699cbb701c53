//! # machines 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/machines.rs`

use clap::Args;
use std::path::PathBuf;

/// machines 子命令参数
#[derive(Args, Debug)]
pub struct MachinesArgs {
    /// YAML file replacing the built-in machine table
    #[arg(long)]
    pub machines: Option<PathBuf>,

    /// Number of nodes (affects SLURM launch commands)
    #[arg(short = 'N', long, default_value_t = 1)]
    pub nodes: u32,

    /// Processors per node (affects SLURM launch commands)
    #[arg(short = 'n', long, default_value_t = 16)]
    pub ppn: u32,
}
