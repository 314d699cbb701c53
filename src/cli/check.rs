//! # check 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/check.rs`

use clap::Args;

/// check 子命令参数
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only test the pymatgen configuration
    #[arg(long, default_value_t = false)]
    pub pymatgen: bool,

    /// Only test the atomate configuration
    #[arg(long, default_value_t = false)]
    pub atomate: bool,
}
