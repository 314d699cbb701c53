//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `models/`, `writers/`, `potcar/`, `utils/`
//! - 子模块: check, machines, parse, pymatgen, setup, template

pub mod check;
pub mod machines;
pub mod parse;
pub mod pymatgen;
pub mod setup;
pub mod template;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Setup(args) => setup::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Parse(args) => parse::execute(args),
        Commands::Machines(args) => machines::execute(args),
        Commands::Template(args) => template::execute(args),
    }
}
