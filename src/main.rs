//! # dfttk-config - DFTTK 集群配置工具
//!
//! 为 DFTTK 在计算集群上准备 pymatgen 与 atomate/FireWorks 的配置。
//!
//! ## 子命令
//! - `setup`     - 写出 atomate 配置文件、配置 pymatgen 并导入赝势
//! - `check`     - 检查现有配置
//! - `parse`     - 解析 PBS 队列脚本
//! - `machines`  - 列出内置或用户提供的集群机器配置
//! - `template`  - 写出 db.json / my_launchpad.yaml 模板
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (队列脚本与赝势名解析)
//!   │     ├── writers/   (配置文件写出与合并)
//!   │     ├── potcar/    (VASP 与赝势定位、导入)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod potcar;
mod utils;
mod writers;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
