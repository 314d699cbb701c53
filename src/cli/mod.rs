//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `setup`: 配置 atomate/FireWorks 与 pymatgen
//! - `check`: 检查现有配置
//! - `parse`: 解析队列脚本并输出参数
//! - `machines`: 列出集群机器注册表
//! - `template`: 写出 db.json / my_launchpad.yaml 模板
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: check, machines, parse, setup, template

pub mod check;
pub mod machines;
pub mod parse;
pub mod setup;
pub mod template;

use clap::{Parser, Subcommand};

/// dfttk-config - DFTTK 集群配置工具
#[derive(Parser)]
#[command(name = "dfttk-config")]
#[command(version)]
#[command(about = "Configure DFTTK (pymatgen + FireWorks/atomate) for a computing cluster", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Write atomate/FireWorks config files and configure pymatgen
    Setup(setup::SetupArgs),

    /// Test the current pymatgen and atomate configuration
    Check(check::CheckArgs),

    /// Parse a queue submission script and print the extracted parameters
    Parse(parse::ParseArgs),

    /// List the known cluster machine profiles
    Machines(machines::MachinesArgs),

    /// Write default db.json and my_launchpad.yaml templates
    Template(template::TemplateArgs),
}
