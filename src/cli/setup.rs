//! # setup 子命令 CLI 定义
//!
//! 配置 atomate/FireWorks 与 pymatgen
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/setup.rs`

use crate::models::QueueType;
use clap::Args;
use std::path::PathBuf;

/// setup 子命令参数
#[derive(Args, Debug, Clone)]
pub struct SetupArgs {
    /// Configure atomate/FireWorks (both parts run when neither flag is given)
    #[arg(short = 'a', long, default_value_t = false)]
    pub atomate: bool,

    /// Configure pymatgen (both parts run when neither flag is given)
    #[arg(long, default_value_t = false)]
    pub pymatgen: bool,

    // ─────────────────────────────────────────────────────────────
    // atomate options
    // ─────────────────────────────────────────────────────────────
    /// Directory in which config/ and logs/ are created
    #[arg(short = 'p', long, default_value = ".")]
    pub prefix: PathBuf,

    /// Folder (searched recursively) holding db.json, my_launchpad.yaml and optional files
    #[arg(short = 'c', long, default_value = "config")]
    pub config_folder: PathBuf,

    /// File name of the queue submission script
    #[arg(short = 'q', long, default_value = "vaspjob.pbs")]
    pub queue_script: String,

    /// Queue system of the submission script
    #[arg(long, value_enum, default_value = "pbs")]
    pub queue_type: QueueType,

    /// Substring marking the VASP run line in the queue script
    #[arg(short = 'v', long, default_value = "vasp_std")]
    pub vasp_cmd_flag: String,

    /// Cluster name used when no queue script is found
    #[arg(short = 'M', long, default_value = "aci")]
    pub machine: String,

    /// YAML file replacing the built-in machine table
    #[arg(long)]
    pub machines: Option<PathBuf>,

    /// Number of nodes
    #[arg(short = 'N', long, default_value_t = 1)]
    pub nodes: u32,

    /// Processors per node
    #[arg(short = 'n', long, default_value_t = 16)]
    pub ppn: u32,

    /// Memory per processor
    #[arg(long, default_value = "8gb")]
    pub pmem: String,

    /// Keep generated values that name existing paths when the user file names missing ones
    #[arg(long, default_value_t = false)]
    pub preserve_paths: bool,

    // ─────────────────────────────────────────────────────────────
    // pymatgen options
    // ─────────────────────────────────────────────────────────────
    /// Folders containing pseudopotential folders or archives (potpaw_PBE.54.tar.gz, ...)
    #[arg(long = "psp-dir", num_args = 1..)]
    pub psp_dirs: Vec<PathBuf>,

    /// Materials Project API key
    #[arg(long, env = "PMG_MAPI_KEY")]
    pub mapi: Option<String>,

    /// Default functional for pymatgen
    #[arg(long, default_value = "PBE")]
    pub default_functional: String,

    /// Where pymatgen stores the processed pseudopotentials
    #[arg(long, default_value = "psp_pymatgen")]
    pub psp_store: PathBuf,

    /// Also search for pseudopotentials next to the cluster's VASP installation
    #[arg(long, default_value_t = false)]
    pub aci: bool,
}
