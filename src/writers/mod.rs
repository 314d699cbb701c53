//! # 配置文件写出模块
//!
//! 根据扁平的参数集写出 atomate / FireWorks 所需的 JSON/YAML 配置文件。
//! 文件种类是封闭的枚举 `ConfigFileKind`，每种对应一个固定结构的记录。
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs`, `commands/template.rs` 使用
//! - 使用 `models/`, `utils/fs.rs`
//! - 子模块: merge, records

pub mod merge;
pub mod records;

pub use merge::{update_config_file, MergePolicy};

use crate::error::Result;
use crate::models::{MachineProfile, QueueScriptParams, QueueType, RocketCommands};
use crate::utils::{fs as ufs, output};

use std::fmt;
use std::path::{Path, PathBuf};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// 按扩展名判断
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(FileFormat::Json),
            Some("yaml") | Some("yml") => Some(FileFormat::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Json => write!(f, "JSON"),
            FileFormat::Yaml => write!(f, "YAML"),
        }
    }
}

/// 配置文件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileKind {
    Db,
    Launchpad,
    FwConfig,
    Fworker,
    Qadapter,
}

impl ConfigFileKind {
    /// 必需文件须由用户提供，其余由本工具生成
    pub const REQUIRED: [ConfigFileKind; 2] = [ConfigFileKind::Db, ConfigFileKind::Launchpad];
    pub const GENERATED: [ConfigFileKind; 3] = [
        ConfigFileKind::FwConfig,
        ConfigFileKind::Fworker,
        ConfigFileKind::Qadapter,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ConfigFileKind::Db => "db.json",
            ConfigFileKind::Launchpad => "my_launchpad.yaml",
            ConfigFileKind::FwConfig => "FW_config.yaml",
            ConfigFileKind::Fworker => "my_fworker.yaml",
            ConfigFileKind::Qadapter => "my_qadapter.yaml",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    pub fn all() -> impl Iterator<Item = ConfigFileKind> {
        Self::REQUIRED.into_iter().chain(Self::GENERATED)
    }
}

/// 队列参数的来源
#[derive(Debug, Clone)]
pub enum QueueSource {
    /// 用户的队列脚本
    Script,
    /// 机器注册表中的配置，其字段会覆盖到 qadapter 上
    Machine(MachineProfile),
}

/// 写出配置文件所需的全部参数
#[derive(Debug, Clone)]
pub struct WriterParams {
    /// 存放 config/ 与 logs/ 的目录（绝对路径）
    pub store_dir: PathBuf,
    pub machine: String,
    pub queue_type: QueueType,
    pub vasp_cmd: String,
    pub nodes: u32,
    pub ppn: u32,
    pub pmem: String,
    pub walltime: String,
    pub queue: String,
    pub account: String,
    pub job_name: String,
    pub pre_rocket: RocketCommands,
    pub post_rocket: RocketCommands,
    pub source: QueueSource,
}

fn parse_count(field: &str, value: Option<&str>, default: u32) -> u32 {
    match value {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            output::print_warning(&format!(
                "Cannot read {}='{}' as a number, using {}",
                field, v, default
            ));
            default
        }),
    }
}

impl WriterParams {
    /// 模板缺省值（PSU ACI）
    pub fn new(store_dir: &Path, machine: &str) -> Self {
        WriterParams {
            store_dir: ufs::absolute(store_dir),
            machine: machine.to_string(),
            queue_type: QueueType::Pbs,
            vasp_cmd: "mpirun vasp_std".to_string(),
            nodes: 1,
            ppn: 24,
            pmem: "8gb".to_string(),
            walltime: "48:00:00".to_string(),
            queue: "open".to_string(),
            account: "open".to_string(),
            job_name: "dfttk".to_string(),
            pre_rocket: RocketCommands::Single("module load intel impi vasp".to_string()),
            post_rocket: RocketCommands::default(),
            source: QueueSource::Script,
        }
    }

    /// 使用解析出的队列脚本参数，缺失项取模板缺省值
    pub fn from_script(
        store_dir: &Path,
        machine: &str,
        queue_type: QueueType,
        script: &QueueScriptParams,
    ) -> Self {
        let mut p = Self::new(store_dir, machine);
        p.queue_type = queue_type;
        p.nodes = parse_count("nodes", script.nodes.as_deref(), p.nodes);
        p.ppn = parse_count("ppn", script.ppn.as_deref(), p.ppn);

        let fields = [
            (&mut p.vasp_cmd, &script.vasp_cmd),
            (&mut p.pmem, &script.pmem),
            (&mut p.walltime, &script.walltime),
            (&mut p.queue, &script.queue),
            (&mut p.account, &script.account),
            (&mut p.job_name, &script.job_name),
        ];
        for (slot, value) in fields {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        if let Some(r) = &script.pre_rocket {
            p.pre_rocket = r.clone();
        }
        p.post_rocket = script.post_rocket.clone().unwrap_or_default();
        p
    }

    /// 使用机器注册表中的配置
    pub fn from_machine(
        store_dir: &Path,
        machine: &str,
        profile: &MachineProfile,
        nodes: u32,
        ppn: u32,
        pmem: &str,
    ) -> Self {
        let mut p = Self::new(store_dir, machine);
        p.queue_type = profile.queue_type;
        p.nodes = nodes;
        p.ppn = ppn;
        p.pmem = pmem.to_string();
        p.vasp_cmd = profile.vasp_cmd.clone();
        if let Some(queue) = &profile.queue {
            p.queue = queue.clone();
        }
        if let Some(account) = &profile.account {
            p.account = account.clone();
        }
        if !profile.pre_rocket.is_empty() {
            p.pre_rocket = profile.pre_rocket.clone();
        }
        p.post_rocket = profile.post_rocket.clone();
        p.source = QueueSource::Machine(profile.clone());
        p
    }

    pub fn config_dir(&self) -> PathBuf {
        self.store_dir.join("config")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.store_dir.join("logs")
    }
}

/// 生成某一种配置文件的文本
pub fn render(kind: ConfigFileKind, params: &WriterParams) -> Result<String> {
    let text = match kind {
        ConfigFileKind::Db => serde_json::to_string_pretty(&records::DbConfig::default())?,
        ConfigFileKind::Launchpad => serde_yaml::to_string(&records::LaunchpadConfig::default())?,
        ConfigFileKind::FwConfig => serde_yaml::to_string(&records::FwConfig::new(params))?,
        ConfigFileKind::Fworker => serde_yaml::to_string(&records::FworkerConfig::new(params))?,
        ConfigFileKind::Qadapter => serde_yaml::to_string(&records::qadapter_record(params)?)?,
    };
    Ok(text)
}

/// 写出到 `<dir>/<file_name>`
pub fn write_config_to(kind: ConfigFileKind, params: &WriterParams, dir: &Path) -> Result<PathBuf> {
    ufs::create_dir(dir)?;
    let path = dir.join(kind.file_name());
    ufs::write_file(&path, &render(kind, params)?)?;
    Ok(path)
}

/// 写出到 `<store>/config/<file_name>`
pub fn write_config(kind: ConfigFileKind, params: &WriterParams) -> Result<PathBuf> {
    write_config_to(kind, params, &params.config_dir())
}
