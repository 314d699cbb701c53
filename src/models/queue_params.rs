//! # 队列脚本参数数据模型
//!
//! 存储从 PBS 提交脚本中提取的资源指令与 rocket 命令。
//!
//! ## 依赖关系
//! - 被 `parsers/queue_script.rs` 填充
//! - 被 `writers/` 和 `potcar/` 使用

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 队列系统类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum QueueType {
    /// PBS / Torque
    #[serde(rename = "PBS", alias = "pbs")]
    Pbs,
    /// Slurm
    #[serde(rename = "SLURM", alias = "slurm")]
    Slurm,
}

impl std::fmt::Display for QueueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueType::Pbs => write!(f, "PBS"),
            QueueType::Slurm => write!(f, "SLURM"),
        }
    }
}

/// 在求解器前/后执行的 shell 命令
///
/// 只有一条命令时序列化为标量字符串，多条时序列化为列表。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RocketCommands {
    Single(String),
    Multiple(Vec<String>),
}

impl Default for RocketCommands {
    fn default() -> Self {
        RocketCommands::Single(String::new())
    }
}

impl RocketCommands {
    /// 零条命令 => None，一条 => 标量，其余 => 列表
    pub fn from_lines(mut lines: Vec<String>) -> Option<Self> {
        match lines.len() {
            0 => None,
            1 => lines.pop().map(RocketCommands::Single),
            _ => Some(RocketCommands::Multiple(lines)),
        }
    }

    /// 逐行展开（标量中的换行也会被拆开），跳过空行
    pub fn lines(&self) -> Vec<&str> {
        let raw: Vec<&str> = match self {
            RocketCommands::Single(s) => s.lines().collect(),
            RocketCommands::Multiple(v) => v.iter().flat_map(|s| s.lines()).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// 是否不包含任何命令
    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// 用 shell 分隔符拼接成一条命令
    pub fn join(&self, sep: &str) -> String {
        self.lines().join(sep)
    }
}

/// 从队列脚本解析出的参数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueScriptParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walltime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmem: Option<String>,

    /// 其余 `-l key=value` 资源 (mem, naccesspolicy, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,

    /// `-V`：导出提交环境
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,

    /// 含可执行标志的整行命令
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vasp_cmd: Option<String>,

    pub pre_rocket: Option<RocketCommands>,

    pub post_rocket: Option<RocketCommands>,
}

impl QueueScriptParams {
    /// 记录一个 `-l` 资源键值对
    pub fn set_resource(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        match key {
            "walltime" => self.walltime = Some(value),
            "nodes" => self.nodes = Some(value),
            "ppn" => self.ppn = Some(value),
            "pmem" => self.pmem = Some(value),
            _ => {
                self.resources.insert(key.to_string(), value);
            }
        }
    }
}
