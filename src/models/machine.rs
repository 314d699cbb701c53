//! # 集群机器注册表
//!
//! 每个集群的默认队列、账户、模块加载命令与 VASP 启动命令。
//! 内置表可被用户提供的 `machines.yaml` 整体替换。
//!
//! ## 依赖关系
//! - 被 `writers/`, `commands/setup.rs`, `commands/machines.rs` 使用
//! - 使用 `models/queue_params.rs`, `utils/output.rs`

use crate::error::{DfttkConfigError, Result};
use crate::models::queue_params::{QueueType, RocketCommands};
use crate::utils::output;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 查找失败时使用的机器名
pub const FALLBACK_MACHINE: &str = "aci-roar";

/// 单个集群的默认设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,

    #[serde(rename = "_fw_q_type")]
    pub queue_type: QueueType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// `pre_rocket: null` 与缺省等价
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "RocketCommands::is_empty"
    )]
    pub pre_rocket: RocketCommands,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "RocketCommands::is_empty"
    )]
    pub post_rocket: RocketCommands,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<String>,

    /// FireWorks 自定义模板文件
    #[serde(
        rename = "_fw_template_file",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_file: Option<String>,

    pub vasp_cmd: String,

    /// 用户文件中的其他键，原样叠加到 qadapter
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl MachineProfile {
    fn new(queue_type: QueueType, queue: &str, account: &str, pre_rocket: &str, vasp_cmd: String) -> Self {
        MachineProfile {
            constraint: None,
            queue: Some(queue.to_string()),
            queue_type,
            account: Some(account.to_string()),
            pre_rocket: RocketCommands::Single(pre_rocket.to_string()),
            post_rocket: RocketCommands::default(),
            mem: None,
            template_file: None,
            vasp_cmd,
            extra: BTreeMap::new(),
        }
    }

    /// 固定的回退配置 (PSU ACI Roar, PBS)
    pub fn fallback() -> Self {
        let mut m = MachineProfile::new(QueueType::Pbs, "open", "open", "#", "mpirun vasp_std".to_string());
        m.template_file = Some(
            Path::new(".")
                .join("config")
                .join("PBS_template_custom.txt")
                .display()
                .to_string(),
        );
        m
    }
}

/// 集群名 -> 机器配置
#[derive(Debug, Clone)]
pub struct MachineRegistry {
    machines: BTreeMap<String, MachineProfile>,
    builtin: bool,
}

impl MachineRegistry {
    /// 内置机器表；SLURM 启动命令按 `nodes * ppn` 生成进程数
    pub fn builtin(nodes: u32, ppn: u32) -> Self {
        let np = nodes.saturating_mul(ppn);
        let mut machines = BTreeMap::new();

        let mut cori_hsw = MachineProfile::new(
            QueueType::Slurm,
            "regular",
            "m891",
            "module load vasp/5.4.4-hsw",
            format!("srun -n {} --cpu_bind=cores vasp_std", np),
        );
        cori_hsw.constraint = Some("haswell".to_string());
        cori_hsw.mem = Some("64gb".to_string());
        machines.insert("cori-hsw".to_string(), cori_hsw);

        let mut cori_knl = MachineProfile::new(
            QueueType::Slurm,
            "regular",
            "m891",
            "module load vasp/5.4.4-knl",
            format!("srun -n {} --cpu_bind=cores vasp_std", np),
        );
        cori_knl.constraint = Some("knl,quad,cache".to_string());
        cori_knl.mem = Some("64gb".to_string());
        machines.insert("cori-knl".to_string(), cori_knl);

        machines.insert(
            "bridges2".to_string(),
            MachineProfile::new(
                QueueType::Slurm,
                "RM",
                "dmr170016p",
                "module load intel cuda intelmpi/20.4-intel20.4",
                format!("mpirun -np {} /opt/packages/VASP/VASP5/INTEL/vasp_std", np),
            ),
        );

        machines.insert(
            "stampede2".to_string(),
            MachineProfile::new(
                QueueType::Slurm,
                "normal",
                "TG-DMR140063",
                "module load vasp/5.4.4",
                format!("ibrun -np {} vasp_std", np),
            ),
        );

        // aci-b 已停用，但作为 PBS 模板保留
        for (name, vasp_module) in [("aci-vasp5", "vasp"), ("aci-vasp6", "vasp/vasp-6.2.0")] {
            let pre_rocket = [
                "module load intel/19.1.2".to_string(),
                "module load impi/2019.8".to_string(),
                "module use /gpfs/group/RISE/sw7/modules".to_string(),
                format!("module load {}", vasp_module),
                "export UCX_TLS=all".to_string(),
            ]
            .join("\n");
            machines.insert(
                name.to_string(),
                MachineProfile::new(QueueType::Pbs, "open", "open", &pre_rocket, "mpirun vasp_std".to_string()),
            );
        }

        machines.insert(FALLBACK_MACHINE.to_string(), MachineProfile::fallback());

        MachineRegistry {
            machines,
            builtin: true,
        }
    }

    /// 从用户 YAML 文件加载（整体替换内置表）
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DfttkConfigError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let machines: BTreeMap<String, MachineProfile> =
            serde_yaml::from_str(&content).map_err(|e| DfttkConfigError::ParseError {
                format: "machines YAML".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(MachineRegistry {
            machines,
            builtin: false,
        })
    }

    /// 有用户文件时加载它，否则使用内置表
    pub fn load(user_machines: Option<&Path>, nodes: u32, ppn: u32) -> Result<Self> {
        match user_machines {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin(nodes, ppn)),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// 精确匹配查找
    pub fn get(&self, name: &str) -> Option<&MachineProfile> {
        self.machines.get(name)
    }

    /// 查找机器；未命中时打印提示并返回回退配置，从不报错
    pub fn resolve(&self, name: &str) -> MachineProfile {
        if let Some(m) = self.get(name) {
            return m.clone();
        }
        output::print_warning(&format!(
            "Machine '{}' is not in the list [{}], default to {}",
            name,
            self.names().join(", "),
            FALLBACK_MACHINE
        ));
        self.get(FALLBACK_MACHINE)
            .cloned()
            .unwrap_or_else(MachineProfile::fallback)
    }

    pub fn names(&self) -> Vec<&str> {
        self.machines.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MachineProfile)> {
        self.machines.iter()
    }

    /// 写出为 YAML，便于用户修改后通过 `--machines` 传回
    pub fn write_yaml(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(&self.machines)?;
        fs::write(path, content).map_err(|e| DfttkConfigError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_embeds_process_count() {
        let registry = MachineRegistry::builtin(2, 32);
        let stampede = registry.get("stampede2").unwrap();
        assert_eq!(stampede.vasp_cmd, "ibrun -np 64 vasp_std");
        assert_eq!(stampede.queue_type, QueueType::Slurm);
        let hsw = registry.get("cori-hsw").unwrap();
        assert_eq!(hsw.vasp_cmd, "srun -n 64 --cpu_bind=cores vasp_std");
        assert_eq!(hsw.constraint.as_deref(), Some("haswell"));
    }

    #[test]
    fn test_unknown_machine_falls_back() {
        let registry = MachineRegistry::builtin(1, 16);
        let m = registry.resolve("no-such-cluster");
        assert_eq!(m, MachineProfile::fallback());
        assert_eq!(m.queue_type, QueueType::Pbs);
        assert_eq!(m.queue.as_deref(), Some("open"));
    }

    #[test]
    fn test_exact_lookup_is_case_sensitive() {
        let registry = MachineRegistry::builtin(1, 16);
        assert!(registry.get("bridges2").is_some());
        assert!(registry.get("Bridges2").is_none());
    }

    #[test]
    fn test_aci_pre_rocket_is_multiline() {
        let registry = MachineRegistry::builtin(1, 16);
        let m = registry.get("aci-vasp6").unwrap();
        let lines = m.pre_rocket.lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "module load vasp/vasp-6.2.0");
    }

    #[test]
    fn test_user_file_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machines.yaml");
        fs::write(
            &path,
            r#"mycluster:
  queue: batch
  _fw_q_type: SLURM
  account: abc123
  pre_rocket:
    - module load vasp
    - export OMP_NUM_THREADS=1
  vasp_cmd: srun vasp_std
  qos: high
"#,
        )
        .unwrap();

        let registry = MachineRegistry::load(Some(&path), 1, 16).unwrap();
        assert!(!registry.is_builtin());
        assert_eq!(registry.names(), vec!["mycluster"]);

        let m = registry.get("mycluster").unwrap();
        assert_eq!(m.queue_type, QueueType::Slurm);
        assert_eq!(m.pre_rocket.lines().len(), 2);
        assert_eq!(m.post_rocket, RocketCommands::default());
        assert_eq!(
            m.extra.get("qos"),
            Some(&serde_yaml::Value::String("high".to_string()))
        );

        // 用户表中没有 aci-roar 时使用内置回退
        assert_eq!(registry.resolve("cori-knl"), MachineProfile::fallback());
    }

    #[test]
    fn test_builtin_process_count_saturates() {
        let registry = MachineRegistry::builtin(u32::MAX, 2);
        let stampede = registry.get("stampede2").unwrap();
        assert_eq!(stampede.vasp_cmd, format!("ibrun -np {} vasp_std", u32::MAX));
    }

    #[test]
    fn test_user_machine_with_minimal_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machines.yaml");
        fs::write(
            &path,
            r#"mycluster:
  queue: batch
  _fw_q_type: PBS
  vasp_cmd: mpirun vasp_std
"#,
        )
        .unwrap();

        let registry = MachineRegistry::from_file(&path).unwrap();
        let m = registry.get("mycluster").unwrap();
        assert_eq!(m.queue.as_deref(), Some("batch"));
        assert_eq!(m.account, None);
        assert!(m.pre_rocket.is_empty());

        let overlay = serde_yaml::to_value(m).unwrap();
        assert!(overlay.get("account").is_none());
        assert!(overlay.get("pre_rocket").is_none());
    }

    #[test]
    fn test_user_machine_with_null_rockets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machines.yaml");
        fs::write(
            &path,
            r#"mycluster:
  queue: batch
  account: abc
  _fw_q_type: SLURM
  pre_rocket: null
  post_rocket: ~
  vasp_cmd: srun vasp_std
"#,
        )
        .unwrap();

        let registry = MachineRegistry::from_file(&path).unwrap();
        let m = registry.get("mycluster").unwrap();
        assert_eq!(m.pre_rocket, RocketCommands::default());
        assert_eq!(m.post_rocket, RocketCommands::default());
        assert!(m.extra.is_empty());
    }

    #[test]
    fn test_write_yaml_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machines.yaml");
        let registry = MachineRegistry::builtin(1, 24);
        registry.write_yaml(&path).unwrap();

        let reloaded = MachineRegistry::from_file(&path).unwrap();
        assert_eq!(reloaded.names(), registry.names());
        assert_eq!(reloaded.get("aci-vasp5"), registry.get("aci-vasp5"));
    }
}
