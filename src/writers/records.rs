//! # 配置文件记录
//!
//! atomate / FireWorks 各配置文件的固定结构。字段顺序即写出顺序。
//!
//! ## 依赖关系
//! - 被 `writers/mod.rs` 使用
//! - 使用 `models/`

use super::{QueueSource, WriterParams};
use crate::error::Result;
use crate::models::{QueueType, RocketCommands};

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

/// db.json
#[derive(Debug, Serialize)]
pub struct DbConfig {
    pub database: String,
    pub collection: String,
    pub host: String,
    pub port: u16,
    pub aliases: BTreeMap<String, String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            database: "dfttk_tests".to_string(),
            collection: "tasks".to_string(),
            host: "localhost".to_string(),
            port: 27017,
            aliases: BTreeMap::new(),
        }
    }
}

/// my_launchpad.yaml
#[derive(Debug, Serialize)]
pub struct LaunchpadConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub ssl_ca_file: String,
    pub strm_lvl: String,
    pub user_indices: String,
    pub wf_user_indices: String,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        LaunchpadConfig {
            host: "localhost".to_string(),
            port: 27017,
            name: "dfttk-fws".to_string(),
            ssl_ca_file: "null".to_string(),
            strm_lvl: "INFO".to_string(),
            user_indices: "[]".to_string(),
            wf_user_indices: "[]".to_string(),
        }
    }
}

/// FW_config.yaml
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FwConfig {
    pub config_file_dir: String,
    pub launchpad_loc: String,
    pub fworker_loc: String,
    pub queueadapter_loc: String,
    pub queue_jobname_maxlen: u32,
    pub add_user_packages: Vec<String>,
}

impl FwConfig {
    pub fn new(params: &WriterParams) -> Self {
        let dir = params.config_dir();
        FwConfig {
            config_file_dir: path_str(&dir),
            launchpad_loc: path_str(&dir.join("my_launchpad.yaml")),
            fworker_loc: path_str(&dir.join("my_fworker.yaml")),
            queueadapter_loc: path_str(&dir.join("my_qadapter.yaml")),
            queue_jobname_maxlen: 15,
            add_user_packages: vec![
                "atomate.vasp.firetasks".to_string(),
                "atomate.feff.firetasks".to_string(),
            ],
        }
    }
}

/// my_fworker.yaml 中的 env 段
#[derive(Debug, Serialize)]
pub struct FworkerEnv {
    pub db_file: String,
    pub vasp_cmd: String,
    pub scratch_dir: String,
    pub incar_update: BTreeMap<String, String>,
}

/// my_fworker.yaml
#[derive(Debug, Serialize)]
pub struct FworkerConfig {
    pub name: String,
    pub category: String,
    pub query: String,
    pub env: FworkerEnv,
}

impl FworkerConfig {
    pub fn new(params: &WriterParams) -> Self {
        FworkerConfig {
            name: params.machine.clone(),
            category: String::new(),
            query: "{}".to_string(),
            env: FworkerEnv {
                db_file: path_str(&params.config_dir().join("db.json")),
                vasp_cmd: params.vasp_cmd.clone(),
                scratch_dir: "null".to_string(),
                incar_update: BTreeMap::new(),
            },
        }
    }
}

fn insert<V: Into<Value>>(map: &mut Mapping, key: &str, value: V) {
    map.insert(Value::String(key.to_string()), value.into());
}

fn rocket_value(rocket: &RocketCommands) -> Result<Value> {
    Ok(serde_yaml::to_value(rocket)?)
}

/// my_qadapter.yaml
///
/// PBS 与 SLURM 的资源字段名不同；若来自机器配置，则机器的全部字段覆盖到记录上。
pub fn qadapter_record(params: &WriterParams) -> Result<Mapping> {
    let queue_type = match &params.source {
        QueueSource::Machine(profile) => profile.queue_type,
        QueueSource::Script => params.queue_type,
    };

    let mut map = Mapping::new();
    insert(&mut map, "_fw_name", "CommonAdapter");
    insert(&mut map, "_fw_q_type", queue_type.to_string());
    insert(
        &mut map,
        "rocket_launch",
        format!("rlaunch -c {} rapidfire", params.config_dir().display()),
    );
    match queue_type {
        QueueType::Pbs => {
            insert(&mut map, "nnodes", params.nodes);
            insert(&mut map, "ppnode", params.ppn);
            insert(&mut map, "pmem", params.pmem.as_str());
        }
        QueueType::Slurm => {
            insert(&mut map, "nodes", params.nodes);
            insert(&mut map, "ntasks", params.ppn);
        }
    }
    insert(&mut map, "walltime", params.walltime.as_str());
    insert(&mut map, "queue", params.queue.as_str());
    insert(&mut map, "account", params.account.as_str());
    insert(&mut map, "job_name", params.job_name.as_str());
    insert(&mut map, "pre_rocket", rocket_value(&params.pre_rocket)?);
    insert(&mut map, "post_rocket", rocket_value(&params.post_rocket)?);
    insert(
        &mut map,
        "logdir",
        path_str(&params.store_dir.join("logs")),
    );

    if let QueueSource::Machine(profile) = &params.source {
        let mut profile = profile.clone();
        if let Some(template) = profile.template_file.take() {
            let name = Path::new(&template)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or(template);
            profile.template_file = Some(path_str(&params.config_dir().join(name)));
        }
        if let Value::Mapping(overlay) = serde_yaml::to_value(&profile)? {
            for (k, v) in overlay {
                map.insert(k, v);
            }
        }
    }

    Ok(map)
}
