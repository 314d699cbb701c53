//! # pymatgen 配置
//!
//! 维护 `~/.pmgrc.yaml` 中的三个键：
//! - `PMG_DEFAULT_FUNCTIONAL`
//! - `PMG_MAPI_KEY`
//! - `PMG_VASP_PSP_DIR`
//!
//! 旧版 pymatgen 使用不带 `PMG_` 前缀的键名，同样视为已配置。
//! 缺少 `PMG_VASP_PSP_DIR` 时导入赝势。
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs`, `commands/check.rs` 使用
//! - 使用 `potcar/`, `utils/fs.rs`, `utils/output.rs`

use crate::error::{DfttkConfigError, Result};
use crate::potcar::PotcarImport;
use crate::utils::{fs as ufs, output};

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub const KEY_FUNCTIONAL: &str = "PMG_DEFAULT_FUNCTIONAL";
pub const KEY_MAPI: &str = "PMG_MAPI_KEY";
pub const KEY_PSP_DIR: &str = "PMG_VASP_PSP_DIR";

const PMG_KEYS: [&str; 3] = [KEY_FUNCTIONAL, KEY_MAPI, KEY_PSP_DIR];

/// pymatgen 配置文件路径
pub fn pmgrc_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".pmgrc.yaml"))
        .ok_or_else(|| DfttkConfigError::Other("Could not determine home directory".to_string()))
}

/// 读取 `.pmgrc.yaml`；不存在或为空时返回空映射
pub fn load_pmgrc(path: &Path) -> Result<Mapping> {
    if !path.exists() {
        return Ok(Mapping::new());
    }
    let content = ufs::read_file(path)?;
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(&content) {
        Ok(Value::Mapping(m)) => Ok(m),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(DfttkConfigError::ParseError {
            format: "YAML".to_string(),
            path: path.display().to_string(),
            reason: "top level is not a mapping".to_string(),
        }),
        Err(e) => Err(DfttkConfigError::ParseError {
            format: "YAML".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        Value::Mapping(m) => !m.is_empty(),
        _ => true,
    }
}

/// 键（或其旧名）的非空值
pub fn configured_value<'a>(settings: &'a Mapping, key: &str) -> Option<&'a Value> {
    let legacy = key.trim_start_matches("PMG_");
    [key, legacy]
        .into_iter()
        .filter_map(|k| settings.get(k))
        .find(|v| has_value(v))
}

/// 字符串形式的配置值
pub fn configured_str<'a>(settings: &'a Mapping, key: &str) -> Option<&'a str> {
    configured_value(settings, key).and_then(Value::as_str)
}

/// 填写缺失键时使用的值
#[derive(Debug, Clone)]
pub struct PmgDefaults {
    pub default_functional: String,
    pub mapi_key: Option<String>,
    pub psp_store: PathBuf,
}

/// 更新 `.pmgrc.yaml`，返回本次填写的键
pub fn update_pmgrc(path: &Path, defaults: &PmgDefaults) -> Result<Vec<&'static str>> {
    let mut settings = load_pmgrc(path)?;

    let missing: Vec<&'static str> = PMG_KEYS
        .into_iter()
        .filter(|k| configured_value(&settings, k).is_none())
        .collect();
    if missing.is_empty() {
        output::print_warning(&format!(
            "pymatgen is already configured in {}, nothing to do",
            path.display()
        ));
        return Ok(missing);
    }

    if let Some(backup) = ufs::backup_file(path)? {
        output::print_info(&format!("Backed up {} to {}", path.display(), backup.display()));
    }

    // 旧键名的值复制到新键名
    for key in PMG_KEYS {
        if missing.contains(&key) {
            continue;
        }
        if let Some(v) = configured_value(&settings, key).cloned() {
            settings.insert(Value::from(key), v);
        }
    }

    for key in &missing {
        let value = match *key {
            KEY_FUNCTIONAL => Value::from(defaults.default_functional.clone()),
            KEY_MAPI => defaults
                .mapi_key
                .clone()
                .map(Value::from)
                .unwrap_or(Value::Null),
            _ => Value::from(ufs::absolute(&defaults.psp_store).display().to_string()),
        };
        settings.insert(Value::from(*key), value);
    }

    ufs::write_file(path, &serde_yaml::to_string(&settings)?)?;
    output::print_written(&path.display().to_string());

    if configured_value(&settings, KEY_MAPI).is_none() {
        output::print_warning(
            "PMG_MAPI_KEY is empty, some functions will not work. Please add your own Materials Project API key with --mapi",
        );
    }
    Ok(missing)
}

/// 配置 pymatgen，必要时导入赝势
pub fn configure(defaults: &PmgDefaults, import: &PotcarImport) -> Result<()> {
    let path = pmgrc_path()?;
    let filled = update_pmgrc(&path, defaults)?;
    if filled.contains(&KEY_PSP_DIR) {
        import.run()?;
    }
    Ok(())
}
