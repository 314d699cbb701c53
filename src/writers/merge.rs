//! # 用户配置文件合并
//!
//! 用户配置目录中找到的配置文件会覆盖生成的同名文件。
//!
//! 默认策略 `Overwrite`：目标文件内容完全取自用户文件。
//! `PreservePaths`：目标中某个字符串值指向已存在的路径、而用户文件中对应值
//! 指向不存在的路径时，保留目标的值。后者只在显式要求时使用。
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs` 使用
//! - 使用 `writers/mod.rs` 的 `FileFormat`

use super::FileFormat;
use crate::error::{DfttkConfigError, Result};
use crate::utils::fs as ufs;

use std::path::Path;

/// 合并策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    #[default]
    Overwrite,
    PreservePaths,
}

fn is_stale_over_valid(target: &str, base: &str) -> bool {
    Path::new(target).exists() && !Path::new(base).exists()
}

fn merge_json(target: &mut serde_json::Value, base: serde_json::Value) {
    match (target, base) {
        (serde_json::Value::Object(t), serde_json::Value::Object(b)) => {
            for (key, base_value) in b {
                let keep = matches!(
                    (t.get(&key), &base_value),
                    (Some(serde_json::Value::String(tv)), serde_json::Value::String(bv))
                        if is_stale_over_valid(tv, bv)
                );
                if !keep {
                    t.insert(key, base_value);
                }
            }
        }
        (target, base) => *target = base,
    }
}

fn merge_yaml(target: &mut serde_yaml::Value, base: serde_yaml::Value) {
    match (target, base) {
        (serde_yaml::Value::Mapping(t), serde_yaml::Value::Mapping(b)) => {
            for (key, base_value) in b {
                let keep = matches!(
                    (t.get(&key), &base_value),
                    (Some(serde_yaml::Value::String(tv)), serde_yaml::Value::String(bv))
                        if is_stale_over_valid(tv, bv)
                );
                if !keep {
                    t.insert(key, base_value);
                }
            }
        }
        (target, base) => *target = base,
    }
}

fn parse_error(format: FileFormat, path: &Path, reason: String) -> DfttkConfigError {
    DfttkConfigError::ParseError {
        format: format.to_string(),
        path: path.display().to_string(),
        reason,
    }
}

/// 用 `base` 更新 `target`
pub fn update_config_file(target: &Path, base: &Path, policy: MergePolicy) -> Result<()> {
    let format = FileFormat::from_path(base).ok_or_else(|| {
        DfttkConfigError::InvalidArgument(format!(
            "Unsupported config file type: {}",
            base.display()
        ))
    })?;

    if ufs::same_file(target, base) {
        return Ok(());
    }

    let base_text = ufs::read_file(base)?;
    let target_text = if policy == MergePolicy::PreservePaths && target.exists() {
        Some(ufs::read_file(target)?)
    } else {
        None
    };

    let merged = match format {
        FileFormat::Json => {
            let base_doc: serde_json::Value = serde_json::from_str(&base_text)
                .map_err(|e| parse_error(format, base, e.to_string()))?;
            match target_text {
                None => base_text,
                Some(text) => {
                    let mut doc: serde_json::Value = serde_json::from_str(&text)
                        .map_err(|e| parse_error(format, target, e.to_string()))?;
                    merge_json(&mut doc, base_doc);
                    serde_json::to_string_pretty(&doc)?
                }
            }
        }
        FileFormat::Yaml => {
            let base_doc: serde_yaml::Value = serde_yaml::from_str(&base_text)
                .map_err(|e| parse_error(format, base, e.to_string()))?;
            match target_text {
                None => base_text,
                Some(text) => {
                    let mut doc: serde_yaml::Value = serde_yaml::from_str(&text)
                        .map_err(|e| parse_error(format, target, e.to_string()))?;
                    merge_yaml(&mut doc, base_doc);
                    serde_yaml::to_string(&doc)?
                }
            }
        }
    };

    ufs::write_file(target, &merged)
}
