//! # 配置文件发现
//!
//! 在用户配置目录（含子目录）中查找 atomate/FireWorks 配置文件和队列脚本。
//! 同名文件出现多次时取路径最短（层级最浅）的一个。
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs` 使用
//! - 使用 `walkdir` 遍历目录

use crate::error::{DfttkConfigError, Result};
use crate::utils::{fs as ufs, output};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 必需的配置文件
pub const REQUIRED_FILES: [&str; 2] = ["db.json", "my_launchpad.yaml"];

/// 可选的配置文件（队列脚本名由用户指定，另行处理）
pub const OPTIONAL_FILES: [&str; 3] = ["FW_config.yaml", "my_fworker.yaml", "my_qadapter.yaml"];

/// 递归查找所有文件名为 `file_name` 的文件
pub fn find_files_named(folder: &Path, file_name: &str) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == file_name)
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// 路径字符串最短者；并列时取第一个
pub fn shortest_path(paths: &[PathBuf]) -> Option<&PathBuf> {
    paths
        .iter()
        .min_by_key(|p| p.as_os_str().len())
}

/// 发现结果：文件名 -> 绝对路径（未找到的可选文件为 None）
#[derive(Debug, Default)]
pub struct ConfigFiles {
    files: BTreeMap<String, Option<PathBuf>>,
}

impl ConfigFiles {
    pub fn get(&self, file_name: &str) -> Option<&Path> {
        self.files.get(file_name).and_then(|p| p.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Path>)> {
        self.files
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// 查找配置目录中的全部配置文件
///
/// 必需文件缺失时报错；可选文件缺失时警告并使用缺省设置。
pub fn find_config_files(config_folder: &Path, queue_script: &str) -> Result<ConfigFiles> {
    let mut result = ConfigFiles::default();

    let optional = OPTIONAL_FILES.iter().copied().chain(std::iter::once(queue_script));
    let all = REQUIRED_FILES.iter().copied().map(|f| (f, true)).chain(optional.map(|f| (f, false)));

    for (file_name, required) in all {
        let found = find_files_named(config_folder, file_name);
        match shortest_path(&found) {
            Some(path) => {
                result
                    .files
                    .insert(file_name.to_string(), Some(ufs::absolute(path)));
            }
            None if required => {
                return Err(DfttkConfigError::FileNotFound {
                    file: file_name.to_string(),
                    folder: config_folder.display().to_string(),
                });
            }
            None => {
                output::print_warning(&format!(
                    "{} file does not exist, the default setting will be used",
                    file_name
                ));
                result.files.insert(file_name.to_string(), None);
            }
        }
    }

    Ok(result)
}
