//! # Shell 启动文件补丁
//!
//! 将环境变量写入 `~/.bashrc`, `~/.zshrc` (export) 与 `~/.cshrc`, `~/.tcshrc` (setenv)。
//! 写入前备份为 `.dfttk.bak`；若同样的变量块已存在则不重复追加。
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs` 使用
//! - 使用 `utils/fs.rs`

use crate::error::{DfttkConfigError, Result};
use crate::utils::fs as ufs;

use std::collections::HashSet;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const BLOCK_BEGIN: &str = "#######The following vars are generated by dfttk###########";
const BLOCK_END: &str = "########Above vars are generated by dfttk################";

/// Shell 语法族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellSyntax {
    /// bash / zsh: `export K=V`
    Posix,
    /// csh / tcsh: `setenv K V`
    Csh,
}

impl ShellSyntax {
    fn assign(self, key: &str, value: &str) -> String {
        match self {
            ShellSyntax::Posix => format!("export {}={}", key, value),
            ShellSyntax::Csh => format!("setenv {} {}", key, value),
        }
    }
}

/// 环境变量写入接口
pub trait EnvFilePatcher {
    /// 写入变量，返回被修改的文件列表
    ///
    /// `force_override` 为 false 时，已在当前环境中存在的变量以 `$K:V` 形式追加。
    fn add_vars(&self, vars: &[(String, String)], force_override: bool) -> Result<Vec<PathBuf>>;
}

/// 针对用户 home 目录下四个 rc 文件的实现
#[derive(Debug, Clone)]
pub struct ShellRcPatcher {
    home: PathBuf,
}

impl ShellRcPatcher {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        ShellRcPatcher { home: home.into() }
    }

    /// 使用当前用户的 home 目录
    pub fn for_current_user() -> Result<Self> {
        dirs::home_dir()
            .map(Self::new)
            .ok_or_else(|| DfttkConfigError::Other("Could not determine home directory".to_string()))
    }

    fn rc_files(&self) -> [(PathBuf, ShellSyntax); 4] {
        [
            (self.home.join(".bashrc"), ShellSyntax::Posix),
            (self.home.join(".zshrc"), ShellSyntax::Posix),
            (self.home.join(".cshrc"), ShellSyntax::Csh),
            (self.home.join(".tcshrc"), ShellSyntax::Csh),
        ]
    }
}

/// 生成带首尾标记的变量块
pub fn render_block(vars: &[(String, String)], force_override: bool, syntax: ShellSyntax) -> String {
    let mut block = format!("\n{}\n", BLOCK_BEGIN);
    for (key, value) in vars {
        let key = key.strip_prefix('$').unwrap_or(key);
        let line = if !force_override && env::var_os(key).is_some() {
            syntax.assign(key, &format!("${}:{}", key, value))
        } else {
            syntax.assign(key, value)
        };
        block.push_str(&line);
        block.push('\n');
    }
    block.push_str(BLOCK_END);
    block.push('\n');
    block
}

/// 块中的每个非空行都已出现在文件中
fn block_present(existing: &str, block: &str) -> bool {
    let lines: HashSet<&str> = existing.lines().map(str::trim).collect();
    block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .all(|l| lines.contains(l))
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DfttkConfigError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
    file.write_all(text.as_bytes())
        .map_err(|e| DfttkConfigError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
}

impl EnvFilePatcher for ShellRcPatcher {
    fn add_vars(&self, vars: &[(String, String)], force_override: bool) -> Result<Vec<PathBuf>> {
        let mut patched = Vec::new();

        for (rc, syntax) in self.rc_files() {
            let block = render_block(vars, force_override, syntax);

            if rc.exists() {
                ufs::backup_file(&rc)?;
                let existing = ufs::read_file(&rc)?;
                if block_present(&existing, &block) {
                    continue;
                }
            }
            append(&rc, &block)?;
            patched.push(rc);
        }

        Ok(patched)
    }
}
