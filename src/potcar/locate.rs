//! # VASP 与赝势目录定位
//!
//! 先在 PATH 中查找 VASP；找不到时执行队列脚本中的模块加载命令，
//! 或依次尝试 `module load vasp`、`module load intel impi vasp`。
//! 集群上的赝势目录假定位于 VASP 可执行文件所在目录或其上一级。
//!
//! ## 依赖关系
//! - 被 `potcar/import.rs` 使用
//! - 使用 `parsers/queue_script.rs`, `utils/output.rs`

use crate::error::{DfttkConfigError, Result};
use crate::models::QueueType;
use crate::parsers::parse_queue_script;
use crate::utils::output;

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 自动探测时依次尝试的模块
const FALLBACK_MODULES: [&str; 2] = ["vasp", "intel impi vasp"];

/// 集群上常见的赝势目录名
pub const DEFAULT_PSP_DIR_NAMES: [&str; 5] = ["pp", "pps", "psp", "potential", "pseudopotential"];

/// 在 PATH 中查找可执行文件
pub fn which(command: &str) -> Option<PathBuf> {
    if command.contains('/') {
        let p = PathBuf::from(command);
        return p.is_file().then_some(p);
    }
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}

/// 通过 `sh -c` 执行命令并返回去掉首尾空白的 stdout
pub fn run_shell(script: &str) -> Result<String> {
    let out = Command::new("sh")
        .arg("-c")
        .arg(script)
        .stderr(Stdio::piped())
        .output()
        .map_err(|_| DfttkConfigError::CommandNotFound {
            command: "sh".to_string(),
        })?;

    if !out.status.success() {
        return Err(DfttkConfigError::CommandFailed {
            command: script.to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// `which` 输出可能夹杂模块系统的提示，取最后一行
fn last_line(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(PathBuf::from)
}

fn locate_with_script(vasp_cmd: &str, template: &Path, queue_type: QueueType) -> Result<PathBuf> {
    let params = parse_queue_script(template, queue_type, vasp_cmd)?;
    let load = params
        .pre_rocket
        .filter(|r| !r.is_empty())
        .ok_or_else(|| DfttkConfigError::VaspNotFound {
            command: vasp_cmd.to_string(),
            reason: format!(
                "there is no module-load part in the queue script ({}); provide a correct queue script or load vasp manually",
                template.display()
            ),
        })?;

    let script = format!("{}; which {}", load.join("; "), vasp_cmd);
    let stdout = run_shell(&script).map_err(|_| DfttkConfigError::VaspNotFound {
        command: vasp_cmd.to_string(),
        reason: format!("the load part in queue script ({}) is incorrect", template.display()),
    })?;
    last_line(&stdout).ok_or_else(|| DfttkConfigError::VaspNotFound {
        command: vasp_cmd.to_string(),
        reason: format!("'which {}' printed nothing after loading modules", vasp_cmd),
    })
}

fn locate_with_modules(vasp_cmd: &str) -> Result<PathBuf> {
    for module in FALLBACK_MODULES {
        let script = format!("module load {}; which {}", module, vasp_cmd);
        if let Ok(stdout) = run_shell(&script) {
            if let Some(path) = last_line(&stdout) {
                return Ok(path);
            }
        }
    }
    Err(DfttkConfigError::VaspNotFound {
        command: vasp_cmd.to_string(),
        reason: "cannot load vasp automatically; provide the queue script or load vasp manually"
            .to_string(),
    })
}

/// 返回 VASP 可执行文件所在目录
pub fn find_vasp_dir(vasp_cmd: &str, template: &Path, queue_type: QueueType) -> Result<PathBuf> {
    let exe = match which(vasp_cmd) {
        Some(p) => p,
        None => {
            output::print_warning(&format!(
                "Can't find vasp (by {}) in the environment, trying to load it according to the queue script",
                vasp_cmd
            ));
            if template.exists() {
                locate_with_script(vasp_cmd, template, queue_type)?
            } else {
                output::print_warning("Queue script does not exist, trying to load vasp automatically");
                locate_with_modules(vasp_cmd)?
            }
        }
    };

    let dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    output::print_success(&format!("vasp was found, located at {}", dir.display()));
    Ok(dir)
}

/// 在 VASP 目录及其上一级中查找赝势目录
pub fn find_psp_dirs_near(vasp_dir: &Path, names: &[String]) -> Vec<PathBuf> {
    let mut search = vec![vasp_dir.to_path_buf()];
    if let Some(parent) = vasp_dir.parent() {
        search.push(parent.to_path_buf());
    }

    let mut found = Vec::new();
    for base in &search {
        for name in names {
            let candidate = base.join(name);
            if candidate.exists() {
                output::print_success(&format!(
                    "The pseudopotential folder was found, located at {}",
                    candidate.display()
                ));
                found.push(candidate);
            }
        }
    }

    if found.is_empty() {
        output::print_warning(&format!(
            "No folder (named as {}) is found in {}. Specify the folder name by --psp-dir or provide your own pseudopotential without --aci",
            names.join(", "),
            search
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    found
}

/// 定位 VASP 后查找集群上的赝势目录
pub fn find_psp_dirs_in_cluster(
    vasp_cmd: &str,
    names: &[String],
    template: &Path,
    queue_type: QueueType,
) -> Result<Vec<PathBuf>> {
    let vasp_dir = find_vasp_dir(vasp_cmd, template, queue_type)?;
    Ok(find_psp_dirs_near(&vasp_dir, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_which_finds_shell() {
        assert!(which("sh").is_some());
        assert!(which("definitely-not-a-real-binary-xyz").is_none());
    }

    #[test]
    fn test_which_with_path() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("vasp_std");
        fs::write(&exe, "").unwrap();
        assert_eq!(which(&exe.display().to_string()), Some(exe.clone()));
    }

    #[test]
    fn test_run_shell() {
        assert_eq!(run_shell("echo /opt/vasp/bin/vasp_std").unwrap(), "/opt/vasp/bin/vasp_std");
        assert!(matches!(
            run_shell("exit 3"),
            Err(DfttkConfigError::CommandFailed { .. })
        ));
    }

    #[test]
    fn test_last_line() {
        assert_eq!(
            last_line("Loading vasp\n/opt/vasp/bin/vasp_std\n\n"),
            Some(PathBuf::from("/opt/vasp/bin/vasp_std"))
        );
        assert_eq!(last_line("  \n"), None);
    }

    #[test]
    fn test_locate_with_script_runs_pre_rocket() {
        if which("which").is_none() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let script = dir.path().join("vaspjob.pbs");
        // pre_rocket 把假的 vasp 放进 PATH，which 输出其路径
        fs::write(
            &script,
            format!(
                "#PBS -q open\nexport PATH={}:$PATH\nmpirun fake_vasp_xyz\n",
                bin.display()
            ),
        )
        .unwrap();
        let exe = bin.join("fake_vasp_xyz");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let dir_found = find_vasp_dir("fake_vasp_xyz", &script, QueueType::Pbs).unwrap();
        assert_eq!(dir_found, bin);
    }

    #[test]
    fn test_script_without_load_part_is_fatal() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("vaspjob.pbs");
        fs::write(&script, "#PBS -q open\nmpirun fake_vasp_xyz\n").unwrap();
        let err = find_vasp_dir("fake_vasp_xyz", &script, QueueType::Pbs).unwrap_err();
        assert!(matches!(err, DfttkConfigError::VaspNotFound { .. }));
    }

    #[test]
    fn test_find_psp_dirs_near_checks_parent() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("vasp").join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(dir.path().join("vasp").join("pp")).unwrap();
        fs::create_dir_all(bin.join("psp")).unwrap();

        let names: Vec<String> = DEFAULT_PSP_DIR_NAMES.iter().map(|s| s.to_string()).collect();
        let found = find_psp_dirs_near(&bin, &names);
        assert_eq!(
            found,
            vec![bin.join("psp"), dir.path().join("vasp").join("pp")]
        );
    }
}
