//! # 赝势导入
//!
//! 将集群或用户提供的赝势（目录或 .tar/.tar.gz/.tgz 压缩包）按规范名称整理到临时目录，
//! 再调用 `pmg config -p <临时目录> <目标目录>` 交给 pymatgen 处理。
//!
//! ## 依赖关系
//! - 被 `commands/pymatgen.rs` 使用
//! - 使用 `parsers/psp_name.rs`, `potcar/locate.rs`, `utils/`

use super::locate::{self, DEFAULT_PSP_DIR_NAMES};
use crate::error::{DfttkConfigError, Result};
use crate::models::{PspFunctional, QueueType};
use crate::parsers::parse_psp_name;
use crate::utils::{fs as ufs, output, progress};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 已知的非标准命名（ACI 集群上的拼写错误）
const NAME_ALIASES: [(&str, PspFunctional); 1] = [("USPP_GAA", PspFunctional::GgaUsPw91)];

/// 条目名 -> 规范泛函族；别名优先，无法识别时返回 None
pub fn canonical_name(entry_name: &str) -> Option<PspFunctional> {
    NAME_ALIASES
        .iter()
        .find(|(alias, _)| *alias == entry_name)
        .map(|(_, f)| *f)
        .or_else(|| parse_psp_name(entry_name))
}

/// 压缩包类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Archive {
    TarGz,
    Tar,
}

impl Archive {
    fn detect(name: &str) -> Option<Self> {
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Archive::TarGz)
        } else if name.ends_with(".tar") {
            Some(Archive::Tar)
        } else {
            None
        }
    }

    fn tar_flags(self) -> &'static str {
        match self {
            Archive::TarGz => "-zxvf",
            Archive::Tar => "-xvf",
        }
    }
}

/// 运行外部命令直到结束，失败时带上 stderr
fn run_command(program: &str, args: &[&str], message: &str) -> Result<()> {
    let spinner = progress::create_spinner(message);
    let out = Command::new(program).args(args).output();
    spinner.finish_and_clear();

    let out = out.map_err(|_| DfttkConfigError::CommandNotFound {
        command: program.to_string(),
    })?;
    if !out.status.success() {
        return Err(DfttkConfigError::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        });
    }
    Ok(())
}

fn extract(archive: &Path, kind: Archive, dest: &Path) -> Result<()> {
    let archive_str = archive.display().to_string();
    let dest_str = dest.display().to_string();
    run_command(
        "tar",
        &[kind.tar_flags(), &archive_str, "-C", &dest_str],
        &format!("Extracting {}", archive_str),
    )
}

/// 将 `sources` 中可识别的赝势整理到 `staging`，返回是否至少导入了一个
pub fn stage_potcars(sources: &[PathBuf], staging: &Path) -> Result<bool> {
    let mut copied = false;

    for source in sources {
        if !source.is_dir() {
            continue;
        }
        let mut entries: Vec<_> = fs::read_dir(source)
            .map_err(|e| DfttkConfigError::FileReadError {
                path: source.display().to_string(),
                source: e,
            })?
            .filter_map(|e| e.ok())
            .collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(functional) = canonical_name(&name) else {
                continue;
            };
            let old = entry.path();
            let new = staging.join(functional.dir_name());

            if old.is_dir() {
                if new.exists() {
                    output::print_warning(&format!(
                        "Potential ({}) exists, and {} will overwrite it",
                        new.display(),
                        old.display()
                    ));
                    ufs::remove_dir_forced(&new)?;
                }
                ufs::copy_dir_all(&old, &new)?;
                copied = true;
            } else if let Some(kind) = Archive::detect(&name) {
                ufs::create_dir(&new)?;
                extract(&old, kind, &new)?;
                copied = true;
            } else {
                output::print_skip(&format!(
                    "{} is not supported, the pseudopotential should be a folder or a .tar.gz/.tgz/.tar archive",
                    old.display()
                ));
            }
        }
    }

    if !copied {
        output::print_warning(&format!(
            "No supported pseudopotential was found in: {}",
            sources
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    Ok(copied)
}

/// 赝势导入选项
#[derive(Debug, Clone)]
pub struct PotcarImport {
    /// 用户提供的赝势目录；为空时使用常见目录名
    pub psp_dirs: Vec<PathBuf>,
    /// pymatgen 赝势目录 (PMG_VASP_PSP_DIR)
    pub store: PathBuf,
    /// 同时在集群 VASP 安装目录附近查找
    pub search_cluster: bool,
    pub vasp_cmd: String,
    pub queue_script: PathBuf,
    pub queue_type: QueueType,
    /// 临时整理目录
    pub staging: PathBuf,
}

impl PotcarImport {
    fn source_dirs(&self) -> Vec<PathBuf> {
        if self.psp_dirs.is_empty() {
            DEFAULT_PSP_DIR_NAMES.iter().map(PathBuf::from).collect()
        } else {
            self.psp_dirs.clone()
        }
    }

    fn cluster_dir_names(&self) -> Vec<String> {
        self.source_dirs()
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect()
    }

    /// 用户通过 `--psp-dir` 明确给出的目录必须存在
    fn check_user_dirs(&self) -> Result<()> {
        match self.psp_dirs.iter().find(|p| !p.is_dir()) {
            Some(missing) => Err(DfttkConfigError::DirectoryNotFound {
                path: missing.display().to_string(),
            }),
            None => Ok(()),
        }
    }

    fn stage_all(&self) -> Result<()> {
        let mut from_cluster = false;
        if self.search_cluster {
            let cluster_dirs = locate::find_psp_dirs_in_cluster(
                &self.vasp_cmd,
                &self.cluster_dir_names(),
                &self.queue_script,
                self.queue_type,
            )?;
            from_cluster = stage_potcars(&cluster_dirs, &self.staging)?;
        }
        let from_user = stage_potcars(&self.source_dirs(), &self.staging)?;

        if !(from_cluster || from_user) {
            return Err(DfttkConfigError::NoPseudopotential);
        }
        Ok(())
    }

    /// 整理全部赝势到临时目录（不调用 pmg）；失败时删除临时目录
    pub fn stage(&self) -> Result<()> {
        self.check_user_dirs()?;
        ufs::create_dir(&self.staging)?;

        let result = self.stage_all();
        if result.is_err() {
            if let Err(e) = ufs::remove_dir_forced(&self.staging) {
                output::print_warning(&format!("Failed to clean up: {}", e));
            }
        }
        result
    }

    /// 整理、调用 `pmg config -p` 并清理临时目录
    pub fn run(&self) -> Result<()> {
        if locate::which("pmg").is_none() {
            return Err(DfttkConfigError::CommandNotFound {
                command: "pmg".to_string(),
            });
        }
        self.stage()?;

        let staging = self.staging.display().to_string();
        let store = self.store.display().to_string();
        let result = run_command(
            "pmg",
            &["config", "-p", &staging, &store],
            &format!("Running pmg config -p {} {}", staging, store),
        );
        ufs::remove_dir_forced(&self.staging)?;
        result?;

        output::print_success(&format!("Pseudopotentials stored in {}", store));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_name_alias() {
        assert_eq!(canonical_name("USPP_GAA"), Some(PspFunctional::GgaUsPw91));
        assert_eq!(canonical_name("potpaw_PBE.54"), Some(PspFunctional::PbePaw54));
        assert_eq!(canonical_name("notes.txt"), None);
    }

    #[test]
    fn test_archive_detect() {
        assert_eq!(Archive::detect("potpaw_PBE.54.tar.gz"), Some(Archive::TarGz));
        assert_eq!(Archive::detect("potpaw_LDA.tgz"), Some(Archive::TarGz));
        assert_eq!(Archive::detect("potpaw_GGA.tar"), Some(Archive::Tar));
        assert_eq!(Archive::detect("potpaw_GGA.zip"), None);
    }

    #[test]
    fn test_stage_directories() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("psp");
        fs::create_dir_all(src.join("potpaw_PBE.54").join("Fe")).unwrap();
        fs::write(src.join("potpaw_PBE.54").join("Fe").join("POTCAR"), "Fe").unwrap();
        fs::create_dir_all(src.join("USPP_GAA").join("Si")).unwrap();
        fs::create_dir_all(src.join("README")).unwrap();
        fs::write(src.join("potpaw_LDA.zip"), "zip").unwrap();

        let staging = dir.path().join("psp_uncompress");
        fs::create_dir_all(&staging).unwrap();
        assert!(stage_potcars(&[src, dir.path().join("missing")], &staging).unwrap());

        assert!(staging.join("POT_GGA_PAW_PBE_54").join("Fe").join("POTCAR").is_file());
        assert!(staging.join("POT_GGA_US_PW91").join("Si").is_dir());
        assert!(!staging.join("README").exists());
        assert!(!staging.join("POT_LDA_PAW").exists());
    }

    #[test]
    fn test_stage_later_source_overwrites() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(a.join("potpaw_LDA").join("Al")).unwrap();
        fs::create_dir_all(b.join("POT_LDA_PAW").join("Cu")).unwrap();

        let staging = dir.path().join("stage");
        fs::create_dir_all(&staging).unwrap();
        assert!(stage_potcars(&[a, b], &staging).unwrap());
        assert!(staging.join("POT_LDA_PAW").join("Cu").is_dir());
        assert!(!staging.join("POT_LDA_PAW").join("Al").exists());
    }

    #[test]
    fn test_stage_nothing_found() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        let import = PotcarImport {
            psp_dirs: vec![dir.path().join("empty")],
            store: dir.path().join("psp_pymatgen"),
            search_cluster: false,
            vasp_cmd: "vasp_std".to_string(),
            queue_script: dir.path().join("vaspjob.pbs"),
            queue_type: QueueType::Pbs,
            staging: dir.path().join("psp_uncompress"),
        };
        let err = import.stage().unwrap_err();
        assert!(matches!(err, DfttkConfigError::NoPseudopotential));
        assert!(!dir.path().join("psp_uncompress").exists());
    }

    #[test]
    fn test_missing_user_dir_is_reported() {
        let dir = TempDir::new().unwrap();
        let import = PotcarImport {
            psp_dirs: vec![dir.path().join("no_such_psp")],
            store: dir.path().join("psp_pymatgen"),
            search_cluster: false,
            vasp_cmd: "vasp_std".to_string(),
            queue_script: dir.path().join("vaspjob.pbs"),
            queue_type: QueueType::Pbs,
            staging: dir.path().join("psp_uncompress"),
        };
        let err = import.stage().unwrap_err();
        assert!(matches!(err, DfttkConfigError::DirectoryNotFound { .. }));
        assert!(!dir.path().join("psp_uncompress").exists());
    }

    #[test]
    fn test_staging_removed_when_vasp_is_missing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("psp");
        fs::create_dir_all(src.join("potpaw_PBE").join("Fe")).unwrap();
        let import = PotcarImport {
            psp_dirs: vec![src],
            store: dir.path().join("psp_pymatgen"),
            search_cluster: true,
            vasp_cmd: "definitely_no_vasp_xyz".to_string(),
            queue_script: dir.path().join("vaspjob.pbs"),
            queue_type: QueueType::Pbs,
            staging: dir.path().join("psp_uncompress"),
        };
        let err = import.stage().unwrap_err();
        assert!(matches!(err, DfttkConfigError::VaspNotFound { .. }));
        assert!(!dir.path().join("psp_uncompress").exists());
    }

    #[test]
    fn test_stage_extracts_tarball() {
        if locate::which("tar").is_none() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("Fe")).unwrap();
        fs::write(content.join("Fe").join("POTCAR"), "Fe").unwrap();

        let src = dir.path().join("pp");
        fs::create_dir_all(&src).unwrap();
        let archive = src.join("potpaw_PBE.tar.gz");
        let status = Command::new("tar")
            .arg("-czf")
            .arg(&archive)
            .arg("-C")
            .arg(&content)
            .arg("Fe")
            .status()
            .unwrap();
        assert!(status.success());

        let staging = dir.path().join("stage");
        fs::create_dir_all(&staging).unwrap();
        assert!(stage_potcars(&[src], &staging).unwrap());
        assert!(staging.join("POT_GGA_PAW_PBE").join("Fe").join("POTCAR").is_file());
    }
}
