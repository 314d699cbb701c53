//! # 文件系统工具
//!
//! 带路径信息的读写包装、`.dfttk.bak` 备份、目录复制与权限修复。
//!
//! ## 依赖关系
//! - 被 `utils/shell.rs`, `writers/`, `potcar/`, `commands/` 使用
//! - 使用 `walkdir` 遍历目录

use crate::error::{DfttkConfigError, Result};

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 备份文件后缀
pub const BACKUP_SUFFIX: &str = ".dfttk.bak";

/// 读取整个文件
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| DfttkConfigError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 写入整个文件（覆盖）
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| DfttkConfigError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 递归创建目录
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| DfttkConfigError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 相对路径以当前工作目录为基准转为绝对路径（不解析符号链接）
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// 两个路径是否指向同一个文件；都存在时按解析符号链接后的路径比较
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => absolute(a) == absolute(b),
    }
}

/// `~/.bashrc` -> `~/.bashrc.dfttk.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// 文件存在时复制到 `.dfttk.bak` 兄弟文件
pub fn backup_file(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let backup = backup_path(path);
    fs::copy(path, &backup).map_err(|e| DfttkConfigError::FileWriteError {
        path: backup.display().to_string(),
        source: e,
    })?;
    Ok(Some(backup))
}

/// 递归复制目录
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    // 集群上的赝势目录常含指向其他目录的符号链接，按实际内容复制
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| DfttkConfigError::FileReadError {
            path: src.display().to_string(),
            source: e.into(),
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| DfttkConfigError::Other(e.to_string()))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            create_dir(&target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| DfttkConfigError::FileWriteError {
                path: target.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// 去掉整棵目录树的只读属性（tar 解出的文件常为只读）
pub fn make_writable(root: &Path) -> Result<()> {
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        let mut perms = match fs::metadata(path) {
            Ok(m) => m.permissions(),
            Err(_) => continue,
        };
        if perms.readonly() {
            perms.set_readonly(false);
            fs::set_permissions(path, perms).map_err(|e| DfttkConfigError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// 删除目录树；失败时先修复权限再重试一次
pub fn remove_dir_forced(root: &Path) -> Result<()> {
    if fs::remove_dir_all(root).is_ok() {
        return Ok(());
    }
    make_writable(root)?;
    fs::remove_dir_all(root).map_err(|e| DfttkConfigError::FileWriteError {
        path: root.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_file() {
        let dir = TempDir::new().unwrap();
        let rc = dir.path().join(".bashrc");
        assert_eq!(backup_file(&rc).unwrap(), None);

        fs::write(&rc, "alias ll='ls -l'\n").unwrap();
        let bak = backup_file(&rc).unwrap().unwrap();
        assert_eq!(bak, dir.path().join(".bashrc.dfttk.bak"));
        assert_eq!(fs::read_to_string(bak).unwrap(), "alias ll='ls -l'\n");
    }

    #[test]
    fn test_copy_and_remove_tree() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("potpaw_PBE");
        fs::create_dir_all(src.join("Fe")).unwrap();
        fs::write(src.join("Fe").join("POTCAR"), "PAW_PBE Fe").unwrap();

        let dst = dir.path().join("POT_GGA_PAW_PBE");
        copy_dir_all(&src, &dst).unwrap();
        assert_eq!(
            fs::read_to_string(dst.join("Fe").join("POTCAR")).unwrap(),
            "PAW_PBE Fe"
        );

        let potcar = dst.join("Fe").join("POTCAR");
        let mut perms = fs::metadata(&potcar).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&potcar, perms).unwrap();

        remove_dir_forced(&dst).unwrap();
        assert!(!dst.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_follows_symlinked_dirs() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real_Fe");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("POTCAR"), "PAW_PBE Fe").unwrap();

        let src = dir.path().join("potpaw_PBE");
        fs::create_dir_all(&src).unwrap();
        std::os::unix::fs::symlink("../real_Fe", src.join("Fe")).unwrap();

        let dst = dir.path().join("POT_GGA_PAW_PBE");
        copy_dir_all(&src, &dst).unwrap();
        assert!(dst.join("Fe").is_dir());
        assert!(!fs::symlink_metadata(dst.join("Fe")).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(dst.join("Fe").join("POTCAR")).unwrap(),
            "PAW_PBE Fe"
        );
    }

    #[test]
    fn test_same_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("my_fworker.yaml");
        fs::write(&file, "name: custom\n").unwrap();
        assert!(same_file(&file, &dir.path().join(".").join("my_fworker.yaml")));
        assert!(!same_file(&file, &dir.path().join("other.yaml")));
    }

    #[test]
    fn test_absolute() {
        let p = absolute(Path::new("config"));
        assert!(p.is_absolute());
        assert!(p.ends_with("config"));
        assert_eq!(absolute(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
    }
}
