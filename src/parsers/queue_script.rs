//! # 队列提交脚本解析器
//!
//! 解析 PBS 作业脚本，提取资源指令、VASP 运行命令以及其前后的 shell 命令
//! (pre_rocket / post_rocket)。目前只支持 PBS。
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs`, `commands/parse.rs`, `potcar/locate.rs` 使用
//! - 使用 `models/queue_params.rs`

use crate::error::{DfttkConfigError, Result};
use crate::models::{QueueScriptParams, QueueType, RocketCommands};

use std::fs;
use std::path::Path;

const PBS_DIRECTIVE: &str = "#PBS";

/// 单值 PBS 标志 -> 字段
fn set_flag(params: &mut QueueScriptParams, flag: &str, value: String) -> bool {
    let slot = match flag {
        "-q" => &mut params.queue,
        "-A" => &mut params.account,
        "-N" => &mut params.job_name,
        "-V" => &mut params.env,
        "-G" => &mut params.group_name,
        _ => return false,
    };
    *slot = Some(value);
    true
}

/// 按队列类型解析脚本
pub fn parse_queue_script(
    path: &Path,
    queue_type: QueueType,
    vasp_cmd_flag: &str,
) -> Result<QueueScriptParams> {
    match queue_type {
        QueueType::Pbs => parse_pbs_script(path, vasp_cmd_flag),
        other => Err(DfttkConfigError::UnsupportedQueueType(other.to_string())),
    }
}

/// 解析 PBS 脚本文件
pub fn parse_pbs_script(path: &Path, vasp_cmd_flag: &str) -> Result<QueueScriptParams> {
    let content = fs::read_to_string(path).map_err(|e| DfttkConfigError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_pbs_content(&content, vasp_cmd_flag).map_err(|reason| DfttkConfigError::ParseError {
        format: "PBS".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 解析 PBS 脚本内容
pub fn parse_pbs_content(
    content: &str,
    vasp_cmd_flag: &str,
) -> std::result::Result<QueueScriptParams, String> {
    let mut params = QueueScriptParams::default();
    let mut pre_rocket = Vec::new();
    let mut post_rocket = Vec::new();
    let mut after_vasp = false;

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.starts_with(PBS_DIRECTIVE) {
            parse_directive(&mut params, line)
                .map_err(|reason| format!("line {}: {}", lineno + 1, reason))?;
        } else if line.contains(vasp_cmd_flag) {
            params.vasp_cmd = Some(line.to_string());
            after_vasp = true;
        } else if line.is_empty() || line.starts_with('#') || line.starts_with("cd $") {
            // 空行、注释、cd $PBS_O_WORKDIR
        } else if after_vasp {
            post_rocket.push(line.to_string());
        } else {
            pre_rocket.push(line.to_string());
        }
    }

    params.pre_rocket = RocketCommands::from_lines(pre_rocket);
    params.post_rocket = RocketCommands::from_lines(post_rocket);
    Ok(params)
}

/// 解析一行 `#PBS` 指令
fn parse_directive(params: &mut QueueScriptParams, line: &str) -> std::result::Result<(), String> {
    let mut fields = line.split_whitespace().skip(1);
    let flag = fields
        .next()
        .ok_or_else(|| format!("directive without flag: '{}'", line))?;
    let value = fields.next();

    if flag == "-l" {
        let value = value.ok_or_else(|| format!("'-l' without resource list: '{}'", line))?;
        if value.starts_with("walltime") {
            // walltime=48:00:00 本身含冒号，不能按 ':' 切分
            let (_, time) = value
                .split_once('=')
                .ok_or_else(|| format!("malformed walltime: '{}'", value))?;
            params.set_resource("walltime", time);
        } else {
            for item in value.split(':') {
                let (key, val) = item
                    .split_once('=')
                    .ok_or_else(|| format!("malformed resource '{}' in '{}'", item, line))?;
                params.set_resource(key, val);
            }
        }
    } else {
        let value = value.unwrap_or("true").to_string();
        set_flag(params, flag, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ACI_SCRIPT: &str = r#"#!/bin/bash
#PBS -l nodes=1:ppn=24
#PBS -l walltime=48:00:00
#PBS -l pmem=8gb
#PBS -A open
#PBS -q open
#PBS -N dfttk
#PBS -V

cd $PBS_O_WORKDIR
module load intel impi
module load vasp
mpirun vasp_std > vasp.out
rm -f WAVECAR
gzip OUTCAR
"#;

    #[test]
    fn test_parse_full_script() {
        let p = parse_pbs_content(ACI_SCRIPT, "vasp_std").unwrap();
        assert_eq!(p.nodes.as_deref(), Some("1"));
        assert_eq!(p.ppn.as_deref(), Some("24"));
        assert_eq!(p.pmem.as_deref(), Some("8gb"));
        assert_eq!(p.walltime.as_deref(), Some("48:00:00"));
        assert_eq!(p.account.as_deref(), Some("open"));
        assert_eq!(p.queue.as_deref(), Some("open"));
        assert_eq!(p.job_name.as_deref(), Some("dfttk"));
        assert_eq!(p.env.as_deref(), Some("true"));
        assert_eq!(p.vasp_cmd.as_deref(), Some("mpirun vasp_std > vasp.out"));
        assert_eq!(
            p.pre_rocket,
            Some(RocketCommands::Multiple(vec![
                "module load intel impi".to_string(),
                "module load vasp".to_string(),
            ]))
        );
        assert_eq!(
            p.post_rocket,
            Some(RocketCommands::Multiple(vec![
                "rm -f WAVECAR".to_string(),
                "gzip OUTCAR".to_string(),
            ]))
        );
    }

    #[test]
    fn test_walltime_exact() {
        let p = parse_pbs_content("#PBS -l walltime=48:00:00\n", "vasp_std").unwrap();
        assert_eq!(p.walltime.as_deref(), Some("48:00:00"));
        assert!(p.resources.is_empty());
    }

    #[test]
    fn test_minimal_script() {
        let p = parse_pbs_content("#PBS -q regular\nvasp_std\n", "vasp_std").unwrap();
        assert_eq!(p.queue.as_deref(), Some("regular"));
        assert_eq!(p.vasp_cmd.as_deref(), Some("vasp_std"));
        assert_eq!(p.pre_rocket, None);
        assert_eq!(p.post_rocket, None);
    }

    #[test]
    fn test_single_rocket_lines_are_scalars() {
        let script = "module load vasp\nmpirun vasp_std\necho done\n";
        let p = parse_pbs_content(script, "vasp_std").unwrap();
        assert_eq!(
            p.pre_rocket,
            Some(RocketCommands::Single("module load vasp".to_string()))
        );
        assert_eq!(
            p.post_rocket,
            Some(RocketCommands::Single("echo done".to_string()))
        );
    }

    #[test]
    fn test_custom_flag_and_extra_resources() {
        let script = "#PBS -l mem=64gb:naccesspolicy=singlejob\n#PBS -G chem\n#PBS -W x=1\nsrun vasp_gam\n";
        let p = parse_pbs_content(script, "vasp_gam").unwrap();
        assert_eq!(p.resources.get("mem").map(String::as_str), Some("64gb"));
        assert_eq!(
            p.resources.get("naccesspolicy").map(String::as_str),
            Some("singlejob")
        );
        assert_eq!(p.group_name.as_deref(), Some("chem"));
        assert_eq!(p.vasp_cmd.as_deref(), Some("srun vasp_gam"));
    }

    #[test]
    fn test_malformed_directives() {
        assert!(parse_pbs_content("#PBS\n", "vasp_std").is_err());
        assert!(parse_pbs_content("#PBS -l\n", "vasp_std").is_err());
        let err = parse_pbs_content("#PBS -l nodes=1:ppn\n", "vasp_std").unwrap_err();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn test_parse_file_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vaspjob.pbs");
        fs::write(&path, ACI_SCRIPT).unwrap();

        let first = parse_queue_script(&path, QueueType::Pbs, "vasp_std").unwrap();
        let second = parse_queue_script(&path, QueueType::Pbs, "vasp_std").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = parse_pbs_script(&dir.path().join("nope.pbs"), "vasp_std").unwrap_err();
        assert!(matches!(err, DfttkConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_slurm_unsupported() {
        let err = parse_queue_script(Path::new("job.slurm"), QueueType::Slurm, "vasp_std").unwrap_err();
        assert!(matches!(err, DfttkConfigError::UnsupportedQueueType(_)));
    }
}
