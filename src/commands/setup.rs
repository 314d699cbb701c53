//! # setup 命令实现
//!
//! 配置 atomate/FireWorks 与 pymatgen。
//!
//! ## atomate 流程
//! 1. 在配置目录中查找用户的配置文件和队列脚本
//! 2. 创建 `<prefix>/config` 与 `<prefix>/logs`
//! 3. 从队列脚本（找不到时从机器注册表）得到作业参数
//! 4. 写出 FW_config.yaml / my_fworker.yaml / my_qadapter.yaml
//! 5. 用户提供的同名文件覆盖生成的文件
//! 6. 在 shell rc 文件中导出 `FW_CONFIG_FILE`
//!
//! ## 依赖关系
//! - 使用 `cli/setup.rs` 定义的参数
//! - 使用 `parsers/`, `models/`, `writers/`, `potcar/`, `utils/`

use super::pymatgen::{self, PmgDefaults};
use crate::cli::setup::SetupArgs;
use crate::error::Result;
use crate::models::MachineRegistry;
use crate::parsers::parse_queue_script;
use crate::potcar::PotcarImport;
use crate::utils::discovery::{self, ConfigFiles};
use crate::utils::shell::{EnvFilePatcher, ShellRcPatcher};
use crate::utils::{fs as ufs, output};
use crate::writers::{self, update_config_file, ConfigFileKind, MergePolicy, WriterParams};

use std::path::{Path, PathBuf};

/// 执行 setup 命令
pub fn execute(args: SetupArgs) -> Result<()> {
    output::print_header("DFTTK Configuration");

    let (atomate, pymatgen) = match (args.atomate, args.pymatgen) {
        (false, false) => (true, true),
        selected => selected,
    };

    if atomate {
        let patcher = ShellRcPatcher::for_current_user()?;
        configure_atomate(&args, &patcher)?;
    }

    if pymatgen {
        output::print_separator();
        output::print_info("Configuring pymatgen");
        pymatgen::configure(&pmg_defaults(&args), &potcar_import(&args))?;
    }

    output::print_separator();
    output::print_done("Configuration finished");
    Ok(())
}

fn pmg_defaults(args: &SetupArgs) -> PmgDefaults {
    PmgDefaults {
        default_functional: args.default_functional.clone(),
        mapi_key: args.mapi.clone(),
        psp_store: args.psp_store.clone(),
    }
}

/// 队列脚本位置：配置目录中最浅的一个，找不到时按给定名称处理
fn queue_script_path(args: &SetupArgs) -> PathBuf {
    let found = discovery::find_files_named(&args.config_folder, &args.queue_script);
    discovery::shortest_path(&found)
        .map(|p| ufs::absolute(p))
        .unwrap_or_else(|| PathBuf::from(&args.queue_script))
}

fn potcar_import(args: &SetupArgs) -> PotcarImport {
    PotcarImport {
        psp_dirs: args.psp_dirs.clone(),
        store: ufs::absolute(&args.psp_store),
        search_cluster: args.aci,
        vasp_cmd: args.vasp_cmd_flag.clone(),
        queue_script: queue_script_path(args),
        queue_type: args.queue_type,
        staging: ufs::absolute(Path::new("psp_uncompress")),
    }
}

/// 得到写配置文件所需的作业参数
fn writer_params(args: &SetupArgs, files: &ConfigFiles, registry: &MachineRegistry) -> Result<WriterParams> {
    match files.get(&args.queue_script) {
        Some(script) => {
            output::print_info(&format!("Reading queue settings from {}", script.display()));
            let parsed = parse_queue_script(script, args.queue_type, &args.vasp_cmd_flag)?;
            Ok(WriterParams::from_script(
                &args.prefix,
                &args.machine,
                args.queue_type,
                &parsed,
            ))
        }
        None => {
            let profile = registry.resolve(&args.machine);
            output::print_info(&format!(
                "Using {} settings of machine '{}'",
                profile.queue_type, args.machine
            ));
            Ok(WriterParams::from_machine(
                &args.prefix,
                &args.machine,
                &profile,
                args.nodes,
                args.ppn,
                &args.pmem,
            ))
        }
    }
}

/// 写出 atomate 配置文件并导出 `FW_CONFIG_FILE`，返回写出的配置目录
pub fn configure_atomate(args: &SetupArgs, patcher: &dyn EnvFilePatcher) -> Result<PathBuf> {
    output::print_info(&format!(
        "Searching config files in {}",
        args.config_folder.display()
    ));
    let files = discovery::find_config_files(&args.config_folder, &args.queue_script)?;
    for (name, path) in files.iter() {
        if let Some(path) = path {
            output::print_info(&format!("Found {}: {}", name, path.display()));
        }
    }

    let registry = MachineRegistry::load(args.machines.as_deref(), args.nodes, args.ppn)?;
    let params = writer_params(args, &files, &registry)?;

    let config_dir = params.config_dir();
    ufs::create_dir(&config_dir)?;
    ufs::create_dir(&params.logs_dir())?;

    if registry.is_builtin() {
        let path = params.store_dir.join("machines.yaml");
        registry.write_yaml(&path)?;
        output::print_written(&path.display().to_string());
    }

    let policy = if args.preserve_paths {
        MergePolicy::PreservePaths
    } else {
        MergePolicy::Overwrite
    };

    for kind in ConfigFileKind::all() {
        let target = config_dir.join(kind.file_name());
        let user_file = files.get(kind.file_name());

        // 用户文件就在输出目录中时直接保留，不能先被生成的文件覆盖
        if let Some(user_file) = user_file.filter(|u| ufs::same_file(u, &target)) {
            output::print_info(&format!("Keeping {}", user_file.display()));
            continue;
        }

        if !kind.is_required() {
            writers::write_config(kind, &params)?;
        }
        match user_file {
            Some(user_file) => {
                update_config_file(&target, user_file, policy)?;
                output::print_success(&format!(
                    "{} updated from {}",
                    kind.file_name(),
                    user_file.display()
                ));
            }
            None => output::print_written(&target.display().to_string()),
        }
    }

    let fw_config = config_dir.join(ConfigFileKind::FwConfig.file_name());
    let vars = vec![("FW_CONFIG_FILE".to_string(), fw_config.display().to_string())];
    for rc in patcher.add_vars(&vars, true)? {
        output::print_success(&format!("FW_CONFIG_FILE exported in {}", rc.display()));
    }

    Ok(config_dir)
}
