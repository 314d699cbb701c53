//! # machines 命令实现
//!
//! 以表格形式列出机器注册表。
//!
//! ## 依赖关系
//! - 使用 `cli/machines.rs` 定义的参数
//! - 使用 `models/machine.rs`, `utils/output.rs`
//! - 使用 `tabled` 显示表格

use crate::cli::machines::MachinesArgs;
use crate::error::Result;
use crate::models::{MachineProfile, MachineRegistry, FALLBACK_MACHINE};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 表格行
#[derive(Debug, Clone, Tabled)]
struct MachineRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Queue system")]
    queue_type: String,
    #[tabled(rename = "Queue")]
    queue: String,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "VASP command")]
    vasp_cmd: String,
}

impl MachineRow {
    fn new(name: &str, profile: &MachineProfile) -> Self {
        let marker = if name == FALLBACK_MACHINE { " *" } else { "" };
        MachineRow {
            name: format!("{}{}", name, marker),
            queue_type: profile.queue_type.to_string(),
            queue: profile.queue.clone().unwrap_or_default(),
            account: profile.account.clone().unwrap_or_default(),
            vasp_cmd: profile.vasp_cmd.clone(),
        }
    }
}

fn rows(registry: &MachineRegistry) -> Vec<MachineRow> {
    registry
        .iter()
        .map(|(name, profile)| MachineRow::new(name, profile))
        .collect()
}

/// 执行 machines 命令
pub fn execute(args: MachinesArgs) -> Result<()> {
    let registry = MachineRegistry::load(args.machines.as_deref(), args.nodes, args.ppn)?;

    match &args.machines {
        Some(path) => output::print_header(&format!("Machines in {}", path.display())),
        None => output::print_header("Built-in Machines"),
    }

    println!("{}", Table::new(rows(&registry)));
    output::print_info(&format!(
        "* marks {}, used when a requested machine is unknown",
        FALLBACK_MACHINE
    ));
    output::print_separator();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_cover_registry() {
        let registry = MachineRegistry::builtin(2, 32);
        let rows = rows(&registry);
        assert_eq!(rows.len(), registry.names().len());

        let roar = rows.iter().find(|r| r.name == "aci-roar *").unwrap();
        assert_eq!(roar.queue_type, "PBS");

        let hsw = rows.iter().find(|r| r.name == "cori-hsw").unwrap();
        assert_eq!(hsw.queue_type, "SLURM");
        assert!(hsw.vasp_cmd.contains("64"));
    }
}
