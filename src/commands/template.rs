//! # template 命令实现
//!
//! 写出 db.json 与 my_launchpad.yaml 模板，供用户填写数据库连接信息。
//!
//! ## 依赖关系
//! - 使用 `cli/template.rs` 定义的参数
//! - 使用 `writers/`, `utils/output.rs`

use crate::cli::template::TemplateArgs;
use crate::error::Result;
use crate::utils::output;
use crate::writers::{self, ConfigFileKind, WriterParams};

use std::path::{Path, PathBuf};

/// 写出模板，返回实际写出的文件
pub fn write_templates(dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let params = WriterParams::new(dir, "template");
    let mut written = Vec::new();

    for kind in ConfigFileKind::REQUIRED {
        let target = dir.join(kind.file_name());
        if target.exists() && !force {
            output::print_skip(&format!(
                "{} already exists (use --force to overwrite)",
                target.display()
            ));
            continue;
        }
        let path = writers::write_config_to(kind, &params, dir)?;
        output::print_written(&path.display().to_string());
        written.push(path);
    }
    Ok(written)
}

/// 执行 template 命令
pub fn execute(args: TemplateArgs) -> Result<()> {
    output::print_header("Config Templates");

    let written = write_templates(&args.dir, args.force)?;

    output::print_separator();
    output::print_done(&format!(
        "{} template(s) written, edit them and run 'dfttk-config setup -c {}'",
        written.len(),
        args.dir.display()
    ));
    Ok(())
}
