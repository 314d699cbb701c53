//! # parse 命令实现
//!
//! 解析队列脚本并以 YAML 形式打印提取出的参数。
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `parsers/queue_script.rs`, `utils/output.rs`

use crate::cli::parse::ParseArgs;
use crate::error::Result;
use crate::parsers::parse_queue_script;
use crate::utils::output;

/// 执行 parse 命令
pub fn execute(args: ParseArgs) -> Result<()> {
    output::print_header(&format!("Queue Script: {}", args.script.display()));

    let params = parse_queue_script(&args.script, args.queue_type, &args.vasp_cmd_flag)?;
    print!("{}", serde_yaml::to_string(&params)?);

    if params.vasp_cmd.is_none() {
        output::print_warning(&format!(
            "No line contains '{}', the VASP command was not found",
            args.vasp_cmd_flag
        ));
    }
    output::print_separator();
    Ok(())
}
