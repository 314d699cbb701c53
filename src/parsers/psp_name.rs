//! # 赝势名称规范化
//!
//! 将原始的赝势目录/压缩包名（如 `potpaw_PBE.54.tar.gz`）映射到规范的泛函族。
//!
//! ## 依赖关系
//! - 被 `potcar/import.rs` 使用
//! - 使用 `models/psp.rs`

use crate::models::PspFunctional;
use crate::utils::output;

use regex::Regex;

/// 按 `. _ - = + * 空白` 切分并转为大写
fn tokenize(raw: &str) -> Vec<String> {
    let delimiters = Regex::new(r"[._\-=+*\s]").unwrap();
    delimiters
        .split(&raw.to_uppercase())
        .map(str::to_string)
        .collect()
}

/// 纯分类函数，不输出任何信息
pub fn classify_psp_name(raw: &str) -> Option<PspFunctional> {
    let tokens = tokenize(raw);
    let has = |t: &str| tokens.iter().any(|x| x == t);
    // potUSPP 之类的名字中 US 只是子串
    let ultrasoft = tokens.iter().any(|x| x.contains("US"));

    if has("LDA") {
        Some(if has("52") {
            PspFunctional::LdaPaw52
        } else if has("54") {
            PspFunctional::LdaPaw54
        } else if ultrasoft {
            PspFunctional::LdaUs
        } else {
            PspFunctional::LdaPaw
        })
    } else if has("PBE") {
        Some(if has("52") {
            PspFunctional::PbePaw52
        } else if has("54") {
            PspFunctional::PbePaw54
        } else {
            PspFunctional::PbePaw
        })
    } else if has("GGA") {
        Some(if ultrasoft {
            PspFunctional::GgaUsPw91
        } else {
            PspFunctional::GgaPawPw91
        })
    } else {
        None
    }
}

/// 规范化赝势名称；无法识别时打印警告并返回 None（调用方应跳过该条目）
pub fn parse_psp_name(raw: &str) -> Option<PspFunctional> {
    let result = classify_psp_name(raw);
    if result.is_none() {
        output::print_warning(&format!(
            "{} is not a proper name of vasp's pseudopotential, this entry will be ignored",
            raw
        ));
    }
    result
}
