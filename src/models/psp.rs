//! # 赝势泛函族数据模型
//!
//! VASP 赝势按交换关联泛函分发，这里定义 pymatgen 认可的九种规范目录名。
//!
//! ## 依赖关系
//! - 被 `parsers/psp_name.rs`, `potcar/`, `commands/check.rs` 使用

use std::fmt;

/// 规范化后的赝势族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PspFunctional {
    LdaPaw,
    LdaPaw52,
    LdaPaw54,
    LdaUs,
    PbePaw,
    PbePaw52,
    PbePaw54,
    GgaPawPw91,
    GgaUsPw91,
}

impl PspFunctional {
    pub const ALL: [PspFunctional; 9] = [
        PspFunctional::PbePaw,
        PspFunctional::PbePaw52,
        PspFunctional::PbePaw54,
        PspFunctional::LdaPaw,
        PspFunctional::LdaPaw52,
        PspFunctional::LdaPaw54,
        PspFunctional::GgaPawPw91,
        PspFunctional::LdaUs,
        PspFunctional::GgaUsPw91,
    ];

    /// pymatgen `PMG_VASP_PSP_DIR` 下的子目录名
    pub fn dir_name(self) -> &'static str {
        match self {
            PspFunctional::LdaPaw => "POT_LDA_PAW",
            PspFunctional::LdaPaw52 => "POT_LDA_PAW_52",
            PspFunctional::LdaPaw54 => "POT_LDA_PAW_54",
            PspFunctional::LdaUs => "POT_LDA_US",
            PspFunctional::PbePaw => "POT_GGA_PAW_PBE",
            PspFunctional::PbePaw52 => "POT_GGA_PAW_PBE_52",
            PspFunctional::PbePaw54 => "POT_GGA_PAW_PBE_54",
            PspFunctional::GgaPawPw91 => "POT_GGA_PAW_PW91",
            PspFunctional::GgaUsPw91 => "POT_GGA_US_PW91",
        }
    }

    /// `PMG_DEFAULT_FUNCTIONAL` 使用的泛函名
    pub fn pmg_name(self) -> &'static str {
        match self {
            PspFunctional::LdaPaw => "LDA",
            PspFunctional::LdaPaw52 => "LDA_52",
            PspFunctional::LdaPaw54 => "LDA_54",
            PspFunctional::LdaUs => "LDA_US",
            PspFunctional::PbePaw => "PBE",
            PspFunctional::PbePaw52 => "PBE_52",
            PspFunctional::PbePaw54 => "PBE_54",
            PspFunctional::GgaPawPw91 => "PW91",
            PspFunctional::GgaUsPw91 => "PW91_US",
        }
    }

    pub fn from_pmg_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.pmg_name() == name)
    }
}

impl fmt::Display for PspFunctional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// pymatgen 接受的 `PMG_DEFAULT_FUNCTIONAL` 取值
///
/// `Perdew-Zunger81` 是 LDA 的别名，没有独立的赝势目录。
pub fn is_pmg_functional_choice(name: &str) -> bool {
    name == "Perdew-Zunger81" || PspFunctional::from_pmg_name(name).is_some()
}
