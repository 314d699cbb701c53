//! # check 命令实现
//!
//! 检查 pymatgen (`~/.pmgrc.yaml`) 与 atomate (`FW_CONFIG_FILE`) 的配置。
//! 只做诊断：每一项打印 `SUCCESSFUL:` 或 `ERROR:`，命令本身不会失败。
//!
//! ## 依赖关系
//! - 使用 `cli/check.rs` 定义的参数
//! - 使用 `commands/pymatgen.rs`, `models/psp.rs`, `utils/output.rs`

use super::pymatgen::{self, KEY_FUNCTIONAL, KEY_MAPI, KEY_PSP_DIR};
use crate::cli::check::CheckArgs;
use crate::error::Result;
use crate::models::psp::{is_pmg_functional_choice, PspFunctional};
use crate::utils::{fs as ufs, output};

use std::env;
use std::path::{Path, PathBuf};

/// 用于判断赝势目录是否可用的元素
const MARKER_ELEMENT: &str = "Fe";

/// FW_config.yaml 中引用的文件
const FW_REFERENCED_FILES: [&str; 3] = ["LAUNCHPAD_LOC", "FWORKER_LOC", "QUEUEADAPTER_LOC"];

/// 检查结果汇总
#[derive(Debug, Default)]
pub struct CheckReport {
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl CheckReport {
    fn pass(&mut self, msg: &str) {
        output::print_success(&format!("SUCCESSFUL: {}", msg));
        self.passed += 1;
    }

    fn fail(&mut self, msg: &str, hint: &str) {
        output::print_warning(&format!("ERROR: {}", msg));
        output::print_hint(hint);
        self.failed += 1;
    }

    fn warn(&mut self, msg: &str) {
        output::print_warning(msg);
        self.warnings += 1;
    }

    fn merge(&mut self, other: CheckReport) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.warnings += other.warnings;
    }
}

/// 执行 check 命令
pub fn execute(args: CheckArgs) -> Result<()> {
    output::print_header("DFTTK Configuration Check");

    let (atomate, pymatgen) = match (args.atomate, args.pymatgen) {
        (false, false) => (true, true),
        selected => selected,
    };

    let mut report = CheckReport::default();
    if pymatgen {
        match pymatgen::pmgrc_path() {
            Ok(path) => report.merge(check_pymatgen(&path)),
            Err(e) => report.fail(&e.to_string(), "setup --pymatgen"),
        }
    }
    if atomate {
        if pymatgen {
            output::print_separator();
        }
        let fw_config = env::var_os("FW_CONFIG_FILE").map(PathBuf::from);
        report.merge(check_atomate(fw_config.as_deref()));
    }

    output::print_separator();
    output::print_info(&format!(
        "Passed: {}, Errors: {}, Warnings: {}",
        report.passed, report.failed, report.warnings
    ));
    Ok(())
}

/// 赝势目录中是否有可用的 Fe POTCAR
fn has_marker_potcar(functional_dir: &Path) -> bool {
    [
        functional_dir.join(format!("POTCAR.{}.gz", MARKER_ELEMENT)),
        functional_dir.join(format!("POTCAR.{}", MARKER_ELEMENT)),
        functional_dir.join(MARKER_ELEMENT).join("POTCAR"),
    ]
    .iter()
    .any(|p| p.is_file())
}

/// `PMG_VASP_PSP_DIR` 下可用的泛函
pub fn available_functionals(psp_dir: &Path) -> Vec<PspFunctional> {
    PspFunctional::ALL
        .into_iter()
        .filter(|f| has_marker_potcar(&psp_dir.join(f.dir_name())))
        .collect()
}

/// 检查 pymatgen 配置
pub fn check_pymatgen(pmgrc: &Path) -> CheckReport {
    let mut report = CheckReport::default();

    if !pmgrc.is_file() {
        report.fail(
            &format!("pymatgen config file ({}) does not exist", pmgrc.display()),
            "setup --pymatgen",
        );
        return report;
    }
    let settings = match pymatgen::load_pmgrc(pmgrc) {
        Ok(s) => s,
        Err(e) => {
            report.fail(&e.to_string(), "setup --pymatgen");
            return report;
        }
    };

    if pymatgen::configured_value(&settings, KEY_MAPI).is_some() {
        report.pass("PMG_MAPI_KEY is set");
    } else {
        report.fail(
            "PMG_MAPI_KEY is empty, some functions will not work",
            "setup --pymatgen --mapi <API_KEY>",
        );
    }

    let functional = pymatgen::configured_str(&settings, KEY_FUNCTIONAL);
    match functional {
        Some(f) if is_pmg_functional_choice(f) => {
            report.pass(&format!("PMG_DEFAULT_FUNCTIONAL is {}", f))
        }
        Some(f) => report.fail(
            &format!(
                "PMG_DEFAULT_FUNCTIONAL '{}' is not a pymatgen functional ({})",
                f,
                PspFunctional::ALL
                    .iter()
                    .map(|p| p.pmg_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            "setup --pymatgen --default-functional PBE",
        ),
        None => report.fail(
            "PMG_DEFAULT_FUNCTIONAL is not set",
            "setup --pymatgen --default-functional PBE",
        ),
    }

    let Some(psp_dir) = pymatgen::configured_str(&settings, KEY_PSP_DIR) else {
        report.fail("PMG_VASP_PSP_DIR is not set", "setup --pymatgen --psp-dir <DIR>");
        return report;
    };
    let psp_dir = ufs::absolute(Path::new(psp_dir));
    if !psp_dir.is_dir() {
        report.fail(
            &format!("PMG_VASP_PSP_DIR ({}) does not exist", psp_dir.display()),
            "setup --pymatgen --psp-dir <DIR>",
        );
        return report;
    }

    let available = available_functionals(&psp_dir);
    if available.is_empty() {
        report.fail(
            &format!("No usable pseudopotential was found in {}", psp_dir.display()),
            "setup --pymatgen --psp-dir <DIR>",
        );
        return report;
    }
    let names: Vec<&str> = available.iter().map(|f| f.pmg_name()).collect();
    report.pass(&format!(
        "Pseudopotentials available for: {}",
        names.join(", ")
    ));

    if let Some(f) = functional {
        // Perdew-Zunger81 使用 LDA 赝势
        let needed = if f == "Perdew-Zunger81" { "LDA" } else { f };
        if !names.contains(&needed) {
            report.warn(&format!(
                "The default functional {} has no pseudopotential in {}",
                f,
                psp_dir.display()
            ));
        }
    }

    report
}

/// 检查 atomate 配置
pub fn check_atomate(fw_config: Option<&Path>) -> CheckReport {
    let mut report = CheckReport::default();

    let Some(fw_config) = fw_config else {
        report.fail("FW_CONFIG_FILE is not set in the environment", "setup --atomate");
        return report;
    };
    if !fw_config.is_file() {
        report.fail(
            &format!("FW_CONFIG_FILE ({}) does not exist", fw_config.display()),
            "setup --atomate",
        );
        return report;
    }
    report.pass(&format!("FW_CONFIG_FILE is {}", fw_config.display()));

    let doc: serde_yaml::Value = match ufs::read_file(fw_config)
        .ok()
        .and_then(|text| serde_yaml::from_str::<serde_yaml::Value>(&text).ok())
    {
        Some(doc) => doc,
        None => {
            report.fail(
                &format!("{} is not a valid YAML file", fw_config.display()),
                "setup --atomate",
            );
            return report;
        }
    };

    if let Some(dir) = doc.get("CONFIG_FILE_DIR").and_then(|v| v.as_str()) {
        let db = Path::new(dir).join("db.json");
        if db.is_file() {
            report.pass(&format!("db.json found in {}", dir));
        } else {
            report.fail(&format!("{} does not exist", db.display()), "setup --atomate");
        }
    }

    for key in FW_REFERENCED_FILES {
        match doc.get(key).and_then(|v| v.as_str()) {
            Some(path) if Path::new(path).is_file() => report.pass(&format!("{} ({}) exists", key, path)),
            Some(path) => report.fail(&format!("{} ({}) does not exist", key, path), "setup --atomate"),
            None => report.warn(&format!("{} is not set in {}", key, fw_config.display())),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_available_functionals() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("POT_GGA_PAW_PBE")).unwrap();
        fs::write(dir.path().join("POT_GGA_PAW_PBE").join("POTCAR.Fe.gz"), "").unwrap();
        fs::create_dir_all(dir.path().join("POT_LDA_PAW").join("Fe")).unwrap();
        fs::write(dir.path().join("POT_LDA_PAW").join("Fe").join("POTCAR"), "").unwrap();
        fs::create_dir_all(dir.path().join("POT_GGA_PAW_PBE_54")).unwrap();

        assert_eq!(
            available_functionals(dir.path()),
            vec![PspFunctional::LdaPaw, PspFunctional::PbePaw]
        );
    }

    #[test]
    fn test_check_pymatgen_all_good() {
        let dir = TempDir::new().unwrap();
        let psp = dir.path().join("psp");
        fs::create_dir_all(psp.join("POT_GGA_PAW_PBE")).unwrap();
        fs::write(psp.join("POT_GGA_PAW_PBE").join("POTCAR.Fe"), "").unwrap();
        let pmgrc = dir.path().join(".pmgrc.yaml");
        fs::write(
            &pmgrc,
            format!(
                "PMG_MAPI_KEY: key\nPMG_DEFAULT_FUNCTIONAL: PBE\nPMG_VASP_PSP_DIR: {}\n",
                psp.display()
            ),
        )
        .unwrap();

        let report = check_pymatgen(&pmgrc);
        assert_eq!(report.failed, 0);
        assert_eq!(report.warnings, 0);
        assert_eq!(report.passed, 3);
    }

    #[test]
    fn test_check_pymatgen_reports_problems() {
        let dir = TempDir::new().unwrap();
        let psp = dir.path().join("psp");
        fs::create_dir_all(psp.join("POT_LDA_PAW")).unwrap();
        fs::write(psp.join("POT_LDA_PAW").join("POTCAR.Fe.gz"), "").unwrap();
        let pmgrc = dir.path().join(".pmgrc.yaml");
        fs::write(
            &pmgrc,
            format!("DEFAULT_FUNCTIONAL: PBE_54\nVASP_PSP_DIR: {}\n", psp.display()),
        )
        .unwrap();

        let report = check_pymatgen(&pmgrc);
        assert_eq!(report.failed, 1);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn test_check_pymatgen_missing_file() {
        let dir = TempDir::new().unwrap();
        let report = check_pymatgen(&dir.path().join(".pmgrc.yaml"));
        assert_eq!(report.failed, 1);
        assert_eq!(report.passed, 0);
    }

    #[test]
    fn test_check_atomate() {
        let dir = TempDir::new().unwrap();
        assert_eq!(check_atomate(None).failed, 1);

        let config = dir.path().join("config");
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join("db.json"), "{}").unwrap();
        fs::write(config.join("my_launchpad.yaml"), "host: localhost\n").unwrap();
        let fw = config.join("FW_config.yaml");
        fs::write(
            &fw,
            format!(
                "CONFIG_FILE_DIR: {0}\nLAUNCHPAD_LOC: {0}/my_launchpad.yaml\nFWORKER_LOC: {0}/my_fworker.yaml\n",
                config.display()
            ),
        )
        .unwrap();

        let report = check_atomate(Some(&fw));
        assert_eq!(report.passed, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.warnings, 1);
    }
}
