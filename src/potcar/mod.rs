//! # 赝势 (POTCAR) 处理模块
//!
//! 定位集群上的 VASP 与赝势，并导入到 pymatgen 的赝势目录。
//!
//! ## 依赖关系
//! - 被 `commands/pymatgen.rs` 使用
//! - 子模块: import, locate

pub mod import;
pub mod locate;

pub use import::PotcarImport;
