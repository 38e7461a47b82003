//! # 归约分析引擎模块
//!
//! 提供作用于反射表的四个引擎：等效分类、合并、系统消光
//! 与 DAC 可测体积裁剪。全部引擎就地修改表格并同步返回。
//!
//! ## 子模块
//! - `equivalence`: 群作用下的等效类代表指派
//! - `merge`: 按列策略的等效反射合并
//! - `extinction`: `域: 条件` 消光规则过滤
//! - `dac`: 金刚石对顶砧可测体积裁剪
//!
//! ## 依赖关系
//! - 使用 `symmetry/`、`reflections/`、`models/` 与 `error.rs`

pub mod dac;
pub mod equivalence;
pub mod extinction;
pub mod merge;

pub use dac::Dac;
pub use equivalence::classify_equivalents;
pub use extinction::{extinct, Condition, Domain, ExtinctionRule};
pub use merge::merge;
