//! # 对称性模块
//!
//! 提供晶体学对称操作代数与有限群闭包。
//!
//! ## 子模块
//! - `operation`: 对称操作（仿射映射、复合、分类）
//! - `group`: 有限群（闭包、派生性质、倒易化/劳厄化）
//! - `catalog`: 32 个晶体学点群目录
//!
//! ## 依赖关系
//! - 被 `analysis/` 各引擎使用
//! - 使用 `error.rs`

pub mod catalog;
pub mod group;
pub mod operation;

pub use catalog::point_group;
pub use group::{CrystalSystem, Group};
pub use operation::{OperationKind, SymmOp};
