//! # 几何数据模型模块
//!
//! 定义晶胞几何模型。
//!
//! ## 依赖关系
//! - 被 `reflections/` 和 `analysis/` 使用
//! - 子模块: cell

pub mod cell;

pub use cell::UnitCell;
