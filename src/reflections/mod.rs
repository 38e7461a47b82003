//! # 反射数据模块
//!
//! 提供键注册表与列式反射数据表。
//!
//! ## 依赖关系
//! - 被 `analysis/` 各引擎使用
//! - 使用 `models/` 与 `error.rs`
//! - 子模块: schema, table

pub mod schema;
pub mod table;

pub use schema::{ReduceBehaviour, ReflKey, Value, ValueKind};
pub use table::{Column, ReflectionTable};
