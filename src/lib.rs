//! # Reflkit - 单晶衍射反射数据工具箱
//!
//! 提供单晶 X 射线/中子衍射反射数据分析的核心算法：
//! 晶胞的正/倒空间几何、晶体学对称操作代数与群闭包、
//! 反射等效分类与合并、系统消光过滤，以及金刚石对顶砧
//! (DAC) 可测倒空间体积裁剪。
//!
//! 反射文件的读写、结构文件解析与绘图属于外部协作层，
//! 本库只通过列映射导入/导出与它们交换数据。
//!
//! ## 模块结构
//! ```text
//! lib.rs
//!   ├── models/      (晶胞几何模型)
//!   ├── symmetry/    (对称操作、群闭包、点群目录)
//!   ├── reflections/ (键注册表与列式反射表)
//!   ├── analysis/    (等效/合并/消光/DAC 引擎)
//!   └── error.rs     (错误处理)
//! ```

pub mod analysis;
pub mod error;
pub mod models;
pub mod reflections;
pub mod symmetry;

pub use analysis::{classify_equivalents, extinct, merge, Dac, ExtinctionRule};
pub use error::{ReflkitError, Result};
pub use models::UnitCell;
pub use reflections::{Column, ReflKey, ReflectionTable, Value};
pub use symmetry::{point_group, Group, OperationKind, SymmOp};
