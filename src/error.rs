//! # 统一错误处理模块
//!
//! 定义 Reflkit 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// Reflkit 统一错误类型
#[derive(Error, Debug)]
pub enum ReflkitError {
    // ─────────────────────────────────────────────────────────────
    // 输入解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Cannot parse symmetry code: '{code}'\nReason: {reason}")]
    MalformedSymmetryCode { code: String, reason: String },

    #[error("Unknown unit cell parameter: '{name}' (expected one of a, b, c, al, be, ga)")]
    UnknownCellParameter { name: String },

    #[error("Unknown reflection key: '{name}'")]
    UnknownReflectionKey { name: String },

    #[error("Unknown point group symbol: '{symbol}'")]
    UnknownPointGroup { symbol: String },

    #[error("Unknown extinction domain code: '{code}'")]
    UnknownDomainCode { code: String },

    #[error("Unknown extinction condition code: '{code}'")]
    UnknownConditionCode { code: String },

    // ─────────────────────────────────────────────────────────────
    // 数据完整性错误
    // ─────────────────────────────────────────────────────────────
    #[error("Column '{key}' has {found} values, expected {expected}")]
    ColumnLengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("Column '{key}' has the wrong value kind, expected {expected}")]
    ColumnKindMismatch { key: String, expected: String },

    #[error("Column '{value}' supplied without its uncertainty column '{sigma}'")]
    MissingUncertainty { value: String, sigma: String },

    #[error("Required column missing: '{key}'")]
    MissingColumn { key: String },

    // ─────────────────────────────────────────────────────────────
    // 群闭包保护
    // ─────────────────────────────────────────────────────────────
    #[error("Group closure exceeded {limit} operations; generators do not form a finite crystallographic group")]
    GroupTooLarge { limit: usize },

    #[error("Operation has no crystallographic fold (expected 1, 2, 3, 4 or 6)")]
    NonCrystallographicFold,

    // ─────────────────────────────────────────────────────────────
    // 数值退化
    // ─────────────────────────────────────────────────────────────
    #[error("Degenerate unit cell: {reason}")]
    DegenerateCell { reason: String },

    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    #[error("Reflection index bound exceeded the ceiling of {ceiling}")]
    IndexBoundExceeded { ceiling: i32 },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ReflkitError>;
