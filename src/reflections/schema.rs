//! # 反射数据列键注册表
//!
//! 以闭合枚举描述反射表的全部列：名称、值类型、默认值、
//! 强制标志与合并归约策略。列访问因此在编译期受检，
//! 不存在运行时字符串属性查找。
//!
//! ## 键目录
//! | 键 | 含义 | 类型 | 策略 |
//! |----|------|------|------|
//! | h,k,l | Miller 指数 | Int | Keep |
//! | m | 多重度 | Int | Add |
//! | I,si | 强度及其不确定度 | Real | Average |
//! | F,sf | 结构因子及其不确定度 | Real | Average |
//! | b,c | 批次/晶体标签 | Int | Discard |
//! | x,y,z | 倒空间笛卡尔位置 | Real | Keep |
//! | r | 位置矢量模长 | Real | Keep |
//! | equiv | 等效类代表指数 | IntTriple | Keep |
//!
//! ## 依赖关系
//! - 被 `reflections/table.rs` 与 `analysis/` 使用
//! - 使用 `error.rs`

use crate::error::{ReflkitError, Result};

use serde::{Deserialize, Serialize};

/// 合并时的列归约策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceBehaviour {
    /// 取等效类中首行的值
    Keep,
    /// 按等效类求和（多重度）
    Add,
    /// 按等效类取算术平均（强度类量）
    Average,
    /// 合并后该列失去意义，整列丢弃（批次类标签）
    Discard,
}

/// 列值类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Real,
    IntTriple,
}

/// 单个单元格的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Real(f64),
    IntTriple([i32; 3]),
}

/// 反射数据列键（闭合枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReflKey {
    /// Miller 指数 h
    H,
    /// Miller 指数 k
    K,
    /// Miller 指数 l
    L,
    /// 强度
    I,
    /// 强度不确定度
    Si,
    /// 结构因子
    F,
    /// 结构因子不确定度
    Sf,
    /// 多重度
    M,
    /// 批次标签
    B,
    /// 晶体标签
    C,
    /// 倒空间位置 x
    X,
    /// 倒空间位置 y
    Y,
    /// 倒空间位置 z
    Z,
    /// 位置模长
    R,
    /// 等效类代表指数
    Equiv,
}

impl ReflKey {
    /// 全部已注册的键
    pub const ALL: [ReflKey; 15] = [
        ReflKey::H,
        ReflKey::K,
        ReflKey::L,
        ReflKey::I,
        ReflKey::Si,
        ReflKey::F,
        ReflKey::Sf,
        ReflKey::M,
        ReflKey::B,
        ReflKey::C,
        ReflKey::X,
        ReflKey::Y,
        ReflKey::Z,
        ReflKey::R,
        ReflKey::Equiv,
    ];

    /// 强制键：任何反射表都必须包含
    pub const IMPERATIVE: [ReflKey; 4] = [ReflKey::H, ReflKey::K, ReflKey::L, ReflKey::M];

    /// 键的外部名称
    pub fn name(&self) -> &'static str {
        match self {
            ReflKey::H => "h",
            ReflKey::K => "k",
            ReflKey::L => "l",
            ReflKey::I => "I",
            ReflKey::Si => "si",
            ReflKey::F => "F",
            ReflKey::Sf => "sf",
            ReflKey::M => "m",
            ReflKey::B => "b",
            ReflKey::C => "c",
            ReflKey::X => "x",
            ReflKey::Y => "y",
            ReflKey::Z => "z",
            ReflKey::R => "r",
            ReflKey::Equiv => "equiv",
        }
    }

    /// 按外部名称查找键；未注册的名称报错
    pub fn from_name(name: &str) -> Result<ReflKey> {
        ReflKey::ALL
            .iter()
            .copied()
            .find(|key| key.name() == name)
            .ok_or_else(|| ReflkitError::UnknownReflectionKey {
                name: name.to_string(),
            })
    }

    /// 值类型
    pub fn kind(&self) -> ValueKind {
        match self {
            ReflKey::H | ReflKey::K | ReflKey::L | ReflKey::M | ReflKey::B | ReflKey::C => {
                ValueKind::Int
            }
            ReflKey::I
            | ReflKey::Si
            | ReflKey::F
            | ReflKey::Sf
            | ReflKey::X
            | ReflKey::Y
            | ReflKey::Z
            | ReflKey::R => ValueKind::Real,
            ReflKey::Equiv => ValueKind::IntTriple,
        }
    }

    /// 注册的默认值
    pub fn default_value(&self) -> Value {
        match self {
            ReflKey::H | ReflKey::K | ReflKey::L => Value::Int(0),
            ReflKey::M | ReflKey::B | ReflKey::C => Value::Int(1),
            ReflKey::I | ReflKey::F => Value::Real(1.0),
            ReflKey::Si | ReflKey::Sf => Value::Real(0.0),
            ReflKey::X | ReflKey::Y | ReflKey::Z | ReflKey::R => Value::Real(0.0),
            ReflKey::Equiv => Value::IntTriple([0, 0, 0]),
        }
    }

    /// 强制标志
    pub fn imperative(&self) -> bool {
        ReflKey::IMPERATIVE.contains(self)
    }

    /// 合并归约策略
    pub fn behaviour(&self) -> ReduceBehaviour {
        match self {
            ReflKey::M => ReduceBehaviour::Add,
            ReflKey::I | ReflKey::Si | ReflKey::F | ReflKey::Sf => ReduceBehaviour::Average,
            ReflKey::B | ReflKey::C => ReduceBehaviour::Discard,
            _ => ReduceBehaviour::Keep,
        }
    }
}
