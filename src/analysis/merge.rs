//! # 等效反射合并
//!
//! 把同一等效类的多次观测按列策略归约为一行。
//!
//! ## 算法概述
//! 1. 先重新运行等效分类（陈旧的 equiv 数据一律覆盖）
//! 2. 按 equiv 值分组，组序取首次出现顺序（确定性）
//! 3. 逐列应用归约策略：Keep 取组内首行，Add 求和，
//!    Average 取算术平均，Discard 整列删除
//!
//! 幂等契约：每类一行的表再合并是空操作；合并两次与
//! 合并一次结果相同。
//!
//! ## 依赖关系
//! - 使用 `analysis/equivalence.rs`
//! - 使用 `reflections/` 与 `symmetry/group.rs`

use crate::analysis::equivalence::classify_equivalents;
use crate::error::Result;
use crate::reflections::{Column, ReduceBehaviour, ReflKey, ReflectionTable};
use crate::symmetry::Group;

use std::collections::BTreeMap;
use std::collections::HashMap;

/// 合并等效反射，返回被归并掉的行数
pub fn merge(table: &mut ReflectionTable, group: &Group) -> Result<usize> {
    classify_equivalents(table, group)?;

    let equiv = table.triple_column(ReflKey::Equiv)?;
    let before = table.len();

    // 按代表指数分组，保持首次出现顺序
    let mut class_index: HashMap<[i32; 3], usize> = HashMap::new();
    let mut classes: Vec<Vec<usize>> = Vec::new();
    for (row, &representative) in equiv.iter().enumerate() {
        match class_index.get(&representative) {
            Some(&c) => classes[c].push(row),
            None => {
                class_index.insert(representative, classes.len());
                classes.push(vec![row]);
            }
        }
    }

    let merged_rows = classes.len();
    let mut merged: BTreeMap<ReflKey, Column> = BTreeMap::new();
    for key in table.keys() {
        let column = match table.column(key) {
            Some(c) => c,
            None => continue,
        };
        let reduced = match key.behaviour() {
            ReduceBehaviour::Discard => continue,
            ReduceBehaviour::Keep => reduce_keep(column, &classes),
            ReduceBehaviour::Add => reduce_add(column, &classes),
            ReduceBehaviour::Average => reduce_average(column, &classes),
        };
        merged.insert(key, reduced);
    }

    table.replace_columns(merged, merged_rows)?;
    Ok(before - merged_rows)
}

/// Keep：取组内首行（原始顺序下确定）
fn reduce_keep(column: &Column, classes: &[Vec<usize>]) -> Column {
    match column {
        Column::Int(v) => Column::Int(classes.iter().map(|c| v[c[0]]).collect()),
        Column::Real(v) => Column::Real(classes.iter().map(|c| v[c[0]]).collect()),
        Column::IntTriple(v) => Column::IntTriple(classes.iter().map(|c| v[c[0]]).collect()),
    }
}

/// Add：组内求和（多重度合计）
fn reduce_add(column: &Column, classes: &[Vec<usize>]) -> Column {
    match column {
        Column::Int(v) => Column::Int(
            classes
                .iter()
                .map(|c| c.iter().map(|&i| v[i]).sum())
                .collect(),
        ),
        Column::Real(v) => Column::Real(
            classes
                .iter()
                .map(|c| c.iter().map(|&i| v[i]).sum())
                .collect(),
        ),
        // 指数三元组无求和语义，按 Keep 处理
        Column::IntTriple(v) => Column::IntTriple(classes.iter().map(|c| v[c[0]]).collect()),
    }
}

/// Average：组内算术平均（强度类量）
fn reduce_average(column: &Column, classes: &[Vec<usize>]) -> Column {
    match column {
        Column::Int(v) => Column::Int(
            classes
                .iter()
                .map(|c| {
                    let sum: f64 = c.iter().map(|&i| v[i] as f64).sum();
                    (sum / c.len() as f64).round() as i32
                })
                .collect(),
        ),
        Column::Real(v) => Column::Real(
            classes
                .iter()
                .map(|c| c.iter().map(|&i| v[i]).sum::<f64>() / c.len() as f64)
                .collect(),
        ),
        Column::IntTriple(v) => Column::IntTriple(classes.iter().map(|c| v[c[0]]).collect()),
    }
}
