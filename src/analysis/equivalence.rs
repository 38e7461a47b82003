//! # 反射等效分类
//!
//! 在给定群作用下为每条反射指派等效类的规范代表。
//!
//! ## 依赖关系
//! - 被 `analysis/merge.rs` 使用
//! - 使用 `symmetry/group.rs` 与 `reflections/table.rs`

use crate::error::Result;
use crate::reflections::{Column, ReflKey, ReflectionTable};
use crate::symmetry::Group;

/// 计算并写入等效类代表列 `equiv`
///
/// 代表取群轨道 {op(h,k,l)} 中字典序最大的指数三元组
/// （先比 h，再比 k，再比 l）。结果只依赖指数与群本身，
/// 与处理顺序无关；相同指数的行必然获得相同代表。
///
/// 调用方负责提供作用于指数的群（必要时先 `reciprocate()`）。
pub fn classify_equivalents(table: &mut ReflectionTable, group: &Group) -> Result<()> {
    let hs = table.int_column(ReflKey::H)?;
    let ks = table.int_column(ReflKey::K)?;
    let ls = table.int_column(ReflKey::L)?;
    let n = table.len();

    // 初值取行自身指数，再逐操作整列取字典序最大者
    let mut representatives: Vec<[i32; 3]> = (0..n).map(|i| [hs[i], ks[i], ls[i]]).collect();
    for op in group.operations() {
        for i in 0..n {
            let (h, k, l) = op.apply_to_index(hs[i], ks[i], ls[i]);
            let image = [h, k, l];
            if image > representatives[i] {
                representatives[i] = image;
            }
        }
    }

    table.set_column(ReflKey::Equiv, Column::IntTriple(representatives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetry::point_group;
    use std::collections::BTreeMap;

    fn table_from_hkl(hkl: &[(i32, i32, i32)]) -> ReflectionTable {
        let mut map = BTreeMap::new();
        map.insert(ReflKey::H, Column::Int(hkl.iter().map(|t| t.0).collect()));
        map.insert(ReflKey::K, Column::Int(hkl.iter().map(|t| t.1).collect()));
        map.insert(ReflKey::L, Column::Int(hkl.iter().map(|t| t.2).collect()));
        ReflectionTable::from_columns(map).unwrap()
    }

    #[test]
    fn test_friedel_pair_shares_representative() {
        let group = point_group("-1").unwrap().reciprocate().unwrap();
        let mut table = table_from_hkl(&[(1, 2, 3), (-1, -2, -3)]);
        classify_equivalents(&mut table, &group).unwrap();

        let equiv = table.triple_column(ReflKey::Equiv).unwrap();
        assert_eq!(equiv[0], equiv[1]);
        assert_eq!(equiv[0], [1, 2, 3]);
    }

    #[test]
    fn test_representative_is_lexicographically_largest() {
        let group = point_group("mmm").unwrap().reciprocate().unwrap();
        // mmm 轨道含全部符号组合；代表应为全正指数
        let mut table = table_from_hkl(&[(-3, 2, -1), (3, -2, 1), (3, 2, 1)]);
        classify_equivalents(&mut table, &group).unwrap();

        let equiv = table.triple_column(ReflKey::Equiv).unwrap();
        assert!(equiv.iter().all(|&e| e == [3, 2, 1]));
    }

    #[test]
    fn test_order_independence() {
        let group = point_group("4/m").unwrap().reciprocate().unwrap();
        let mut forward = table_from_hkl(&[(1, 0, 0), (0, 1, 0), (2, 1, 3)]);
        let mut reversed = table_from_hkl(&[(2, 1, 3), (0, 1, 0), (1, 0, 0)]);
        classify_equivalents(&mut forward, &group).unwrap();
        classify_equivalents(&mut reversed, &group).unwrap();

        let fwd = forward.triple_column(ReflKey::Equiv).unwrap();
        let rev = reversed.triple_column(ReflKey::Equiv).unwrap();
        assert_eq!(fwd[0], rev[2]);
        assert_eq!(fwd[1], rev[1]);
        assert_eq!(fwd[2], rev[0]);
    }
}
