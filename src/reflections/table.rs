//! # 反射数据表
//!
//! 核心可变容器：每行一条反射，列由键注册表约束。
//! 存储按整列组织（列式），所有引擎以整列遍历方式处理，
//! 避免逐行分派。
//!
//! ## 不变量
//! - 强制键 h, k, l, m 对每一行始终有定义
//! - 全部列长度一致
//! - 引擎就地修改；需要前后对比的调用方先 `duplicate()`
//!
//! ## 依赖关系
//! - 被 `analysis/` 各引擎使用
//! - 使用 `reflections/schema.rs`、`models/cell.rs` 与 `error.rs`

use crate::error::{ReflkitError, Result};
use crate::models::UnitCell;
use crate::reflections::schema::{ReflKey, Value, ValueKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 指数枚举的试探上界倍增的硬上限
const INDEX_BOUND_CEILING: i32 = 512;

/// 单列数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Column {
    Int(Vec<i32>),
    Real(Vec<f64>),
    IntTriple(Vec<[i32; 3]>),
}

impl Column {
    /// 列长度
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Real(v) => v.len(),
            Column::IntTriple(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 值类型标签
    pub fn kind(&self) -> ValueKind {
        match self {
            Column::Int(_) => ValueKind::Int,
            Column::Real(_) => ValueKind::Real,
            Column::IntTriple(_) => ValueKind::IntTriple,
        }
    }

    /// 取第 i 行的值
    pub fn get(&self, i: usize) -> Value {
        match self {
            Column::Int(v) => Value::Int(v[i]),
            Column::Real(v) => Value::Real(v[i]),
            Column::IntTriple(v) => Value::IntTriple(v[i]),
        }
    }

    /// 以默认值重复 n 次构造列
    fn repeated(default: Value, n: usize) -> Column {
        match default {
            Value::Int(x) => Column::Int(vec![x; n]),
            Value::Real(x) => Column::Real(vec![x; n]),
            Value::IntTriple(x) => Column::IntTriple(vec![x; n]),
        }
    }

    /// 按布尔掩码保留行
    fn retain_mask(&mut self, mask: &[bool]) {
        fn filter<T>(v: &mut Vec<T>, mask: &[bool]) {
            let mut i = 0;
            v.retain(|_| {
                let keep = mask[i];
                i += 1;
                keep
            });
        }
        match self {
            Column::Int(v) => filter(v, mask),
            Column::Real(v) => filter(v, mask),
            Column::IntTriple(v) => filter(v, mask),
        }
    }

    /// 整数列视图
    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            Column::Int(v) => Some(v),
            _ => None,
        }
    }

    /// 实数列视图
    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            Column::Real(v) => Some(v),
            _ => None,
        }
    }

    /// 指数三元组列视图
    pub fn as_triple(&self) -> Option<&[[i32; 3]]> {
        match self {
            Column::IntTriple(v) => Some(v),
            _ => None,
        }
    }
}

/// 反射数据表
///
/// 行号隐含在 Vec 下标中，过滤后自然连续重编号。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionTable {
    columns: BTreeMap<ReflKey, Column>,
    rows: usize,
}

impl Default for ReflectionTable {
    fn default() -> Self {
        ReflectionTable::new()
    }
}

impl ReflectionTable {
    /// 创建空表（强制列就位，长度为零）
    pub fn new() -> Self {
        let mut columns = BTreeMap::new();
        for key in ReflKey::IMPERATIVE {
            columns.insert(key, Column::repeated(key.default_value(), 0));
        }
        ReflectionTable { columns, rows: 0 }
    }

    /// 从外部读取器的列映射导入
    ///
    /// 契约：全部列等长且类型与注册表一致；缺席的强制键用
    /// 注册默认值回填；强度/结构因子与其不确定度必须成对出现
    /// （宁可立即失败也不猜测缺失的统计量）。
    pub fn from_columns(supplied: BTreeMap<ReflKey, Column>) -> Result<Self> {
        let rows = supplied.values().next().map_or(0, Column::len);

        for (key, column) in &supplied {
            if column.kind() != key.kind() {
                return Err(ReflkitError::ColumnKindMismatch {
                    key: key.name().to_string(),
                    expected: format!("{:?}", key.kind()),
                });
            }
            if column.len() != rows {
                return Err(ReflkitError::ColumnLengthMismatch {
                    key: key.name().to_string(),
                    expected: rows,
                    found: column.len(),
                });
            }
        }

        // 统计量配对检查
        for (value, sigma) in [(ReflKey::I, ReflKey::Si), (ReflKey::F, ReflKey::Sf)] {
            if supplied.contains_key(&value) != supplied.contains_key(&sigma) {
                return Err(ReflkitError::MissingUncertainty {
                    value: value.name().to_string(),
                    sigma: sigma.name().to_string(),
                });
            }
        }

        let mut columns = supplied;
        for key in ReflKey::IMPERATIVE {
            columns
                .entry(key)
                .or_insert_with(|| Column::repeated(key.default_value(), rows));
        }

        Ok(ReflectionTable { columns, rows })
    }

    /// 生成极限球内的反射球（Miller 指数完整枚举）
    ///
    /// 从试探上界出发把指数立方体翻倍扩张，直到立方体之外的
    /// 指数被证明必然落在球外，再做一次完整枚举；上界超过
    /// 硬上限时报错而不是陷入无界枚举。(0,0,0) 不计入。
    pub fn ball(cell: &UnitCell, radius: f64, start_bound: i32) -> Result<Self> {
        if radius <= 0.0 {
            return Err(ReflkitError::InvalidArgument(format!(
                "ball radius must be positive, got {radius}"
            )));
        }

        // 试探上界翻倍，直到立方体外的指数必然落在球外
        let mut bound = start_bound.clamp(1, INDEX_BOUND_CEILING);
        while !cube_covers_sphere(cell, radius, bound) {
            bound *= 2;
            if bound > INDEX_BOUND_CEILING {
                return Err(ReflkitError::IndexBoundExceeded {
                    ceiling: INDEX_BOUND_CEILING,
                });
            }
        }

        let mut hs = Vec::new();
        let mut ks = Vec::new();
        let mut ls = Vec::new();
        for h in -bound..=bound {
            for k in -bound..=bound {
                for l in -bound..=bound {
                    if h == 0 && k == 0 && l == 0 {
                        continue;
                    }
                    let p = cell.reciprocal_to_cartesian(h as f64, k as f64, l as f64);
                    if p.norm() <= radius {
                        hs.push(h);
                        ks.push(k);
                        ls.push(l);
                    }
                }
            }
        }

        let rows = hs.len();
        let mut columns = BTreeMap::new();
        columns.insert(ReflKey::H, Column::Int(hs));
        columns.insert(ReflKey::K, Column::Int(ks));
        columns.insert(ReflKey::L, Column::Int(ls));
        columns.insert(ReflKey::M, Column::repeated(ReflKey::M.default_value(), rows));
        Ok(ReflectionTable { columns, rows })
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// 当前活动键集合（有序）
    pub fn keys(&self) -> Vec<ReflKey> {
        self.columns.keys().copied().collect()
    }

    pub fn has_key(&self, key: ReflKey) -> bool {
        self.columns.contains_key(&key)
    }

    /// 只读列视图（可视化导出等用途）
    pub fn column(&self, key: ReflKey) -> Option<&Column> {
        self.columns.get(&key)
    }

    /// 整数列，不存在则报错
    pub fn int_column(&self, key: ReflKey) -> Result<&[i32]> {
        self.column(key)
            .and_then(Column::as_int)
            .ok_or_else(|| ReflkitError::MissingColumn {
                key: key.name().to_string(),
            })
    }

    /// 实数列，不存在则报错
    pub fn real_column(&self, key: ReflKey) -> Result<&[f64]> {
        self.column(key)
            .and_then(Column::as_real)
            .ok_or_else(|| ReflkitError::MissingColumn {
                key: key.name().to_string(),
            })
    }

    /// 指数三元组列，不存在则报错
    pub fn triple_column(&self, key: ReflKey) -> Result<&[[i32; 3]]> {
        self.column(key)
            .and_then(Column::as_triple)
            .ok_or_else(|| ReflkitError::MissingColumn {
                key: key.name().to_string(),
            })
    }

    /// 写入或替换一列（长度与类型受检）
    pub fn set_column(&mut self, key: ReflKey, column: Column) -> Result<()> {
        if column.kind() != key.kind() {
            return Err(ReflkitError::ColumnKindMismatch {
                key: key.name().to_string(),
                expected: format!("{:?}", key.kind()),
            });
        }
        if column.len() != self.rows {
            return Err(ReflkitError::ColumnLengthMismatch {
                key: key.name().to_string(),
                expected: self.rows,
                found: column.len(),
            });
        }
        self.columns.insert(key, column);
        Ok(())
    }

    /// 删除一列（强制键不可删除）
    pub fn remove_column(&mut self, key: ReflKey) -> Result<()> {
        if key.imperative() {
            return Err(ReflkitError::InvalidArgument(format!(
                "cannot remove imperative column '{}'",
                key.name()
            )));
        }
        self.columns.remove(&key);
        Ok(())
    }

    /// 显式深拷贝
    ///
    /// 引擎都是就地破坏性修改；想保留"修改前"的调用方必须
    /// 先取得完全独立的副本。
    pub fn duplicate(&self) -> ReflectionTable {
        self.clone()
    }

    /// 按布尔掩码保留行，所有列同步过滤，行号自然重编
    pub fn retain(&mut self, mask: &[bool]) -> Result<()> {
        if mask.len() != self.rows {
            return Err(ReflkitError::ColumnLengthMismatch {
                key: "mask".to_string(),
                expected: self.rows,
                found: mask.len(),
            });
        }
        for column in self.columns.values_mut() {
            column.retain_mask(mask);
        }
        self.rows = mask.iter().filter(|&&keep| keep).count();
        Ok(())
    }

    /// 以整表替换全部列（内部使用；长度一致性由调用方保证后受检）
    pub(crate) fn replace_columns(
        &mut self,
        columns: BTreeMap<ReflKey, Column>,
        rows: usize,
    ) -> Result<()> {
        for (key, column) in &columns {
            if column.len() != rows {
                return Err(ReflkitError::ColumnLengthMismatch {
                    key: key.name().to_string(),
                    expected: rows,
                    found: column.len(),
                });
            }
        }
        self.columns = columns;
        self.rows = rows;
        Ok(())
    }

    /// 按晶胞计算倒空间笛卡尔位置列 x, y, z 与模长列 r
    pub fn place(&mut self, cell: &UnitCell) -> Result<()> {
        let hs = self.int_column(ReflKey::H)?;
        let ks = self.int_column(ReflKey::K)?;
        let ls = self.int_column(ReflKey::L)?;

        let n = self.rows;
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        let mut zs = Vec::with_capacity(n);
        let mut rs = Vec::with_capacity(n);
        for i in 0..n {
            let p = cell.reciprocal_to_cartesian(hs[i] as f64, ks[i] as f64, ls[i] as f64);
            xs.push(p.x);
            ys.push(p.y);
            zs.push(p.z);
            rs.push(p.norm());
        }

        self.columns.insert(ReflKey::X, Column::Real(xs));
        self.columns.insert(ReflKey::Y, Column::Real(ys));
        self.columns.insert(ReflKey::Z, Column::Real(zs));
        self.columns.insert(ReflKey::R, Column::Real(rs));
        Ok(())
    }

    /// 行主序导出：调用方给定列子集与顺序
    pub fn rows_for(&self, keys: &[ReflKey]) -> Result<Vec<Vec<Value>>> {
        let mut selected = Vec::with_capacity(keys.len());
        for &key in keys {
            let column = self
                .column(key)
                .ok_or_else(|| ReflkitError::MissingColumn {
                    key: key.name().to_string(),
                })?;
            selected.push(column);
        }

        let mut out = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            out.push(selected.iter().map(|c| c.get(i)).collect());
        }
        Ok(out)
    }
}

/// 立方体 [-bound, bound]³ 之外的指数是否必然落在球外
///
/// p·a_v = h 意味着 |h| ≥ bound+1 的点到原点至少 (bound+1)/a
/// （晶格平面族的距离），k、l 方向同理。
fn cube_covers_sphere(cell: &UnitCell, radius: f64, bound: i32) -> bool {
    let margin = (bound + 1) as f64;
    margin / cell.a() > radius && margin / cell.b() > radius && margin / cell.c() > radius
}
