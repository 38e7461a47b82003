//! # 有限对称群
//!
//! 由生成元出发做复合闭包，得到有序、无重复的操作集合，
//! 并派生阶数、中心对称性、手性、极性与晶系等性质。
//!
//! ## 算法概述
//! 1. 生成元按相等性去重（平移先模 1 归约）
//! 2. 工作表饱和：反复计算两两复合，收集未见过的新元素
//! 3. 一轮无新增即达到不动点；超出安全上限报错而非悬挂
//!
//! 真正的有限群保证终止：集合规模单调不减且有上界；
//! 上限保护把"不会终止"转化为显式的配置错误。
//!
//! ## 依赖关系
//! - 被 `analysis/` 各引擎使用
//! - 使用 `symmetry/operation.rs` 与 `error.rs`

use crate::error::{ReflkitError, Result};
use crate::symmetry::operation::SymmOp;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 群闭包的安全上限（晶体学点群阶数 ≤ 48，空间群点群部分有限）
const MAX_GROUP_SIZE: usize = 200;

/// 数值比较容差
const TOL: f64 = 1e-6;

/// 七大晶系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Trigonal,
    Hexagonal,
    Cubic,
}

/// 有限对称群
///
/// 构造后不可变；全部派生性质在构造时计算并缓存。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    generators: Vec<SymmOp>,
    operations: Vec<SymmOp>,
    centrosymmetric: bool,
    chiral: bool,
    polar: bool,
    system: CrystalSystem,
}

impl Group {
    /// 由生成元列表构造群（复合闭包）
    ///
    /// 生成元按相等性去重后保存；闭包见模块级说明。
    pub fn new(generators: Vec<SymmOp>) -> Result<Self> {
        let mut deduped: Vec<SymmOp> = Vec::with_capacity(generators.len());
        for g in generators {
            if !deduped.contains(&g) {
                deduped.push(g);
            }
        }
        let generators = deduped;
        let operations = close(&generators)?;

        let centrosymmetric = operations.iter().any(|op| (op.trace() + 3.0).abs() < TOL);
        let chiral = operations.iter().all(|op| op.det() > 0.0);
        let polar = derive_polarity(&operations);
        let system = derive_system(&operations)?;

        Ok(Group {
            generators,
            operations,
            centrosymmetric,
            chiral,
            polar,
            system,
        })
    }

    /// 由 Jones 三联码列表构造群
    pub fn from_codes(codes: &[&str]) -> Result<Self> {
        let generators = codes
            .iter()
            .map(|c| SymmOp::from_code(c))
            .collect::<Result<Vec<_>>>()?;
        Group::new(generators)
    }

    /// 群的阶数
    pub fn order(&self) -> usize {
        self.operations.len()
    }

    /// 全部操作（有序、无重复、闭合）
    pub fn operations(&self) -> &[SymmOp] {
        &self.operations
    }

    /// 生成元
    pub fn generators(&self) -> &[SymmOp] {
        &self.generators
    }

    /// 是否含反演中心（存在迹为 -3 的操作）
    pub fn is_centrosymmetric(&self) -> bool {
        self.centrosymmetric
    }

    /// 是否手性群（全部操作行列式为正）
    pub fn is_chiral(&self) -> bool {
        self.chiral
    }

    /// 是否极性群
    ///
    /// 判据：不存在两条不平行的真旋转轴，且不存在缺少不动
    /// 方向的非真操作（反演、旋转反演）。
    pub fn is_polar(&self) -> bool {
        self.polar
    }

    /// 所属晶系
    pub fn system(&self) -> CrystalSystem {
        self.system
    }

    /// 手性子集：行列式为正的操作
    pub fn chiral_operations(&self) -> Vec<&SymmOp> {
        self.operations.iter().filter(|op| op.det() > 0.0).collect()
    }

    /// 圆盘对称子集：迹不等于恒等迹的操作
    ///
    /// 用于衍射圆盘的对称归约（去掉恒等类操作）。
    pub fn disc_operations(&self) -> Vec<&SymmOp> {
        self.operations
            .iter()
            .filter(|op| (op.trace() - 3.0).abs() > TOL)
            .collect()
    }

    /// 倒易群：由各生成元的倒易对偶重新生成
    ///
    /// 把正空间群变换为正确作用于倒空间指数的群。
    pub fn reciprocate(&self) -> Result<Group> {
        let duals = self
            .generators
            .iter()
            .map(|g| g.reciprocal())
            .collect::<Result<Vec<_>>>()?;
        Group::new(duals)
    }

    /// 劳厄化：生成元追加反演中心后重新生成
    pub fn lauefy(&self) -> Result<Group> {
        let mut generators = self.generators.clone();
        generators.push(SymmOp::inversion());
        Group::new(generators)
    }

    /// 集合相等（与顺序无关）
    pub fn same_operations(&self, other: &Group) -> bool {
        self.order() == other.order()
            && self
                .operations
                .iter()
                .all(|op| other.operations.iter().any(|o| o == op))
    }
}

/// 工作表饱和闭包
fn close(generators: &[SymmOp]) -> Result<Vec<SymmOp>> {
    let mut ops: Vec<SymmOp> = vec![SymmOp::identity()];
    for g in generators {
        let g = g.reduce_translation();
        if !ops.contains(&g) {
            ops.push(g);
        }
    }

    loop {
        let mut fresh: Vec<SymmOp> = Vec::new();
        for a in &ops {
            for b in &ops {
                let product = a.compose(b).reduce_translation();
                if !ops.contains(&product) && !fresh.contains(&product) {
                    fresh.push(product);
                }
            }
        }
        if fresh.is_empty() {
            return Ok(ops);
        }
        ops.extend(fresh);
        if ops.len() > MAX_GROUP_SIZE {
            return Err(ReflkitError::GroupTooLarge {
                limit: MAX_GROUP_SIZE,
            });
        }
    }
}

/// 极性判据
fn derive_polarity(operations: &[SymmOp]) -> bool {
    let mut proper_axes: Vec<Vector3<f64>> = Vec::new();
    for op in operations {
        let det = op.det();
        let tr = op.trace();
        if det > 0.0 {
            // 非恒等真旋转：记录轴向
            if (tr - 3.0).abs() > TOL {
                if let Some(axis) = op.orientation() {
                    if !proper_axes.iter().any(|a| parallel(a, &axis)) {
                        proper_axes.push(axis);
                    }
                }
            }
        } else {
            // 反演与旋转反演没有不动方向；反映（迹 +1）保留镜面内方向
            if (tr - 1.0).abs() > TOL {
                return false;
            }
        }
    }
    proper_axes.len() <= 1
}

/// 晶系判定：由重数多重集与轴取向计数导出
fn derive_system(operations: &[SymmOp]) -> Result<CrystalSystem> {
    let mut fold_axes: Vec<(usize, Vector3<f64>)> = Vec::new();
    let mut has_six = false;
    let mut has_four = false;

    for op in operations {
        let fold = op.fold()?;
        has_six |= fold == 6;
        has_four |= fold == 4;
        if fold >= 2 {
            if let Some(axis) = op.orientation() {
                fold_axes.push((fold, axis));
            }
        }
    }

    let distinct = |target: usize| -> usize {
        let mut axes: Vec<Vector3<f64>> = Vec::new();
        for (fold, axis) in &fold_axes {
            if *fold == target && !axes.iter().any(|a| parallel(a, axis)) {
                axes.push(*axis);
            }
        }
        axes.len()
    };

    Ok(if has_six {
        CrystalSystem::Hexagonal
    } else if distinct(3) > 1 {
        CrystalSystem::Cubic
    } else if has_four {
        CrystalSystem::Tetragonal
    } else if distinct(3) == 1 {
        CrystalSystem::Trigonal
    } else if distinct(2) >= 2 {
        CrystalSystem::Orthorhombic
    } else if distinct(2) == 1 {
        CrystalSystem::Monoclinic
    } else {
        CrystalSystem::Triclinic
    })
}

fn parallel(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    a.cross(b).norm() < TOL
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn test_trivial_groups() {
        let g1 = Group::from_codes(&["x,y,z"]).unwrap();
        assert_eq!(g1.order(), 1);
        assert!(!g1.is_centrosymmetric());
        assert!(g1.is_chiral());
        assert_eq!(g1.system(), CrystalSystem::Triclinic);

        let gi = Group::from_codes(&["-x,-y,-z"]).unwrap();
        assert_eq!(gi.order(), 2);
        assert!(gi.is_centrosymmetric());
        assert!(!gi.is_chiral());
    }

    #[test]
    fn test_closure_idempotent() {
        let group = Group::from_codes(&["-y,x,z", "x,-y,-z"]).unwrap();
        assert_eq!(group.order(), 8);

        // 对已闭合的集合再做闭包不增长
        let reclosed = Group::new(group.operations().to_vec()).unwrap();
        assert_eq!(reclosed.order(), group.order());
        assert!(reclosed.same_operations(&group));
    }

    #[test]
    fn test_space_group_translations_reduce() {
        // 2₁ 螺旋轴生成的点群部分是 2 阶的
        let group = Group::from_codes(&["-x,-y,z+1/2"]).unwrap();
        assert_eq!(group.order(), 2);
    }

    #[test]
    fn test_group_too_large() {
        // 绕 z 转 1 弧度：非晶体学生成元，闭包不收敛
        let (s, c) = 1.0_f64.sin_cos();
        let op = SymmOp::linear(Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0));
        assert!(matches!(
            Group::new(vec![op]),
            Err(ReflkitError::GroupTooLarge { .. })
        ));
    }

    #[test]
    fn test_polarity() {
        // mm2 极性，mmm 非极性
        let mm2 = Group::from_codes(&["-x,-y,z", "x,-y,z"]).unwrap();
        assert!(mm2.is_polar());

        let mmm = Group::from_codes(&["-x,-y,z", "x,-y,-z", "-x,-y,-z"]).unwrap();
        assert!(!mmm.is_polar());

        let g222 = Group::from_codes(&["-x,-y,z", "x,-y,-z"]).unwrap();
        assert!(!g222.is_polar());
    }

    #[test]
    fn test_reciprocate_preserves_order() {
        let group = Group::from_codes(&["-y,x-y,z", "x-y,-y,-z"]).unwrap();
        let reciprocal = group.reciprocate().unwrap();
        assert_eq!(reciprocal.order(), group.order());
        // 倒易群无平移分量
        for op in reciprocal.operations() {
            assert!(op.translation().norm() < 1e-9);
        }
    }

    #[test]
    fn test_lauefy_adds_inversion() {
        let group = Group::from_codes(&["-y,x,z"]).unwrap();
        assert!(!group.is_centrosymmetric());
        assert_eq!(group.order(), 4);

        let laue = group.lauefy().unwrap();
        assert!(laue.is_centrosymmetric());
        assert_eq!(laue.order(), 8);

        // 已中心对称的群劳厄化后阶数不变
        let again = laue.lauefy().unwrap();
        assert_eq!(again.order(), laue.order());
    }

    #[test]
    fn test_chiral_subset() {
        let mmm = Group::from_codes(&["-x,-y,z", "x,-y,-z", "-x,-y,-z"]).unwrap();
        assert_eq!(mmm.chiral_operations().len(), 4);
        assert_eq!(mmm.disc_operations().len(), 7);
    }
}
