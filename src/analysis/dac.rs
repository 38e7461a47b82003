//! # 金刚石对顶砧（DAC）可测体积裁剪
//!
//! 计算 DAC 装置在给定取向下可测的倒空间体积，并据此
//! 裁剪反射表。
//!
//! ## 几何模型
//! 设极限球半径 R = 2/λ，开口半角 θ，盘面单位法线 **n**。
//! 1. 预过滤：|p| > R·sinθ 的反射直接舍弃
//! 2. 把位置 **p** 分解为沿 **n** 的分量 m1 与垂直分量 m2
//! 3. 可测区域是 (m1, m2) 半平面上圆心 (±t1, t2)、半径 R/2
//!    的两个圆（环面截面）的**交集**，其中 t1 = (R/2)·cosθ、
//!    t2 = (R/2)·sinθ —— 交集而非并集，对应真实 DAC 的
//!    双锥/盘面重叠几何
//! 4. 数值上落在极限边界的反射同样剔除，避免与预过滤重复计数
//!
//! ## 参考
//! - Structure of Materials by Marc De Graef and Michael E. McHenry
//!
//! ## 依赖关系
//! - 使用 `models/cell.rs` 与 `reflections/table.rs`
//! - 使用 `error.rs`

use crate::error::{ReflkitError, Result};
use crate::models::UnitCell;
use crate::reflections::{ReflKey, ReflectionTable};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 边界重合判定的相对容差
const BOUNDARY_TOL: f64 = 1e-9;

/// 角度单位判定阈值（与晶胞一致：|x| < 2 视为弧度）
const RADIAN_THRESHOLD: f64 = 2.0;

/// DAC 装置几何
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dac {
    /// 开口半角（弧度）
    opening_angle: f64,
    /// 波长（Å）
    wavelength: f64,
    /// 盘面单位法线（笛卡尔倒空间）
    normal: Vector3<f64>,
}

impl Dac {
    /// 由显式法线矢量构造
    ///
    /// 开口半角接受弧度或角度（自动判定），有效范围 (0°, 90°]。
    pub fn with_normal(
        opening_angle: f64,
        wavelength: f64,
        normal: Vector3<f64>,
    ) -> Result<Self> {
        let opening_angle = if opening_angle.abs() < RADIAN_THRESHOLD {
            opening_angle
        } else {
            opening_angle.to_radians()
        };
        if opening_angle <= 0.0 || opening_angle > std::f64::consts::FRAC_PI_2 {
            return Err(ReflkitError::InvalidArgument(format!(
                "DAC opening angle must lie in (0, 90] degrees, got {} rad",
                opening_angle
            )));
        }
        if wavelength <= 0.0 {
            return Err(ReflkitError::InvalidArgument(format!(
                "wavelength must be positive, got {wavelength}"
            )));
        }
        let norm = normal.norm();
        if norm < 1e-12 {
            return Err(ReflkitError::InvalidArgument(
                "DAC normal vector must be non-zero".to_string(),
            ));
        }
        Ok(Dac {
            opening_angle,
            wavelength,
            normal: normal / norm,
        })
    }

    /// 由晶胞取向矩阵导出法线构造
    ///
    /// 约定光束沿实验室 x 轴：取向矩阵把该方向映射到倒空间
    /// 分数坐标，再经倒格矢量笛卡尔化并归一化。
    pub fn from_orientation(opening_angle: f64, wavelength: f64, cell: &UnitCell) -> Result<Self> {
        let fractional = cell.orientation() * Vector3::x();
        let normal = cell.reciprocal_to_cartesian(fractional.x, fractional.y, fractional.z);
        Dac::with_normal(opening_angle, wavelength, normal)
    }

    /// 开口半角（弧度）
    pub fn opening_angle(&self) -> f64 {
        self.opening_angle
    }

    /// 极限球半径 R = 2/λ
    pub fn limiting_radius(&self) -> f64 {
        2.0 / self.wavelength
    }

    /// 盘面单位法线
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// 单个倒空间位置是否可测
    pub fn accessible(&self, p: Vector3<f64>) -> bool {
        let r = self.limiting_radius();
        let cap = r * self.opening_angle.sin();
        let p_norm = p.norm();

        // 预过滤 + 边界重合剔除
        if p_norm > cap - BOUNDARY_TOL * r {
            return false;
        }

        // 沿法线/垂直法线分解
        let m1 = p.dot(&self.normal);
        let m2 = (p - m1 * self.normal).norm();

        // 两个环面截面圆的交集
        let half = 0.5 * r;
        let t1 = half * self.opening_angle.cos();
        let t2 = half * self.opening_angle.sin();
        let near = (m1.abs() - t1).powi(2) + (m2 - t2).powi(2);
        let far = (m1.abs() + t1).powi(2) + (m2 - t2).powi(2);
        near <= half * half && far <= half * half
    }

    /// 裁剪反射表，返回删除的行数
    ///
    /// 先按晶胞重算位置列（x, y, z, r 保持新鲜），再整列应用
    /// 可测性判据；行序保持，行号自然重编。
    pub fn cut(&self, table: &mut ReflectionTable, cell: &UnitCell) -> Result<usize> {
        table.place(cell)?;

        let xs = table.real_column(ReflKey::X)?;
        let ys = table.real_column(ReflKey::Y)?;
        let zs = table.real_column(ReflKey::Z)?;
        let n = table.len();

        let mask: Vec<bool> = (0..n)
            .map(|i| self.accessible(Vector3::new(xs[i], ys[i], zs[i])))
            .collect();
        let removed = mask.iter().filter(|&&keep| !keep).count();
        table.retain(&mask)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::merge::merge;
    use crate::symmetry::point_group;
    use nalgebra::Matrix3;

    fn cubic_cell() -> UnitCell {
        UnitCell::new(10.0, 10.0, 10.0, 90.0, 90.0, 90.0).unwrap()
    }

    #[test]
    fn test_accessible_geometry() {
        // λ = 0.71 Å → R ≈ 2.817 Å⁻¹，θ = 35°
        let dac = Dac::with_normal(35.0, 0.71, Vector3::x()).unwrap();
        let r = dac.limiting_radius();

        // 贴近盘面的短矢量可测
        assert!(dac.accessible(Vector3::new(0.0, 0.1, 0.0)));
        // 沿法线的矢量不可测（落在双锥盲区）
        assert!(!dac.accessible(Vector3::new(0.9, 0.0, 0.0)));
        // 超出 R·sinθ 的矢量被预过滤
        assert!(!dac.accessible(Vector3::new(0.0, r * 0.6, 0.0)));
        // 近原点的短矢量可测（两个截面圆都经过原点）
        assert!(dac.accessible(Vector3::new(0.0, 0.02, 0.0)));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Dac::with_normal(0.0, 0.71, Vector3::x()).is_err());
        assert!(Dac::with_normal(120.0, 0.71, Vector3::x()).is_err());
        assert!(Dac::with_normal(35.0, -1.0, Vector3::x()).is_err());
        assert!(Dac::with_normal(35.0, 0.71, Vector3::zeros()).is_err());
    }

    #[test]
    fn test_opening_angle_units() {
        // 35° 与对应弧度给出同一几何
        let deg = Dac::with_normal(35.0, 0.71, Vector3::x()).unwrap();
        let rad = Dac::with_normal(35.0_f64.to_radians(), 0.71, Vector3::x()).unwrap();
        assert!((deg.opening_angle() - rad.opening_angle()).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_vs_orientation_normal() {
        // 同一物理取向的两种给法产生相同的过滤结果
        let mut cell = cubic_cell();
        // 取向矩阵把实验室 x 轴映射到 (1,0,0) 分数倒空间坐标
        cell.set_orientation(Matrix3::identity());

        let explicit = Dac::with_normal(35.0, 0.71, Vector3::x()).unwrap();
        let derived = Dac::from_orientation(35.0, 0.71, &cell).unwrap();

        let mut table_a = ReflectionTable::ball(&cell, 1.0, 1).unwrap();
        let mut table_b = table_a.duplicate();
        explicit.cut(&mut table_a, &cell).unwrap();
        derived.cut(&mut table_b, &cell).unwrap();

        assert_eq!(table_a.len(), table_b.len());
        assert_eq!(
            table_a.int_column(ReflKey::H).unwrap(),
            table_b.int_column(ReflKey::H).unwrap()
        );
        assert_eq!(
            table_a.int_column(ReflKey::L).unwrap(),
            table_b.int_column(ReflKey::L).unwrap()
        );
    }

    #[test]
    fn test_wider_opening_sees_more() {
        let cell = cubic_cell();
        let narrow = Dac::with_normal(25.0, 0.71, Vector3::x()).unwrap();
        let wide = Dac::with_normal(55.0, 0.71, Vector3::x()).unwrap();

        let mut table_narrow = ReflectionTable::ball(&cell, 1.0, 1).unwrap();
        let mut table_wide = table_narrow.duplicate();
        narrow.cut(&mut table_narrow, &cell).unwrap();
        wide.cut(&mut table_wide, &cell).unwrap();

        assert!(table_narrow.len() < table_wide.len());
    }

    #[test]
    fn test_end_to_end_scenario() {
        // 立方晶胞 a = 10 Å，点群 mmm，θ = 35°，法线沿 [100]，
        // 极限半径 1.0 Å⁻¹
        let cell = cubic_cell();
        let mut table = ReflectionTable::ball(&cell, 1.0, 1).unwrap();
        let unfiltered = table.len();
        assert!(unfiltered > 0);

        // 等效合并（mmm 的劳厄作用于指数）
        let group = point_group("mmm")
            .unwrap()
            .lauefy()
            .unwrap()
            .reciprocate()
            .unwrap();
        merge(&mut table, &group).unwrap();
        let merged = table.len();
        assert!(merged < unfiltered);

        // DAC 裁剪：结果严格非空且严格小于未裁剪计数
        let dac = Dac::with_normal(35.0, 0.71, Vector3::x()).unwrap();
        let removed = dac.cut(&mut table, &cell).unwrap();
        assert!(removed > 0);
        assert!(table.len() > 0);
        assert!(table.len() < merged);
    }
}
