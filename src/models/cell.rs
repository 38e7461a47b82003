//! # 晶胞几何模型
//!
//! 定义晶胞的正空间/倒空间表示：六个晶格参数、正/倒格矢量
//! 与取向矩阵。
//!
//! ## 约定
//! - 角度内部统一存储为弧度；输入绝对值小于 2 视为弧度，
//!   否则按角度转换（晶体学角度不会小于约 115°·π/180 ≈ 2）
//! - 笛卡尔标架：a_v 沿 x 轴，b_v 位于 xy 平面
//! - 倒格矢量采用晶体学约定 a·a* = 1（不含 2π 因子）
//!
//! ## 不变量
//! 任一晶格参数被修改后，全部倒空间标量与六组矢量整体重算，
//! 不存在跨参数编辑的陈旧读数。
//!
//! ## 依赖关系
//! - 被 `reflections/table.rs` 与 `analysis/dac.rs` 使用
//! - 使用 `error.rs`

use crate::error::{ReflkitError, Result};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 判定角度输入单位的阈值：|x| < 2 视为弧度
const RADIAN_THRESHOLD: f64 = 2.0;

/// 体积退化判定阈值
const VOLUME_EPS: f64 = 1e-12;

/// 角度输入归一化：弧度原样保留，角度转换为弧度
fn canonicalize_angle(value: f64) -> f64 {
    if value.abs() < RADIAN_THRESHOLD {
        value
    } else {
        value.to_radians()
    }
}

/// 由六个晶格参数计算对偶（倒易）参数
///
/// 关系是对合的：对倒易参数再做一次对偶即恢复正空间参数。
fn dual_parameters(
    a: f64,
    b: f64,
    c: f64,
    al: f64,
    be: f64,
    ga: f64,
) -> Result<(f64, f64, f64, f64, f64, f64)> {
    let (ca, cb, cg) = (al.cos(), be.cos(), ga.cos());
    let (sa, sb, sg) = (al.sin(), be.sin(), ga.sin());

    let arg = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
    if arg <= 0.0 {
        return Err(ReflkitError::DegenerateCell {
            reason: format!("angles al={al:.6}, be={be:.6}, ga={ga:.6} rad give zero volume"),
        });
    }
    let volume = a * b * c * arg.sqrt();
    if volume.abs() < VOLUME_EPS {
        return Err(ReflkitError::DegenerateCell {
            reason: "volume is zero".to_string(),
        });
    }

    let a_r = b * c * sa / volume;
    let b_r = a * c * sb / volume;
    let c_r = a * b * sg / volume;
    let al_r = ((cb * cg - ca) / (sb * sg)).acos();
    let be_r = ((ca * cg - cb) / (sa * sg)).acos();
    let ga_r = ((ca * cb - cg) / (sa * sb)).acos();

    Ok((a_r, b_r, c_r, al_r, be_r, ga_r))
}

/// 晶胞
///
/// 存储六个正空间晶格参数与一个可变的取向矩阵，并维护派生的
/// 体积、倒易标量以及正/倒格矢量三元组。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCell {
    // 正空间标量（长度单位 Å，角度弧度）
    a: f64,
    b: f64,
    c: f64,
    al: f64,
    be: f64,
    ga: f64,

    /// 取向矩阵：把固定实验室方向映射到倒空间分数坐标。
    /// 仅校验形状，物理意义由调用方保证（通常来自实验记录）。
    orientation: Matrix3<f64>,

    // 派生量（参数编辑时整体重算）
    volume: f64,
    a_r: f64,
    b_r: f64,
    c_r: f64,
    al_r: f64,
    be_r: f64,
    ga_r: f64,
    v_r: f64,
    a_v: Vector3<f64>,
    b_v: Vector3<f64>,
    c_v: Vector3<f64>,
    a_w: Vector3<f64>,
    b_w: Vector3<f64>,
    c_w: Vector3<f64>,
}

impl UnitCell {
    /// 由六个晶格参数创建晶胞
    ///
    /// 角度可以是弧度或角度（自动判定）。长度非正或体积退化
    /// 时返回错误，不做任何截断修复。
    pub fn new(a: f64, b: f64, c: f64, al: f64, be: f64, ga: f64) -> Result<Self> {
        let mut cell = UnitCell {
            a: 1.0,
            b: 1.0,
            c: 1.0,
            al: std::f64::consts::FRAC_PI_2,
            be: std::f64::consts::FRAC_PI_2,
            ga: std::f64::consts::FRAC_PI_2,
            orientation: Matrix3::identity(),
            volume: 1.0,
            a_r: 1.0,
            b_r: 1.0,
            c_r: 1.0,
            al_r: std::f64::consts::FRAC_PI_2,
            be_r: std::f64::consts::FRAC_PI_2,
            ga_r: std::f64::consts::FRAC_PI_2,
            v_r: 1.0,
            a_v: Vector3::x(),
            b_v: Vector3::y(),
            c_v: Vector3::z(),
            a_w: Vector3::x(),
            b_w: Vector3::y(),
            c_w: Vector3::z(),
        };
        cell.edit(&[
            ("a", a),
            ("b", b),
            ("c", c),
            ("al", al),
            ("be", be),
            ("ga", ga),
        ])?;
        Ok(cell)
    }

    /// 由倒易参数创建晶胞（对偶关系的逆向使用）
    pub fn from_reciprocal(
        a_r: f64,
        b_r: f64,
        c_r: f64,
        al_r: f64,
        be_r: f64,
        ga_r: f64,
    ) -> Result<Self> {
        let al_r = canonicalize_angle(al_r);
        let be_r = canonicalize_angle(be_r);
        let ga_r = canonicalize_angle(ga_r);
        let (a, b, c, al, be, ga) = dual_parameters(a_r, b_r, c_r, al_r, be_r, ga_r)?;
        UnitCell::new(a, b, c, al, be, ga)
    }

    /// 部分编辑晶格参数
    ///
    /// 接受 (参数名, 值) 对的列表；未知参数名立即报错。任何
    /// 成功的编辑都会触发全部派生量的整体重算。
    pub fn edit(&mut self, parameters: &[(&str, f64)]) -> Result<()> {
        let previous = (self.a, self.b, self.c, self.al, self.be, self.ga);

        for &(name, value) in parameters {
            match name {
                "a" => self.a = value,
                "b" => self.b = value,
                "c" => self.c = value,
                "al" | "alpha" => self.al = canonicalize_angle(value),
                "be" | "beta" => self.be = canonicalize_angle(value),
                "ga" | "gamma" => self.ga = canonicalize_angle(value),
                _ => {
                    // 恢复旧值，保证失败的编辑不留下半更新状态
                    (self.a, self.b, self.c, self.al, self.be, self.ga) = previous;
                    return Err(ReflkitError::UnknownCellParameter {
                        name: name.to_string(),
                    });
                }
            }
        }

        match self.recompute() {
            Ok(()) => Ok(()),
            Err(e) => {
                (self.a, self.b, self.c, self.al, self.be, self.ga) = previous;
                // 旧参数此前必然合法，重算不会失败
                self.recompute().ok();
                Err(e)
            }
        }
    }

    /// 从结构文件元数据导入晶格参数与取向矩阵
    ///
    /// 键 a/b/c/al/be/ga 为晶格参数；键 ub11..ub33 为取向矩阵
    /// 九个分量（行优先）。取向键缺席时保留原矩阵；只给出部分
    /// 取向分量视为错误。
    pub fn import_metadata(&mut self, metadata: &HashMap<String, f64>) -> Result<()> {
        const UB_KEYS: [&str; 9] = [
            "ub11", "ub12", "ub13", "ub21", "ub22", "ub23", "ub31", "ub32", "ub33",
        ];

        let mut edits: Vec<(&str, f64)> = Vec::new();
        let mut ub = [0.0_f64; 9];
        let mut ub_found = 0usize;

        for (key, &value) in metadata {
            if let Some(pos) = UB_KEYS.iter().position(|&u| u == key.as_str()) {
                ub[pos] = value;
                ub_found += 1;
            } else {
                edits.push((key.as_str(), value));
            }
        }

        if ub_found > 0 && ub_found < 9 {
            return Err(ReflkitError::InvalidArgument(format!(
                "incomplete orientation matrix: {ub_found} of 9 components supplied"
            )));
        }

        if !edits.is_empty() {
            self.edit(&edits)?;
        }
        if ub_found == 9 {
            self.orientation = Matrix3::new(
                ub[0], ub[1], ub[2], ub[3], ub[4], ub[5], ub[6], ub[7], ub[8],
            );
        }
        Ok(())
    }

    /// 重算全部派生量（体积、倒易标量、正/倒格矢量）
    fn recompute(&mut self) -> Result<()> {
        if self.a <= 0.0 || self.b <= 0.0 || self.c <= 0.0 {
            return Err(ReflkitError::DegenerateCell {
                reason: format!(
                    "non-positive cell length: a={}, b={}, c={}",
                    self.a, self.b, self.c
                ),
            });
        }

        let (a_r, b_r, c_r, al_r, be_r, ga_r) =
            dual_parameters(self.a, self.b, self.c, self.al, self.be, self.ga)?;

        let (ca, cb, cg) = (self.al.cos(), self.be.cos(), self.ga.cos());
        let sg = self.ga.sin();
        let arg = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        self.volume = self.a * self.b * self.c * arg.sqrt();

        self.a_r = a_r;
        self.b_r = b_r;
        self.c_r = c_r;
        self.al_r = al_r;
        self.be_r = be_r;
        self.ga_r = ga_r;
        self.v_r = 1.0 / self.volume;

        // 标准标架：a_v 沿 x，b_v 在 xy 平面
        self.a_v = Vector3::new(self.a, 0.0, 0.0);
        self.b_v = Vector3::new(self.b * cg, self.b * sg, 0.0);
        let cx = self.c * cb;
        let cy = self.c * (ca - cb * cg) / sg;
        let cz2 = self.c * self.c - cx * cx - cy * cy;
        if cz2 <= 0.0 {
            return Err(ReflkitError::DegenerateCell {
                reason: "c vector collapses into the ab plane".to_string(),
            });
        }
        self.c_v = Vector3::new(cx, cy, cz2.sqrt());

        // 倒格矢量：矢量三重积对偶，满足 a_v·a_w = 1, a_v·b_w = 0
        self.a_w = self.b_v.cross(&self.c_v) / self.volume;
        self.b_w = self.c_v.cross(&self.a_v) / self.volume;
        self.c_w = self.a_v.cross(&self.b_v) / self.volume;

        Ok(())
    }

    // ───── 正空间访问器 ─────

    pub fn a(&self) -> f64 {
        self.a
    }
    pub fn b(&self) -> f64 {
        self.b
    }
    pub fn c(&self) -> f64 {
        self.c
    }
    /// α（弧度）
    pub fn al(&self) -> f64 {
        self.al
    }
    /// β（弧度）
    pub fn be(&self) -> f64 {
        self.be
    }
    /// γ（弧度）
    pub fn ga(&self) -> f64 {
        self.ga
    }
    /// 晶胞体积
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// 六个正空间参数 (a, b, c, al, be, ga)，角度为弧度
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        (self.a, self.b, self.c, self.al, self.be, self.ga)
    }

    // ───── 倒空间访问器 ─────

    /// 六个倒易参数 (a*, b*, c*, al*, be*, ga*)，角度为弧度
    pub fn reciprocal_parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        (self.a_r, self.b_r, self.c_r, self.al_r, self.be_r, self.ga_r)
    }

    /// 倒易体积 V* = 1/V
    pub fn reciprocal_volume(&self) -> f64 {
        self.v_r
    }

    // ───── 矢量访问器 ─────

    /// 正格矢量 (a_v, b_v, c_v)
    pub fn direct_vectors(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        (self.a_v, self.b_v, self.c_v)
    }

    /// 倒格矢量 (a_w, b_w, c_w)
    pub fn reciprocal_vectors(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        (self.a_w, self.b_w, self.c_w)
    }

    /// 正空间分数坐标 → 笛卡尔坐标
    pub fn fractional_to_cartesian(&self, v: Vector3<f64>) -> Vector3<f64> {
        v.x * self.a_v + v.y * self.b_v + v.z * self.c_v
    }

    /// 倒空间指数 (h, k, l) → 笛卡尔坐标（Å⁻¹）
    pub fn reciprocal_to_cartesian(&self, h: f64, k: f64, l: f64) -> Vector3<f64> {
        h * self.a_w + k * self.b_w + l * self.c_w
    }

    // ───── 取向矩阵 ─────

    pub fn orientation(&self) -> &Matrix3<f64> {
        &self.orientation
    }

    /// 设置取向矩阵（仅形状校验，由类型保证）
    pub fn set_orientation(&mut self, m: Matrix3<f64>) {
        self.orientation = m;
    }
}
