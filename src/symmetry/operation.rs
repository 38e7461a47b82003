//! # 晶体学对称操作
//!
//! 实现三维仿射对称操作：线性部分（3×3 矩阵）+ 平移矢量。
//!
//! ## 算法概述
//! 1. 从 Jones 符号三联码（如 `-y,x-y,z+1/2`）解析操作
//! 2. 复合、乘幂与平移模 1 归约构成操作代数
//! 3. 由行列式/迹/滑移分量对操作定性分类
//! 4. 倒易对偶 (L⁻¹)ᵀ 把正空间对称映射到倒空间指数变换
//!
//! ## 参考
//! - International Tables for Crystallography, Vol. A
//!
//! ## 依赖关系
//! - 被 `symmetry/group.rs` 使用
//! - 使用 `error.rs`

use crate::error::{ReflkitError, Result};

use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// 操作相等性判定的数值容差（4×4 仿射嵌入逐元素比较）
const EQ_TOL: f64 = 1e-6;

/// 对称操作的几何类别
///
/// 由行列式、迹与滑移分量唯一确定，对数值上接近的输入稳定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// 恒等操作
    Identity,
    /// 纯平移
    Translation,
    /// 纯旋转
    Rotation,
    /// 旋转 + 平移（螺旋轴）
    Rototranslation,
    /// 反演中心
    Inversion,
    /// 旋转反演
    Rotoinversion,
    /// 镜面反映
    Reflection,
    /// 反映 + 平移（滑移面）
    Transflection,
}

/// 对称操作：线性部分 + 平移
///
/// 晶体学设置下线性部分的元素取整数值（以 f64 存储）；
/// 平移分量为有理数，归约后落在 [0, 1) 内。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymmOp {
    matrix: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl SymmOp {
    /// 创建新的对称操作
    pub fn new(matrix: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            matrix,
            translation,
        }
    }

    /// 创建无平移的线性操作
    pub fn linear(matrix: Matrix3<f64>) -> Self {
        Self::new(matrix, Vector3::zeros())
    }

    /// 恒等操作
    pub fn identity() -> Self {
        Self::linear(Matrix3::identity())
    }

    /// 反演操作 -x,-y,-z
    pub fn inversion() -> Self {
        Self::linear(-Matrix3::identity())
    }

    /// 从 Jones 符号三联码解析操作
    ///
    /// 接受如 `x,y,z`、`-y,x-y,z`、`x+1/2,-y,z+0.5` 的写法。
    /// 不可识别的分量立即报错并指明出错的记号。
    pub fn from_code(code: &str) -> Result<Self> {
        let components: Vec<&str> = code.split(',').collect();
        if components.len() != 3 {
            return Err(ReflkitError::MalformedSymmetryCode {
                code: code.to_string(),
                reason: format!("expected 3 comma-separated components, got {}", components.len()),
            });
        }

        let mut matrix = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (row, component) in components.iter().enumerate() {
            let (coefficients, shift) = parse_component(component).map_err(|reason| {
                ReflkitError::MalformedSymmetryCode {
                    code: code.to_string(),
                    reason,
                }
            })?;
            for col in 0..3 {
                matrix[(row, col)] = coefficients[col];
            }
            translation[row] = shift;
        }

        Ok(Self::new(matrix, translation))
    }

    /// 格式化为 Jones 符号三联码
    pub fn to_code(&self) -> String {
        let vars = ['x', 'y', 'z'];
        let mut parts = Vec::with_capacity(3);
        for row in 0..3 {
            let mut s = String::new();
            for col in 0..3 {
                let coef = self.matrix[(row, col)];
                if coef.abs() < EQ_TOL {
                    continue;
                }
                if coef > 0.0 && !s.is_empty() {
                    s.push('+');
                } else if coef < 0.0 {
                    s.push('-');
                }
                if (coef.abs() - 1.0).abs() > EQ_TOL {
                    s.push_str(&format_fraction(coef.abs()));
                }
                s.push(vars[col]);
            }
            let t = self.translation[row];
            if t.abs() > EQ_TOL {
                if t > 0.0 && !s.is_empty() {
                    s.push('+');
                } else if t < 0.0 {
                    s.push('-');
                }
                s.push_str(&format_fraction(t.abs()));
            }
            if s.is_empty() {
                s.push('0');
            }
            parts.push(s);
        }
        parts.join(",")
    }

    /// 线性部分
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// 平移部分
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// 复合：(L1,t1)∘(L2,t2) = (L1·L2, L1·t2 + t1)
    pub fn compose(&self, other: &SymmOp) -> SymmOp {
        SymmOp::new(
            self.matrix * other.matrix,
            self.matrix * other.translation + self.translation,
        )
    }

    /// 逆操作 (L,t)⁻¹ = (L⁻¹, -L⁻¹·t)
    pub fn inverse(&self) -> Result<SymmOp> {
        let inv = self
            .matrix
            .try_inverse()
            .ok_or(ReflkitError::SingularMatrix)?;
        Ok(SymmOp::new(inv, -(inv * self.translation)))
    }

    /// 乘幂：重复复合；n = 0 为恒等，负数经由逆操作
    pub fn power(&self, n: i32) -> Result<SymmOp> {
        let base = if n < 0 { self.inverse()? } else { self.clone() };
        let mut acc = SymmOp::identity();
        for _ in 0..n.unsigned_abs() {
            acc = acc.compose(&base);
        }
        Ok(acc)
    }

    /// 平移逐分量模 1 归约到 [0, 1)
    ///
    /// 闭包比较之前必须归约，使相差一个格矢平移的空间群操作
    /// 在点群意义下被识别为相等。
    pub fn reduce_translation(&self) -> SymmOp {
        let mut t = self.translation.map(|x| x.rem_euclid(1.0));
        // 1-ε 一类的残余归零
        for i in 0..3 {
            if (t[i] - 1.0).abs() < EQ_TOL {
                t[i] = 0.0;
            }
        }
        SymmOp::new(self.matrix, t)
    }

    /// 仅用线性部分作用于整数指数
    pub fn apply_to_index(&self, h: i32, k: i32, l: i32) -> (i32, i32, i32) {
        let v = self.matrix * Vector3::new(h as f64, k as f64, l as f64);
        (
            v.x.round() as i32,
            v.y.round() as i32,
            v.z.round() as i32,
        )
    }

    /// 完整仿射作用：L·v + t
    pub fn apply_to_vector(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.matrix * v + self.translation
    }

    /// 行列式（晶体学操作为 ±1）
    pub fn det(&self) -> f64 {
        self.matrix.determinant()
    }

    /// 迹
    pub fn trace(&self) -> f64 {
        self.matrix.trace()
    }

    /// 操作的重数：最小正整数 f 使 (det·L)^f = I
    ///
    /// 晶体学操作的重数取值 {1, 2, 3, 4, 6}；其余情况报错。
    pub fn fold(&self) -> Result<usize> {
        let proper = self.matrix * self.det().signum();
        let mut acc = Matrix3::identity();
        for f in 1..=6usize {
            acc *= proper;
            if matrix_close(&acc, &Matrix3::identity()) {
                return if f == 5 {
                    Err(ReflkitError::NonCrystallographicFold)
                } else {
                    Ok(f)
                };
            }
        }
        Err(ReflkitError::NonCrystallographicFold)
    }

    /// 滑移矢量：一个完整重数周期内累积的平移除以重数
    pub fn glide(&self) -> Result<Vector3<f64>> {
        let f = self.fold()?;
        let cycle = self.power(f as i32)?;
        Ok(cycle.translation / f as f64)
    }

    /// 几何取向：线性部分的不变本征方向（单位矢量）
    ///
    /// 旋转给出旋转轴，反映/旋转反演给出镜面法线（经由 -L）。
    /// 恒等与反演没有唯一取向，返回 None。
    pub fn orientation(&self) -> Option<Vector3<f64>> {
        let proper = self.matrix * self.det().signum();
        let shifted = proper - Matrix3::identity();

        // 核空间方向：取 (M−I) 两行叉积中模最大者
        let rows: Vec<Vector3<f64>> = (0..3)
            .map(|i| shifted.row(i).transpose())
            .collect();
        let mut best = Vector3::zeros();
        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            let candidate = rows[i].cross(&rows[j]);
            if candidate.norm() > best.norm() {
                best = candidate;
            }
        }
        if best.norm() < EQ_TOL {
            return None;
        }

        let mut axis = best / best.norm();
        // 符号约定：首个非零分量取正
        for i in 0..3 {
            if axis[i].abs() > EQ_TOL {
                if axis[i] < 0.0 {
                    axis = -axis;
                }
                break;
            }
        }
        Some(axis)
    }

    /// 倒易对偶操作 (L⁻¹)ᵀ（平移被丢弃）
    ///
    /// 用于把正空间对称操作映射为倒空间指数变换。
    pub fn reciprocal(&self) -> Result<SymmOp> {
        let inv = self
            .matrix
            .try_inverse()
            .ok_or(ReflkitError::SingularMatrix)?;
        Ok(SymmOp::linear(inv.transpose()))
    }

    /// 操作的几何分类
    ///
    /// 行列式区分手性，迹区分重数，滑移分量区分是否含平移。
    pub fn kind(&self) -> Result<OperationKind> {
        let det = self.det();
        let tr = self.trace();
        let glide = self.glide()?;
        let has_glide = glide.norm() > EQ_TOL;

        Ok(if det > 0.0 {
            if (tr - 3.0).abs() < EQ_TOL {
                if self.reduce_translation().translation.norm() > EQ_TOL {
                    OperationKind::Translation
                } else {
                    OperationKind::Identity
                }
            } else if has_glide {
                OperationKind::Rototranslation
            } else {
                OperationKind::Rotation
            }
        } else if (tr + 3.0).abs() < EQ_TOL {
            OperationKind::Inversion
        } else if (tr - 1.0).abs() < EQ_TOL {
            if has_glide {
                OperationKind::Transflection
            } else {
                OperationKind::Reflection
            }
        } else {
            OperationKind::Rotoinversion
        })
    }

    /// 4×4 仿射嵌入矩阵
    pub fn affine_matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        for row in 0..3 {
            for col in 0..3 {
                m[(row, col)] = self.matrix[(row, col)];
            }
            m[(row, 3)] = self.translation[row];
        }
        m
    }
}

/// 相等性：4×4 仿射嵌入在容差内逐元素接近
impl PartialEq for SymmOp {
    fn eq(&self, other: &Self) -> bool {
        matrix_close(&self.matrix, &other.matrix)
            && (self.translation - other.translation).amax() < EQ_TOL
    }
}

fn matrix_close(a: &Matrix3<f64>, b: &Matrix3<f64>) -> bool {
    (a - b).amax() < EQ_TOL
}

/// 解析单个坐标分量（如 `x-y+1/2`）为系数行与平移量
fn parse_component(component: &str) -> std::result::Result<([f64; 3], f64), String> {
    use regex::Regex;

    let trimmed: String = component.chars().filter(|c| !c.is_whitespace()).collect();
    if trimmed.is_empty() {
        return Err("empty component".to_string());
    }

    // 按符号拆分为带符号项
    let mut terms: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in trimmed.chars() {
        if (ch == '+' || ch == '-') && !current.is_empty() {
            terms.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    terms.push(current);

    let term_re = Regex::new(r"^([+-]?)(\d+/\d+|\d+\.\d+|\d+)?\*?([xyz])?$").unwrap();

    let mut coefficients = [0.0_f64; 3];
    let mut shift = 0.0_f64;
    for term in &terms {
        let caps = term_re
            .captures(term)
            .ok_or_else(|| format!("unrecognized term '{term}'"))?;

        let sign = if caps.get(1).map(|m| m.as_str()) == Some("-") {
            -1.0
        } else {
            1.0
        };
        let magnitude = match caps.get(2) {
            Some(m) => parse_number(m.as_str())?,
            None => 1.0,
        };
        match caps.get(3).map(|m| m.as_str()) {
            Some("x") => coefficients[0] += sign * magnitude,
            Some("y") => coefficients[1] += sign * magnitude,
            Some("z") => coefficients[2] += sign * magnitude,
            _ => {
                if caps.get(2).is_none() {
                    return Err(format!("unrecognized term '{term}'"));
                }
                shift += sign * magnitude;
            }
        }
    }
    Ok((coefficients, shift))
}

/// 解析数字：整数、小数或 `p/q` 分数
fn parse_number(s: &str) -> std::result::Result<f64, String> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().map_err(|_| format!("bad numerator in '{s}'"))?;
        let den: f64 = den.parse().map_err(|_| format!("bad denominator in '{s}'"))?;
        if den == 0.0 {
            return Err(format!("zero denominator in '{s}'"));
        }
        Ok(num / den)
    } else {
        s.parse().map_err(|_| format!("bad number '{s}'"))
    }
}

/// 把数值格式化为整数或常见晶体学分数
fn format_fraction(value: f64) -> String {
    if (value - value.round()).abs() < EQ_TOL {
        return format!("{}", value.round() as i64);
    }
    for den in [2_i64, 3, 4, 6] {
        let num = value * den as f64;
        if (num - num.round()).abs() < EQ_TOL {
            return format!("{}/{}", num.round() as i64, den);
        }
    }
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identity() {
        let op = SymmOp::from_code("x,y,z").unwrap();
        assert_eq!(op, SymmOp::identity());
        assert_eq!(op.kind().unwrap(), OperationKind::Identity);
    }

    #[test]
    fn test_parse_trigonal_rotation() {
        let op = SymmOp::from_code("-y,x-y,z").unwrap();
        assert_eq!(op.fold().unwrap(), 3);
        assert!((op.det() - 1.0).abs() < 1e-9);
        assert_eq!(op.kind().unwrap(), OperationKind::Rotation);
    }

    #[test]
    fn test_parse_screw_axis() {
        // 2₁ 螺旋轴沿 z
        let op = SymmOp::from_code("-x,-y,z+1/2").unwrap();
        assert_eq!(op.fold().unwrap(), 2);
        let glide = op.glide().unwrap();
        assert!((glide.z - 0.5).abs() < 1e-9);
        assert_eq!(op.kind().unwrap(), OperationKind::Rototranslation);
    }

    #[test]
    fn test_parse_glide_plane() {
        // c 滑移面垂直于 b
        let op = SymmOp::from_code("x,-y,z+0.5").unwrap();
        assert_eq!(op.kind().unwrap(), OperationKind::Transflection);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(SymmOp::from_code("x,y").is_err());
        assert!(SymmOp::from_code("x,y,w").is_err());
        assert!(SymmOp::from_code("x,y,z+").is_err());
        assert!(SymmOp::from_code("x,1/0,z").is_err());
    }

    #[test]
    fn test_code_round_trip() {
        for code in ["x,y,z", "-y,x-y,z", "-x,-y,z+1/2", "y,-x,-z", "-x,-y,-z"] {
            let op = SymmOp::from_code(code).unwrap();
            let reparsed = SymmOp::from_code(&op.to_code()).unwrap();
            assert_eq!(op, reparsed, "round trip failed for '{code}'");
        }
    }

    #[test]
    fn test_compose_associative() {
        let a = SymmOp::from_code("-y,x,z+1/4").unwrap();
        let b = SymmOp::from_code("x,-y,z+1/2").unwrap();
        let c = SymmOp::from_code("-x,-y,-z").unwrap();

        let left = a.compose(&b).compose(&c).reduce_translation();
        let right = a.compose(&b.compose(&c)).reduce_translation();
        assert_eq!(left, right);
    }

    #[test]
    fn test_power_and_inverse() {
        let op = SymmOp::from_code("-y,x,z").unwrap();
        assert_eq!(op.power(4).unwrap(), SymmOp::identity());
        assert_eq!(op.power(0).unwrap(), SymmOp::identity());
        assert_eq!(op.power(-1).unwrap(), op.power(3).unwrap());
        assert_eq!(op.compose(&op.inverse().unwrap()), SymmOp::identity());
    }

    #[test]
    fn test_reduce_translation() {
        let op = SymmOp::new(Matrix3::identity(), Vector3::new(1.5, -0.25, 3.0));
        let reduced = op.reduce_translation();
        assert!((reduced.translation().x - 0.5).abs() < 1e-9);
        assert!((reduced.translation().y - 0.75).abs() < 1e-9);
        assert!(reduced.translation().z.abs() < 1e-9);
    }

    #[test]
    fn test_apply_to_index() {
        let op = SymmOp::from_code("-y,x,z").unwrap();
        assert_eq!(op.apply_to_index(1, 2, 3), (-2, 1, 3));
    }

    #[test]
    fn test_orientation_axis() {
        let c4z = SymmOp::from_code("-y,x,z").unwrap();
        let axis = c4z.orientation().unwrap();
        assert!(axis.x.abs() < 1e-9);
        assert!(axis.y.abs() < 1e-9);
        assert!((axis.z - 1.0).abs() < 1e-9);

        // 镜面 x,-y,z 的法线沿 y
        let mirror = SymmOp::from_code("x,-y,z").unwrap();
        let normal = mirror.orientation().unwrap();
        assert!((normal.y.abs() - 1.0).abs() < 1e-9);

        assert!(SymmOp::identity().orientation().is_none());
        assert!(SymmOp::inversion().orientation().is_none());
    }

    #[test]
    fn test_kind_classification() {
        let cases = [
            ("x,y,z", OperationKind::Identity),
            ("-x,-y,-z", OperationKind::Inversion),
            ("-y,x,z", OperationKind::Rotation),
            ("-x,-y,z+1/2", OperationKind::Rototranslation),
            ("x,-y,z", OperationKind::Reflection),
            ("x,-y,z+1/2", OperationKind::Transflection),
            ("y,-x,-z", OperationKind::Rotoinversion),
        ];
        for (code, expected) in cases {
            let op = SymmOp::from_code(code).unwrap();
            assert_eq!(op.kind().unwrap(), expected, "kind mismatch for '{code}'");
        }
    }

    #[test]
    fn test_pure_translation_kind() {
        let op = SymmOp::new(Matrix3::identity(), Vector3::new(0.5, 0.5, 0.0));
        assert_eq!(op.kind().unwrap(), OperationKind::Translation);
    }

    #[test]
    fn test_reciprocal_dual() {
        // 六方 C3 的倒易对偶作用于指数仍为 3 重
        let op = SymmOp::from_code("-y,x-y,z").unwrap();
        let dual = op.reciprocal().unwrap();
        assert_eq!(dual.fold().unwrap(), 3);
        assert!(dual.translation().norm() < 1e-12);

        // 正交矩阵的对偶是其自身
        let c4 = SymmOp::from_code("-y,x,z").unwrap();
        assert_eq!(c4.reciprocal().unwrap(), c4);
    }

    #[test]
    fn test_non_crystallographic_fold() {
        // 绕 z 转 1 弧度不是晶体学操作
        let (s, c) = 1.0_f64.sin_cos();
        let op = SymmOp::linear(Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0));
        assert!(matches!(
            op.fold(),
            Err(ReflkitError::NonCrystallographicFold)
        ));
    }
}
