//! # 晶体学点群目录
//!
//! 32 个晶体学点群：Hermann–Mauguin 符号 → 生成元三联码。
//! 生成元取 International Tables 标准设置（三方/六方系用
//! 六方轴）；完整操作集合由 `Group::new` 闭包生成。
//!
//! ## 依赖关系
//! - 使用 `symmetry/group.rs` 与 `symmetry/operation.rs`
//! - 纯静态数据，无外部依赖

use crate::error::{ReflkitError, Result};
use crate::symmetry::group::Group;

/// 点群生成元表（符号按晶系排列）
const POINT_GROUP_GENERATORS: &[(&str, &[&str])] = &[
    // 三斜
    ("1", &["x,y,z"]),
    ("-1", &["-x,-y,-z"]),
    // 单斜（b 轴设置）
    ("2", &["-x,y,-z"]),
    ("m", &["x,-y,z"]),
    ("2/m", &["-x,y,-z", "-x,-y,-z"]),
    // 正交
    ("222", &["-x,-y,z", "x,-y,-z"]),
    ("mm2", &["-x,-y,z", "x,-y,z"]),
    ("mmm", &["-x,-y,z", "x,-y,-z", "-x,-y,-z"]),
    // 四方
    ("4", &["-y,x,z"]),
    ("-4", &["y,-x,-z"]),
    ("4/m", &["-y,x,z", "-x,-y,-z"]),
    ("422", &["-y,x,z", "x,-y,-z"]),
    ("4mm", &["-y,x,z", "x,-y,z"]),
    ("-42m", &["y,-x,-z", "x,-y,-z"]),
    ("4/mmm", &["-y,x,z", "x,-y,-z", "-x,-y,-z"]),
    // 三方（六方轴）
    ("3", &["-y,x-y,z"]),
    ("-3", &["y,-x+y,-z"]),
    ("32", &["-y,x-y,z", "x-y,-y,-z"]),
    ("3m", &["-y,x-y,z", "-x+y,y,z"]),
    ("-3m", &["y,-x+y,-z", "x-y,-y,-z"]),
    // 六方
    ("6", &["x-y,x,z"]),
    ("-6", &["-x+y,-x,-z"]),
    ("6/m", &["x-y,x,z", "-x,-y,-z"]),
    ("622", &["x-y,x,z", "x-y,-y,-z"]),
    ("6mm", &["x-y,x,z", "-x+y,y,z"]),
    ("-6m2", &["-x+y,-x,-z", "-x+y,y,z"]),
    ("6/mmm", &["x-y,x,z", "x-y,-y,-z", "-x,-y,-z"]),
    // 立方
    ("23", &["-x,-y,z", "z,x,y"]),
    ("m-3", &["-x,-y,z", "z,x,y", "-x,-y,-z"]),
    ("432", &["-y,x,z", "z,x,y"]),
    ("-43m", &["y,-x,-z", "z,x,y"]),
    ("m-3m", &["-y,x,z", "z,x,y", "-x,-y,-z"]),
];

/// 按 Hermann–Mauguin 符号构造点群
pub fn point_group(symbol: &str) -> Result<Group> {
    let codes = POINT_GROUP_GENERATORS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, codes)| *codes)
        .ok_or_else(|| ReflkitError::UnknownPointGroup {
            symbol: symbol.to_string(),
        })?;
    Group::from_codes(codes)
}

/// 全部收录的点群符号
pub fn known_symbols() -> Vec<&'static str> {
    POINT_GROUP_GENERATORS.iter().map(|(s, _)| *s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetry::group::CrystalSystem;

    #[test]
    fn test_textbook_orders() {
        // 教科书阶数，覆盖全部七个晶系
        let cases = [
            ("1", 1),
            ("-1", 2),
            ("2", 2),
            ("m", 2),
            ("2/m", 4),
            ("222", 4),
            ("mm2", 4),
            ("mmm", 8),
            ("4", 4),
            ("-4", 4),
            ("4/m", 8),
            ("422", 8),
            ("4mm", 8),
            ("-42m", 8),
            ("4/mmm", 16),
            ("3", 3),
            ("-3", 6),
            ("32", 6),
            ("3m", 6),
            ("-3m", 12),
            ("6", 6),
            ("-6", 6),
            ("6/m", 12),
            ("622", 12),
            ("6mm", 12),
            ("-6m2", 12),
            ("6/mmm", 24),
            ("23", 12),
            ("m-3", 24),
            ("432", 24),
            ("-43m", 24),
            ("m-3m", 48),
        ];
        for (symbol, order) in cases {
            let group = point_group(symbol).unwrap();
            assert_eq!(group.order(), order, "wrong order for '{symbol}'");
        }
    }

    #[test]
    fn test_systems() {
        let cases = [
            ("-1", CrystalSystem::Triclinic),
            ("2/m", CrystalSystem::Monoclinic),
            ("mmm", CrystalSystem::Orthorhombic),
            ("4/mmm", CrystalSystem::Tetragonal),
            ("-3m", CrystalSystem::Trigonal),
            ("6/mmm", CrystalSystem::Hexagonal),
            ("m-3m", CrystalSystem::Cubic),
        ];
        for (symbol, system) in cases {
            let group = point_group(symbol).unwrap();
            assert_eq!(group.system(), system, "wrong system for '{symbol}'");
        }
    }

    #[test]
    fn test_laue_classes() {
        // 点群劳厄化给出对应劳厄类的阶数
        assert_eq!(point_group("4").unwrap().lauefy().unwrap().order(), 8);
        assert_eq!(point_group("432").unwrap().lauefy().unwrap().order(), 48);
        assert_eq!(point_group("mmm").unwrap().lauefy().unwrap().order(), 8);
    }

    #[test]
    fn test_unknown_symbol() {
        assert!(matches!(
            point_group("5/m"),
            Err(ReflkitError::UnknownPointGroup { .. })
        ));
    }

    #[test]
    fn test_centrosymmetric_flags() {
        for symbol in ["-1", "2/m", "mmm", "4/m", "-3", "6/m", "m-3", "m-3m"] {
            assert!(
                point_group(symbol).unwrap().is_centrosymmetric(),
                "'{symbol}' should be centrosymmetric"
            );
        }
        for symbol in ["1", "2", "222", "4", "32", "6", "23", "432"] {
            assert!(
                !point_group(symbol).unwrap().is_centrosymmetric(),
                "'{symbol}' should not be centrosymmetric"
            );
        }
    }

    #[test]
    fn test_chirality_flags() {
        for symbol in ["1", "2", "222", "4", "422", "3", "32", "6", "622", "23", "432"] {
            assert!(
                point_group(symbol).unwrap().is_chiral(),
                "'{symbol}' should be chiral"
            );
        }
        assert!(!point_group("m").unwrap().is_chiral());
        assert!(!point_group("-43m").unwrap().is_chiral());
    }
}
