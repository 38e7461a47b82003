//! # 系统消光过滤
//!
//! 消光规则形如 `域: 条件`，两个关于 (h,k,l) 的独立谓词：
//! 域选出倒空间子集（轴、面、对角面或全空间），条件是
//! h,k,l 线性组合上的模算术谓词。域内不满足条件的反射
//! 是对称禁戒的种子，经群作用展开后整体删除。
//!
//! ## 支持的域码
//! `hkl` `h00` `0k0` `00l` `hk0` `h0l` `0kl` `hhl` `h-hl` `hh0`
//!
//! ## 支持的条件码
//! `<线性组合>=<m>n` 的逗号合取，如 `h=2n`、`h+k=2n`、
//! `2h+l=4n`、`h-k=3n`。空条件表示域内无一幸存。
//!
//! ## 依赖关系
//! - 使用 `symmetry/group.rs` 与 `reflections/table.rs`
//! - 使用 `error.rs`

use crate::error::{ReflkitError, Result};
use crate::reflections::{ReflKey, ReflectionTable};
use crate::symmetry::Group;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 消光规则的域：倒空间子集的闭合枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    /// 全空间
    All,
    /// h00 轴
    AxisH,
    /// 0k0 轴
    AxisK,
    /// 00l 轴
    AxisL,
    /// hk0 面
    PlaneHk0,
    /// h0l 面
    PlaneH0l,
    /// 0kl 面
    Plane0kl,
    /// hhl 对角面
    DiagonalHhl,
    /// h-hl 对角面
    DiagonalHmhl,
    /// hh0 对角轴
    DiagonalHh0,
}

impl Domain {
    /// 解析域码；不可识别的码立即报错
    pub fn parse(code: &str) -> Result<Domain> {
        Ok(match code.trim() {
            "hkl" => Domain::All,
            "h00" => Domain::AxisH,
            "0k0" => Domain::AxisK,
            "00l" => Domain::AxisL,
            "hk0" => Domain::PlaneHk0,
            "h0l" => Domain::PlaneH0l,
            "0kl" => Domain::Plane0kl,
            "hhl" => Domain::DiagonalHhl,
            "h-hl" => Domain::DiagonalHmhl,
            "hh0" => Domain::DiagonalHh0,
            other => {
                return Err(ReflkitError::UnknownDomainCode {
                    code: other.to_string(),
                })
            }
        })
    }

    /// 单条反射是否落在域内
    pub fn contains(&self, h: i32, k: i32, l: i32) -> bool {
        match self {
            Domain::All => true,
            Domain::AxisH => k == 0 && l == 0,
            Domain::AxisK => h == 0 && l == 0,
            Domain::AxisL => h == 0 && k == 0,
            Domain::PlaneHk0 => l == 0,
            Domain::PlaneH0l => k == 0,
            Domain::Plane0kl => h == 0,
            Domain::DiagonalHhl => h == k,
            Domain::DiagonalHmhl => h == -k,
            Domain::DiagonalHh0 => h == k && l == 0,
        }
    }
}

/// 单个模算术谓词：c_h·h + c_k·k + c_l·l ≡ 0 (mod m)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ConditionTerm {
    ch: i32,
    ck: i32,
    cl: i32,
    modulus: i32,
}

impl ConditionTerm {
    fn satisfied(&self, h: i32, k: i32, l: i32) -> bool {
        (self.ch * h + self.ck * k + self.cl * l).rem_euclid(self.modulus) == 0
    }
}

/// 条件：若干模算术谓词的合取
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    terms: Vec<ConditionTerm>,
}

impl Condition {
    /// 解析条件码（逗号分隔的合取）
    pub fn parse(code: &str) -> Result<Condition> {
        let mut terms = Vec::new();
        for part in code.split(',') {
            terms.push(parse_term(part.trim())?);
        }
        Ok(Condition { terms })
    }

    /// 单条反射是否满足条件（即不被消光）
    pub fn satisfied(&self, h: i32, k: i32, l: i32) -> bool {
        self.terms.iter().all(|t| t.satisfied(h, k, l))
    }
}

/// 解析单个谓词，如 `h+k=2n` 或 `2h+l=4n`
fn parse_term(code: &str) -> Result<ConditionTerm> {
    use regex::Regex;

    let err = || ReflkitError::UnknownConditionCode {
        code: code.to_string(),
    };

    let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    let (lhs, rhs) = compact.split_once('=').ok_or_else(err)?;

    // 右侧：模数 + 字面 n
    let modulus_re = Regex::new(r"^(\d+)n$").unwrap();
    let modulus: i32 = modulus_re
        .captures(rhs)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(err)?;
    if modulus == 0 {
        return Err(err());
    }

    // 左侧：h,k,l 的带符号整系数线性组合
    let term_re = Regex::new(r"^([+-]?)(\d*)([hkl])$").unwrap();
    let mut coefficients = (0, 0, 0);
    let mut current = String::new();
    let mut chunks: Vec<String> = Vec::new();
    for ch in lhs.chars() {
        if (ch == '+' || ch == '-') && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if current.is_empty() {
        return Err(err());
    }
    chunks.push(current);

    for chunk in &chunks {
        let caps = term_re.captures(chunk).ok_or_else(err)?;
        let sign = if &caps[1] == "-" { -1 } else { 1 };
        let magnitude: i32 = if caps[2].is_empty() {
            1
        } else {
            caps[2].parse().map_err(|_| err())?
        };
        let coefficient = sign * magnitude;
        match &caps[3] {
            "h" => coefficients.0 += coefficient,
            "k" => coefficients.1 += coefficient,
            _ => coefficients.2 += coefficient,
        }
    }

    Ok(ConditionTerm {
        ch: coefficients.0,
        ck: coefficients.1,
        cl: coefficients.2,
        modulus,
    })
}

/// 消光规则：域 + 可选条件
///
/// 条件为 None（规则里冒号后为空）表示域内全部消光。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtinctionRule {
    pub domain: Domain,
    pub condition: Option<Condition>,
}

impl ExtinctionRule {
    /// 解析 `域: 条件` 形式的规则文本
    pub fn parse(rule: &str) -> Result<ExtinctionRule> {
        let (domain_code, condition_code) =
            rule.split_once(':')
                .ok_or_else(|| ReflkitError::InvalidArgument(format!(
                    "extinction rule must be 'domain: condition', got '{rule}'"
                )))?;

        let domain = Domain::parse(domain_code)?;
        let condition_code = condition_code.trim();
        let condition = if condition_code.is_empty() {
            None
        } else {
            Some(Condition::parse(condition_code)?)
        };

        Ok(ExtinctionRule { domain, condition })
    }
}

/// 应用消光规则，返回删除的行数
///
/// 种子 = 域内且不满足条件的反射；种子指数集合经群的全部
/// 操作展开（消光按对称等效闭合识别，而非字面匹配），命中
/// 展开集合的行全部删除。单次调用即达不动点：对自身输出
/// 重跑同一规则不再删除任何行。
pub fn extinct(
    table: &mut ReflectionTable,
    rule: &ExtinctionRule,
    group: &Group,
) -> Result<usize> {
    let hs = table.int_column(ReflKey::H)?;
    let ks = table.int_column(ReflKey::K)?;
    let ls = table.int_column(ReflKey::L)?;
    let n = table.len();

    let mut forbidden: HashSet<[i32; 3]> = HashSet::new();
    for i in 0..n {
        let (h, k, l) = (hs[i], ks[i], ls[i]);
        if !rule.domain.contains(h, k, l) {
            continue;
        }
        let survives = rule
            .condition
            .as_ref()
            .map(|c| c.satisfied(h, k, l))
            .unwrap_or(false);
        if survives {
            continue;
        }
        for op in group.operations() {
            let (h2, k2, l2) = op.apply_to_index(h, k, l);
            forbidden.insert([h2, k2, l2]);
        }
    }

    let mask: Vec<bool> = (0..n)
        .map(|i| !forbidden.contains(&[hs[i], ks[i], ls[i]]))
        .collect();
    let removed = mask.iter().filter(|&&keep| !keep).count();
    table.retain(&mask)?;
    Ok(removed)
}
