//! GSUB 表的 otfcc JSON 模型。
//!
//! 只建模本项目会生成的部分：单替换、多选一替换、上下文替换。
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `features` 中两个特性的名字。
pub const AALT_FEATURE: &str = "aalt_00000";
pub const AALT_FEATURE_ALTERNATE: &str = "aalt_00001";
pub const RCLT_FEATURE: &str = "rclt_00000";
pub const RCLT_FEATURE_SECONDARY: &str = "rclt_00001";

/// 单音字强制替换到 `ss00`。
pub const AALT_SINGLE_LOOKUP: &str = "lookup_aalt_0";
/// 多音字可选 `ss00` 及各读音。
pub const AALT_ALTERNATE_LOOKUP: &str = "lookup_aalt_1";

/// 语言系统：`DFLT_DFLT` 与 `hani_DFLT`。
pub const LANGUAGES: [&str; 2] = ["DFLT_DFLT", "hani_DFLT"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gsub {
    pub languages: BTreeMap<String, LanguageRecord>,
    pub features: BTreeMap<String, Vec<String>>,
    pub lookups: BTreeMap<String, Lookup>,
    #[serde(rename = "lookupOrder")]
    pub lookup_order: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub features: Vec<String>,
}

/// 查找表标志；不使用任何标志，输出空对象。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Lookup {
    #[serde(rename = "gsub_single")]
    Single {
        flags: Flags,
        subtables: Vec<BTreeMap<String, String>>,
    },
    #[serde(rename = "gsub_alternate")]
    Alternate {
        flags: Flags,
        subtables: Vec<BTreeMap<String, Vec<String>>>,
    },
    #[serde(rename = "gsub_chaining")]
    Chaining {
        flags: Flags,
        subtables: Vec<ChainingRule>,
    },
}

impl Lookup {
    pub fn single(map: BTreeMap<String, String>) -> Self {
        Lookup::Single {
            flags: Flags {},
            subtables: vec![map],
        }
    }

    pub fn alternate(map: BTreeMap<String, Vec<String>>) -> Self {
        Lookup::Alternate {
            flags: Flags {},
            subtables: vec![map],
        }
    }

    pub fn chaining(rules: Vec<ChainingRule>) -> Self {
        Lookup::Chaining {
            flags: Flags {},
            subtables: rules,
        }
    }
}

/// 一条上下文替换规则。
///
/// `match` 的每一项是该位置可接受的字形集合；`[input_begins, input_ends)` 是输入段，
/// 其余为前后文。`apply` 为空表示匹配后什么都不做，用来抢先吃掉某个上下文。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainingRule {
    #[serde(rename = "match")]
    pub r#match: Vec<Vec<String>>,
    pub apply: Vec<Apply>,
    #[serde(rename = "inputBegins")]
    pub input_begins: usize,
    #[serde(rename = "inputEnds")]
    pub input_ends: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apply {
    pub at: usize,
    pub lookup: String,
}

impl ChainingRule {
    /// 输入段非空且落在 `match` 内，所有 `apply` 都落在输入段内。
    pub fn is_well_formed(&self) -> bool {
        self.input_begins < self.input_ends
            && self.input_ends <= self.r#match.len()
            && self
                .apply
                .iter()
                .all(|a| (self.input_begins..self.input_ends).contains(&a.at))
            && self.r#match.iter().all(|set| !set.is_empty())
    }
}
