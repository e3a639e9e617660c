//! 例外表：自动编译表达不了的词，手工书写。
//!
//! 与 `pattern_two` 同形，另加一个 `ignore`：在这个上下文里规则不得生效。
//! 例如 `着手`（zhuó shǒu）在 `背着手`（bèi zhe shǒu）中不成立，写作 `"背 着' 手"`，
//! `'` 标在目标字之后。
use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CompileError, Result},
    phrase_map::PhraseMap,
    pattern_two::{LookupTable, PositionSlot},
    slot::{Layer, LookupSlot, VariantName},
};

/// 目标标记。
pub const TARGET_MARK: char = '\'';

/// 解析后的 ignore 上下文：字序列 + 目标位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreContext {
    pub chars: Vec<char>,
    pub target: usize,
}

impl FromStr for IgnoreContext {
    type Err = CompileError;

    /// 空白被忽略；必须恰好有一个 `'`，且紧跟在某个字之后。
    fn from_str(s: &str) -> Result<Self> {
        let error = |reason: &str| CompileError::AuthoringError {
            context: s.to_owned(),
            reason: reason.to_owned(),
        };
        let mut chars = Vec::new();
        let mut targets = Vec::new();
        for c in s.chars() {
            if c.is_whitespace() {
                continue;
            }
            if c == TARGET_MARK {
                if chars.is_empty() {
                    return Err(error("标记前没有字"));
                }
                targets.push(chars.len() - 1);
            } else {
                chars.push(c);
            }
        }
        match targets.as_slice() {
            [target] => Ok(Self {
                chars,
                target: *target,
            }),
            [] => Err(error("没有标记目标字")),
            _ => Err(error("目标字只能有一个")),
        }
    }
}

impl fmt::Display for IgnoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.chars.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{c}")?;
            if i == self.target {
                write!(f, "{TARGET_MARK}")?;
            }
        }
        Ok(())
    }
}

/// 例外表中的一个词。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionalPhrase {
    /// 原样保存，校验时再解析，以便报告 `AuthoringError`
    pub ignore: Option<String>,
    pub pattern: Vec<PositionSlot>,
}

impl ExceptionalPhrase {
    pub fn ignore_context(&self) -> Result<Option<IgnoreContext>> {
        self.ignore.as_deref().map(str::parse).transpose()
    }
}

/// 例外表。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionalTable {
    pub lookup_table: LookupTable,
    pub patterns: PhraseMap<ExceptionalPhrase>,
}

impl ExceptionalTable {
    /// 内置的手写例外。
    ///
    /// - 着手：zhuó/shǒu，但 背着手：bèi/zhe/shǒu
    /// - 轴子：zhóu/zi 是标准读音，大轴子、压轴子读 zhòu，不需要 ignore
    pub fn builtin() -> Self {
        let slot = LookupSlot::first(Layer::Exceptional);
        let lookup_table = BTreeMap::from([(
            slot,
            BTreeMap::from([
                ('着', VariantName::for_slot('着', slot)),
                ('轴', VariantName::for_slot('轴', slot)),
            ]),
        )]);

        let at = |character: char, fires: bool| PositionSlot {
            character,
            slot: fires.then_some(slot),
        };
        let mut patterns = PhraseMap::new();
        patterns.insert(
            "着手",
            ExceptionalPhrase {
                ignore: Some("背 着' 手".to_owned()),
                pattern: vec![at('着', true), at('手', false)],
            },
        );
        for (phrase, first) in [("大轴子", '大'), ("压轴子", '压')] {
            patterns.insert(
                phrase,
                ExceptionalPhrase {
                    ignore: None,
                    pattern: vec![at(first, false), at('轴', true), at('子', false)],
                },
            );
        }
        Self {
            lookup_table,
            patterns,
        }
    }

    /// 校验整张表：
    /// - 查找表的槽必须属于例外层，变体名的字与键一致
    /// - 每个词的位置序列与词本身逐字一致，且至少有一个替换位置
    /// - 引用的槽在查找表中登记了该字
    /// - ignore 上下文恰好标记一个目标字，上下文包含该词，且目标字落在该词的第一个替换位置
    pub fn validate(&self) -> Result<()> {
        for (slot, entries) in &self.lookup_table {
            if slot.layer() != Layer::Exceptional {
                return Err(authoring(slot.to_string(), "查找表不属于例外层"));
            }
            if let Some((c, v)) = entries.iter().find(|(c, v)| **c != v.character) {
                return Err(authoring(format!("{c}: {v}"), "变体名与字不一致"));
            }
        }
        for (phrase, entry) in self.patterns.iter() {
            let chars: Vec<char> = entry.pattern.iter().map(|p| p.character).collect();
            if !phrase.chars().eq(chars.iter().copied()) {
                return Err(authoring(phrase.to_owned(), "位置序列与词不一致"));
            }
            if entry.pattern.iter().all(|p| p.slot.is_none()) {
                return Err(authoring(phrase.to_owned(), "没有需要替换的位置"));
            }
            for p in &entry.pattern {
                let Some(slot) = p.slot else { continue };
                let registered = self
                    .lookup_table
                    .get(&slot)
                    .is_some_and(|m| m.contains_key(&p.character));
                if !registered {
                    return Err(authoring(
                        format!("{phrase}: {} -> {slot}", p.character),
                        "查找表中没有登记",
                    ));
                }
            }
            if let Some(ignore) = entry.ignore_context()? {
                let first = entry.pattern.iter().position(|p| p.slot.is_some());
                let covers = first
                    .and_then(|first| ignore.target.checked_sub(first))
                    .is_some_and(|k| ignore.chars[k..].starts_with(&chars));
                if !covers {
                    return Err(authoring(
                        format!("{phrase}: {ignore}"),
                        "ignore 上下文的目标字不是该词的第一个替换位置",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn authoring(context: String, reason: &str) -> CompileError {
    CompileError::AuthoringError {
        context,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ignore_context() {
        let ctx: IgnoreContext = "背 着' 手".parse().unwrap();
        assert_eq!(ctx.chars, ['背', '着', '手']);
        assert_eq!(ctx.target, 1);
        assert_eq!(ctx.to_string(), "背 着' 手");
        // 空白可省略
        assert_eq!("背着'手".parse::<IgnoreContext>().unwrap(), ctx);
    }

    #[test]
    fn ignore_context_needs_exactly_one_target() {
        for bad in ["背 着 手", "背' 着' 手", "' 背 着 手"] {
            assert!(
                matches!(bad.parse::<IgnoreContext>(), Err(CompileError::AuthoringError { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn builtin_table_is_valid() {
        let table = ExceptionalTable::builtin();
        table.validate().unwrap();
        let names: Vec<&str> = table.patterns.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["着手", "大轴子", "压轴子"]);
    }

    #[test]
    fn builtin_json_shape() {
        let json = serde_json::to_value(ExceptionalTable::builtin()).unwrap();
        assert_eq!(json["lookup_table"]["lookup_pattern_20"]["着"], "着.ss02");
        assert_eq!(json["patterns"]["着手"]["ignore"], "背 着' 手");
        assert_eq!(
            json["patterns"]["大轴子"]["pattern"],
            serde_json::json!([{ "大": null }, { "轴": "lookup_pattern_20" }, { "子": null }])
        );
        assert!(json["patterns"]["压轴子"]["ignore"].is_null());
    }

    #[test]
    fn validate_reports_bad_ignore() {
        let mut table = ExceptionalTable::builtin();
        let mut entry = table.patterns.get("着手").cloned().unwrap();
        entry.ignore = Some("背 着 手".to_owned());
        table.patterns.insert("着手", entry);
        assert!(matches!(table.validate(), Err(CompileError::AuthoringError { .. })));
    }

    #[test]
    fn ignore_target_must_land_on_the_phrase() {
        for ignore in ["背' 着 手", "跑 去' 了", "着 手'", "背 着'"] {
            let mut table = ExceptionalTable::builtin();
            let mut entry = table.patterns.get("着手").cloned().unwrap();
            entry.ignore = Some(ignore.to_owned());
            table.patterns.insert("着手", entry);
            assert!(
                matches!(table.validate(), Err(CompileError::AuthoringError { .. })),
                "{ignore}"
            );
        }
    }

    #[test]
    fn ignore_may_extend_on_both_sides() {
        let mut table = ExceptionalTable::builtin();
        let mut entry = table.patterns.get("着手").cloned().unwrap();
        entry.ignore = Some("背 着' 手 走".to_owned());
        table.patterns.insert("着手", entry);
        table.validate().unwrap();
    }

    #[test]
    fn validate_reports_unregistered_slot() {
        let mut table = ExceptionalTable::builtin();
        table.lookup_table.clear();
        assert!(table.validate().is_err());
    }
}
