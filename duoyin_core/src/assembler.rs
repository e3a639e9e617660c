//! 规则合成：把三张模式表合成为一个 GSUB。
//!
//! - `lookup_aalt_0`：单音字 -> `ss00`
//! - `lookup_aalt_1`：多音字 -> `[ss00, ss01, ..]`
//! - `lookup_rclt_0`：单异读模式，按槽、行序输出
//! - `lookup_rclt_1`：多异读模式，每词一条
//! - `lookup_rclt_2`：例外，ignore 规则排在同一词的生效规则之前
//! - `lookup_pattern_XY`：各槽的单替换
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::{
    error::{CompileError, Result},
    exceptional::{ExceptionalPhrase, ExceptionalTable},
    glyph::{Cmap, GlyphOptions, max_variant_offset, variant_glyph_name},
    gsub::{
        AALT_ALTERNATE_LOOKUP, AALT_FEATURE, AALT_FEATURE_ALTERNATE, AALT_SINGLE_LOOKUP, Apply,
        ChainingRule, Gsub, LANGUAGES, LanguageRecord, Lookup, RCLT_FEATURE,
        RCLT_FEATURE_SECONDARY,
    },
    model::{PatternTemplate, TemplateShape},
    pattern_one::{PatternOneRule, PatternOneRules},
    pattern_two::{LookupTable, PatternTwoTable, PositionSlot},
    pronunciation::PronunciationTable,
    slot::{Layer, LookupSlot, WITHOUT_PRONUNCIATION},
};

/// GSUB 合成器。
pub struct RuleAssembler<'a, P: ?Sized> {
    table: &'a P,
    cmap: &'a Cmap,
    options: &'a GlyphOptions,
}

impl<'a, P> RuleAssembler<'a, P>
where
    P: PronunciationTable + ?Sized,
{
    pub fn new(table: &'a P, cmap: &'a Cmap, options: &'a GlyphOptions) -> Self {
        Self {
            table,
            cmap,
            options,
        }
    }

    /// 合成完整的 GSUB。任何错误都会中止，不产生部分结果。
    pub fn assemble(
        &self,
        pattern_one: &PatternOneRules,
        pattern_two: &PatternTwoTable,
        exceptional: &ExceptionalTable,
    ) -> Result<Gsub> {
        exceptional.validate()?;

        let mut lookups = BTreeMap::new();
        self.alternates(&mut lookups)?;

        let rclt_0 = self.pattern_one(pattern_one, &mut lookups)?;
        self.slot_lookups(Layer::PatternTwo, &pattern_two.lookup_table, &mut lookups)?;
        let mut rclt_1 = Vec::with_capacity(pattern_two.patterns.len());
        for (phrase, positions) in pattern_two.patterns.iter() {
            rclt_1.push(self.phrase_rule(
                Layer::PatternTwo,
                &pattern_two.lookup_table,
                phrase,
                positions,
            )?);
        }
        self.slot_lookups(Layer::Exceptional, &exceptional.lookup_table, &mut lookups)?;
        let mut rclt_2 = Vec::new();
        for (phrase, entry) in exceptional.patterns.iter() {
            rclt_2.extend(self.exceptional_rules(&exceptional.lookup_table, phrase, entry)?);
        }

        for (layer, rules) in Layer::ALL.into_iter().zip([rclt_0, rclt_1, rclt_2]) {
            debug!(layer = %layer, rules = rules.len(), "上下文规则");
            lookups.insert(layer.chaining_lookup_name(), Lookup::chaining(rules));
        }

        self.check_capacity(&lookups)?;
        let gsub = finish(lookups);
        info!(lookups = gsub.lookups.len(), "GSUB 合成完成");
        Ok(gsub)
    }

    fn glyph(&self, character: char) -> Result<&'a str> {
        self.cmap.glyph(character)
    }

    fn glyph_set(&self, character: char) -> Result<Vec<String>> {
        Ok(vec![self.glyph(character)?.to_owned()])
    }

    /// 逐字匹配 `chars`。
    fn match_chars(&self, chars: impl IntoIterator<Item = char>) -> Result<Vec<Vec<String>>> {
        chars.into_iter().map(|c| self.glyph_set(c)).collect()
    }

    fn alternates(&self, lookups: &mut BTreeMap<String, Lookup>) -> Result<()> {
        let mut single = BTreeMap::new();
        let mut alternate = BTreeMap::new();
        for character in self.table.characters() {
            let count = self.table.require(character)?.len();
            let glyph = self.glyph(character)?;
            if count > 1 {
                let variants = (WITHOUT_PRONUNCIATION..=max_variant_offset(count))
                    .map(|offset| variant_glyph_name(glyph, offset))
                    .collect();
                alternate.insert(glyph.to_owned(), variants);
            } else {
                single.insert(
                    glyph.to_owned(),
                    variant_glyph_name(glyph, WITHOUT_PRONUNCIATION),
                );
            }
        }
        lookups.insert(AALT_SINGLE_LOOKUP.to_owned(), Lookup::single(single));
        lookups.insert(AALT_ALTERNATE_LOOKUP.to_owned(), Lookup::alternate(alternate));
        Ok(())
    }

    fn pattern_one(
        &self,
        rules: &PatternOneRules,
        lookups: &mut BTreeMap<String, Lookup>,
    ) -> Result<Vec<ChainingRule>> {
        let mut out = Vec::new();
        for (slot, group) in rules.by_slot() {
            let mut single = BTreeMap::new();
            for rule in group {
                // 导出文本可能是手工修改过的，读音与序号要和读音表一致
                let index = self.table.index_of(rule.character, &rule.pronunciation)?;
                if LookupSlot::for_variant(Layer::PatternOne, index)? != slot {
                    return Err(CompileError::MalformedExport(format!(
                        "{} {} 不应在 {slot}",
                        rule.character, rule.pronunciation
                    )));
                }
                let glyph = self.glyph(rule.character)?;
                single.insert(
                    glyph.to_owned(),
                    variant_glyph_name(glyph, slot.glyph_offset()),
                );
                out.extend(self.template_rules(rule)?);
            }
            lookups.insert(slot.to_string(), Lookup::single(single));
        }
        Ok(out)
    }

    /// 一个字、一个读音的所有模式：`~X` 合并为一条，`X~` 合并为一条，其余逐条。
    fn template_rules(&self, rule: &PatternOneRule) -> Result<Vec<ChainingRule>> {
        let lookup = rule.slot.to_string();
        let target = self.glyph_set(rule.character)?;
        let mut followed = BTreeSet::new();
        let mut preceded = BTreeSet::new();
        let mut others: Vec<&PatternTemplate> = Vec::new();
        for template in &rule.templates {
            match template.shape() {
                TemplateShape::FollowedBy(c) => {
                    followed.insert(self.glyph(c)?.to_owned());
                }
                TemplateShape::PrecededBy(c) => {
                    preceded.insert(self.glyph(c)?.to_owned());
                }
                TemplateShape::Other => others.push(template),
            }
        }

        let mut out = Vec::new();
        if !followed.is_empty() {
            out.push(ChainingRule {
                r#match: vec![target.clone(), followed.into_iter().collect()],
                apply: vec![apply(0, &lookup)],
                input_begins: 0,
                input_ends: 1,
            });
        }
        if !preceded.is_empty() {
            out.push(ChainingRule {
                r#match: vec![preceded.into_iter().collect(), target],
                apply: vec![apply(1, &lookup)],
                input_begins: 1,
                input_ends: 2,
            });
        }
        for template in others {
            let at = template.position();
            out.push(ChainingRule {
                r#match: self.match_chars(template.instantiate(rule.character))?,
                apply: vec![apply(at, &lookup)],
                input_begins: at,
                input_ends: at + 1,
            });
        }
        Ok(out)
    }

    /// 多异读模式与例外的查找表：字形 -> 变体字形。
    fn slot_lookups(
        &self,
        layer: Layer,
        table: &LookupTable,
        lookups: &mut BTreeMap<String, Lookup>,
    ) -> Result<()> {
        for (slot, entries) in table {
            if slot.layer() != layer {
                return Err(layer_error(layer, slot.to_string(), "查找表不属于该层"));
            }
            let mut single = BTreeMap::new();
            for (&character, variant) in entries {
                let count = self.table.require(variant.character)?.len();
                if variant.offset > max_variant_offset(count) {
                    return Err(layer_error(
                        layer,
                        format!("{character}: {variant}"),
                        "变体超出读音数量",
                    ));
                }
                single.insert(
                    self.glyph(character)?.to_owned(),
                    variant_glyph_name(self.glyph(variant.character)?, variant.offset),
                );
            }
            lookups.insert(slot.to_string(), Lookup::single(single));
        }
        Ok(())
    }

    /// 覆盖整词的一条规则，输入段从第一个替换位置到最后一个替换位置。
    fn phrase_rule(
        &self,
        layer: Layer,
        table: &LookupTable,
        phrase: &str,
        positions: &[PositionSlot],
    ) -> Result<ChainingRule> {
        if !phrase.chars().eq(positions.iter().map(|p| p.character)) {
            return Err(layer_error(layer, phrase.to_owned(), "位置序列与词不一致"));
        }
        let mut applies = Vec::new();
        for (at, position) in positions.iter().enumerate() {
            let Some(slot) = position.slot else { continue };
            let registered = slot.layer() == layer
                && table
                    .get(&slot)
                    .is_some_and(|m| m.contains_key(&position.character));
            if !registered {
                return Err(layer_error(
                    layer,
                    format!("{phrase}: {} -> {slot}", position.character),
                    "查找表中没有登记",
                ));
            }
            applies.push(apply(at, &slot.to_string()));
        }
        let (Some(first), Some(last)) = (applies.first(), applies.last()) else {
            return Err(layer_error(layer, phrase.to_owned(), "没有需要替换的位置"));
        };
        let (input_begins, input_ends) = (first.at, last.at + 1);
        Ok(ChainingRule {
            r#match: self.match_chars(phrase.chars())?,
            apply: applies,
            input_begins,
            input_ends,
        })
    }

    fn exceptional_rules(
        &self,
        table: &LookupTable,
        phrase: &str,
        entry: &ExceptionalPhrase,
    ) -> Result<Vec<ChainingRule>> {
        let mut out = Vec::with_capacity(2);
        if let Some(ignore) = entry.ignore_context()? {
            out.push(ChainingRule {
                r#match: self.match_chars(ignore.chars.iter().copied())?,
                apply: Vec::new(),
                input_begins: ignore.target,
                input_ends: ignore.target + 1,
            });
        }
        out.push(self.phrase_rule(Layer::Exceptional, table, phrase, &entry.pattern)?);
        Ok(out)
    }

    /// GSUB 引用的字形总数不能超出字体容量。
    fn check_capacity(&self, lookups: &BTreeMap<String, Lookup>) -> Result<()> {
        let mut glyphs: BTreeSet<&str> = BTreeSet::new();
        for lookup in lookups.values() {
            match lookup {
                Lookup::Single { subtables, .. } => {
                    for (from, to) in subtables.iter().flatten() {
                        glyphs.insert(from);
                        glyphs.insert(to);
                    }
                }
                Lookup::Alternate { subtables, .. } => {
                    for (from, to) in subtables.iter().flatten() {
                        glyphs.insert(from);
                        glyphs.extend(to.iter().map(String::as_str));
                    }
                }
                Lookup::Chaining { subtables, .. } => {
                    for rule in subtables {
                        glyphs.extend(rule.r#match.iter().flatten().map(String::as_str));
                    }
                }
            }
        }
        if glyphs.len() > self.options.glyph_budget {
            return Err(CompileError::CapacityExceeded {
                count: glyphs.len(),
                budget: self.options.glyph_budget,
            });
        }
        Ok(())
    }
}

fn apply(at: usize, lookup: &str) -> Apply {
    Apply {
        at,
        lookup: lookup.to_owned(),
    }
}

fn layer_error(layer: Layer, context: String, reason: &str) -> CompileError {
    match layer {
        Layer::Exceptional => CompileError::AuthoringError {
            context,
            reason: reason.to_owned(),
        },
        _ => CompileError::MalformedExport(format!("{layer} {context}: {reason}")),
    }
}

fn finish(lookups: BTreeMap<String, Lookup>) -> Gsub {
    let aalt = vec![
        AALT_SINGLE_LOOKUP.to_owned(),
        AALT_ALTERNATE_LOOKUP.to_owned(),
    ];
    let rclt: Vec<String> = Layer::ALL
        .into_iter()
        .map(Layer::chaining_lookup_name)
        .collect();
    let features = BTreeMap::from([
        (AALT_FEATURE.to_owned(), aalt.clone()),
        (AALT_FEATURE_ALTERNATE.to_owned(), aalt),
        (RCLT_FEATURE.to_owned(), rclt.clone()),
        (RCLT_FEATURE_SECONDARY.to_owned(), rclt),
    ]);
    let languages = LANGUAGES
        .into_iter()
        .zip([
            [AALT_FEATURE, RCLT_FEATURE],
            [AALT_FEATURE_ALTERNATE, RCLT_FEATURE_SECONDARY],
        ])
        .map(|(language, features)| {
            let features = features.into_iter().map(str::to_owned).collect();
            (language.to_owned(), LanguageRecord { features })
        })
        .collect();
    // BTreeMap 的键已经有序
    let lookup_order = lookups.keys().cloned().collect();
    Gsub {
        languages,
        features,
        lookups,
        lookup_order,
    }
}
