//! `pattern_two`：含两个以上异读字的词语。
//!
//! 每个词生成一条覆盖整词的规则，逐位置指定替换用的查找表（槽）：
//!
//! ```json
//! {
//!     "lookup_table": { "lookup_pattern_10": { "占": "占.ss02", "卜": "卜.ss02" } },
//!     "patterns": { "占卜": [ {"占": "lookup_pattern_10"}, {"卜": "lookup_pattern_10"} ] }
//! }
//! ```
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{CompileError, Result},
    model::Word,
    phrase_map::PhraseMap,
    pronunciation::PronunciationTable,
    slot::{Layer, LookupSlot, VariantName},
};

/// 槽 -> (字 -> 变体名)。
pub type LookupTable = BTreeMap<LookupSlot, BTreeMap<char, VariantName>>;

/// 词中一个位置：字，以及替换用的槽（不替换为 `None`）。
///
/// 序列化为单键对象 `{"占": "lookup_pattern_10"}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<char, Option<LookupSlot>>",
    into = "BTreeMap<char, Option<LookupSlot>>"
)]
pub struct PositionSlot {
    pub character: char,
    pub slot: Option<LookupSlot>,
}

impl TryFrom<BTreeMap<char, Option<LookupSlot>>> for PositionSlot {
    type Error = CompileError;

    fn try_from(value: BTreeMap<char, Option<LookupSlot>>) -> Result<Self> {
        let mut it = value.into_iter();
        match (it.next(), it.next()) {
            (Some((character, slot)), None) => Ok(Self { character, slot }),
            _ => Err(CompileError::MalformedExport(
                "每个位置必须恰好有一个字".to_owned(),
            )),
        }
    }
}

impl From<PositionSlot> for BTreeMap<char, Option<LookupSlot>> {
    fn from(value: PositionSlot) -> Self {
        BTreeMap::from([(value.character, value.slot)])
    }
}

/// 多异读模式表。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTwoTable {
    pub lookup_table: LookupTable,
    pub patterns: PhraseMap<Vec<PositionSlot>>,
}

impl PatternTwoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 编译一个词语。没有异读的词不含任何信息，记录警告后跳过。
    pub fn compile_word<P>(&mut self, table: &P, word: &Word) -> Result<()>
    where
        P: PronunciationTable + ?Sized,
    {
        let deviations = word.deviations(table)?;
        if deviations.is_empty() {
            warn!(word = %word, "没有异读字，跳过");
            return Ok(());
        }

        let mut positions: Vec<PositionSlot> = word
            .chars()
            .iter()
            .map(|&character| PositionSlot {
                character,
                slot: None,
            })
            .collect();
        for deviation in &deviations {
            let slot = LookupSlot::for_variant(Layer::PatternTwo, deviation.index)?;
            self.lookup_table
                .entry(slot)
                .or_default()
                .entry(deviation.character)
                .or_insert_with(|| VariantName::for_slot(deviation.character, slot));
            positions[deviation.position].slot = Some(slot);
        }
        self.patterns.insert(word.text(), positions);
        Ok(())
    }

    pub fn compile<'a, P, I>(table: &P, words: I) -> Result<Self>
    where
        P: PronunciationTable + ?Sized,
        I: IntoIterator<Item = &'a Word>,
    {
        let mut out = Self::new();
        for word in words {
            out.compile_word(table, word)?;
        }
        info!(
            phrases = out.patterns.len(),
            lookups = out.lookup_table.len(),
            "pattern_two 编译完成"
        );
        Ok(out)
    }
}
