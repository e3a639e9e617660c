//! `pattern_one`：只含一个异读字（或不含异读字）的词语。
//!
//! 构造出的表类似：
//!
//! ```text
//! 供 => { gōng: [~给, ~应], gòng: [~养, 自~] }
//! ```
//!
//! - 全部是标准读音的词：登记到词中第一个多音字的标准读音下（先到先得）
//! - 一个异读：登记到该字的异读下
//! - 两个以上：报错，这类词应放进 `pattern_two` 或例外表
//!
//! 只有一个读音键的条目没有区分作用，由 [`PatternOneTable::compress`] 并入同词中的其他多音字。
use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::{
    error::{CompileError, Result},
    model::{PatternTemplate, Word},
    pronunciation::PronunciationTable,
    slot::{Layer, LookupSlot},
};

/// 一个字的模式条目：读音 -> 模式列表，保持首次出现的顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOneEntry {
    pub character: char,
    pub patterns: Vec<(String, Vec<PatternTemplate>)>,
}

impl PatternOneEntry {
    fn new(character: char) -> Self {
        Self {
            character,
            patterns: Vec::new(),
        }
    }

    /// 只有一个读音键的条目。
    pub fn is_degenerate(&self) -> bool {
        self.patterns.len() == 1
    }

    pub fn templates(&self, pronunciation: &str) -> Option<&[PatternTemplate]> {
        self.patterns
            .iter()
            .find(|(p, _)| p == pronunciation)
            .map(|(_, t)| t.as_slice())
    }

    fn push(&mut self, pronunciation: &str, template: PatternTemplate) {
        match self.patterns.iter_mut().find(|(p, _)| p == pronunciation) {
            Some((_, templates)) => templates.push(template),
            None => self
                .patterns
                .push((pronunciation.to_owned(), vec![template])),
        }
    }
}

/// 单异读模式表：字 -> 条目，按字首次出现的顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternOneTable {
    entries: Vec<PatternOneEntry>,
    index: BTreeMap<char, usize>,
}

impl PatternOneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, character: char) -> Option<&PatternOneEntry> {
        self.index.get(&character).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[PatternOneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 登记一条模式。读音必须在该字的读音表中。
    ///
    /// 新的 (字, 读音) 新建条目，已有的追加到列表末尾（保持词表顺序）。
    pub fn register<P>(
        &mut self,
        table: &P,
        character: char,
        pronunciation: &str,
        template: PatternTemplate,
    ) -> Result<()>
    where
        P: PronunciationTable + ?Sized,
    {
        table.index_of(character, pronunciation)?;
        let i = match self.index.get(&character) {
            Some(&i) => i,
            None => {
                self.entries.push(PatternOneEntry::new(character));
                self.index.insert(character, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[i].push(pronunciation, template);
        Ok(())
    }

    /// 编译一个词语。
    pub fn compile_word<P>(&mut self, table: &P, word: &Word) -> Result<()>
    where
        P: PronunciationTable + ?Sized,
    {
        let deviations = word.deviations(table)?;
        match deviations.as_slice() {
            [] => {
                // 先到先得：第一个多音字
                let Some(position) = word.chars().iter().position(|&c| table.is_polyphonic(c))
                else {
                    return Ok(());
                };
                let character = word.chars()[position];
                let template = template_at(word, position)?;
                self.register(table, character, &word.pronunciations()[position], template)
            }
            [deviation] => {
                let template = template_at(word, deviation.position)?;
                self.register(
                    table,
                    deviation.character,
                    &deviation.pronunciation,
                    template,
                )
            }
            _ => Err(CompileError::UnsupportedAmbiguity {
                word: word.text(),
                deviations: deviations.len(),
            }),
        }
    }

    /// 依次编译词表，遇错即止。
    pub fn compile<'a, P, I>(table: &P, words: I) -> Result<Self>
    where
        P: PronunciationTable + ?Sized,
        I: IntoIterator<Item = &'a Word>,
    {
        let mut out = Self::new();
        for word in words {
            out.compile_word(table, word)?;
        }
        info!(characters = out.len(), "pattern_one 编译完成");
        Ok(out)
    }

    /// 压缩：把只有一个读音键的条目并入同词中另一个多音字的条目。
    ///
    /// 例如 `辨 { biàn: [~别] }` 没有区分作用，改写为 `别` 的标准读音模式 `辨~`。
    /// 目标字必须已在表中且有两个以上读音键，从左到右取第一个；找不到则丢弃该模式。
    ///
    /// 先在未修改的表上算出全部移动与删除，再一次性修改。
    pub fn compress<P>(&mut self, table: &P) -> Result<()>
    where
        P: PronunciationTable + ?Sized,
    {
        let snapshot = &*self;
        let degenerate: Vec<char> = snapshot
            .entries
            .iter()
            .filter(|e| e.is_degenerate())
            .map(|e| e.character)
            .collect();

        let mut moves: Vec<(char, PatternTemplate)> = Vec::new();
        let mut dropped = 0usize;
        for entry in snapshot.entries.iter().filter(|e| e.is_degenerate()) {
            for template in entry.patterns.iter().flat_map(|(_, t)| t) {
                let phrase = template.instantiate(entry.character);
                match snapshot.find_destination(&phrase, entry.character) {
                    Some(position) => {
                        let destination = phrase[position];
                        let moved = PatternTemplate::at(&phrase, position).ok_or_else(|| {
                            CompileError::MalformedExport(format!("{template} 无法改写"))
                        })?;
                        debug!(
                            from = %entry.character,
                            to = %destination,
                            pattern = %moved,
                            "合并单一读音模式"
                        );
                        moves.push((destination, moved));
                    }
                    None => {
                        warn!(character = %entry.character, pattern = %template, "找不到合并目标，丢弃");
                        dropped += 1;
                    }
                }
            }
        }

        self.remove_all(&degenerate);
        for (destination, template) in moves.iter().cloned() {
            let standard = table.standard(destination)?.to_owned();
            self.register(table, destination, &standard, template)?;
        }
        info!(
            removed = degenerate.len(),
            moved = moves.len(),
            dropped,
            "pattern_one 压缩完成"
        );
        Ok(())
    }

    fn find_destination(&self, phrase: &[char], source: char) -> Option<usize> {
        phrase.iter().position(|&c| {
            c != source && self.get(c).is_some_and(|e| e.patterns.len() > 1)
        })
    }

    fn remove_all(&mut self, characters: &[char]) {
        if characters.is_empty() {
            return;
        }
        self.entries.retain(|e| !characters.contains(&e.character));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.character, i))
            .collect();
    }

    /// 导出行：每个条目按读音表顺序输出，序号 = 读音下标 + 1（1 是标准读音）。
    pub fn export_lines<P>(&self, table: &P) -> Result<Vec<ExportLine>>
    where
        P: PronunciationTable + ?Sized,
    {
        let mut out = Vec::new();
        for entry in &self.entries {
            let list = table.require(entry.character)?;
            for (index, pronunciation) in list.iter().enumerate() {
                if let Some(templates) = entry.templates(pronunciation) {
                    out.push(ExportLine {
                        order: index + 1,
                        character: entry.character,
                        pronunciation: pronunciation.clone(),
                        templates: templates.to_vec(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// 文本导出（`duoyinzi_pattern_one.txt`）。
    pub fn export<P>(&self, table: &P) -> Result<String>
    where
        P: PronunciationTable + ?Sized,
    {
        let mut out = String::new();
        for line in self.export_lines(table)? {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        Ok(out)
    }

    /// 直接转换为规则（等同于导出后再读入）。
    pub fn rules<P>(&self, table: &P) -> Result<PatternOneRules>
    where
        P: PronunciationTable + ?Sized,
    {
        PatternOneRules::from_lines(self.export_lines(table)?)
    }
}

fn template_at(word: &Word, position: usize) -> Result<PatternTemplate> {
    PatternTemplate::at(word.chars(), position)
        .ok_or_else(|| CompileError::MalformedExport(format!("{} 的位置 {position}", word.text())))
}

/// 导出文本中的一行：`序号, 字, 读音, [模式|模式]`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLine {
    pub order: usize,
    pub character: char,
    pub pronunciation: String,
    pub templates: Vec<PatternTemplate>,
}

/// 标准读音的序号，读入时跳过。
pub const STANDARD_ORDER: usize = 1;

impl std::fmt::Display for ExportLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<String> = self.templates.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{}, {}, {}, [{}]",
            self.order,
            self.character,
            self.pronunciation,
            joined.join("|")
        )
    }
}

impl std::str::FromStr for ExportLine {
    type Err = CompileError;

    fn from_str(line: &str) -> Result<Self> {
        let malformed = || CompileError::MalformedExport(format!("pattern_one 行 {line}"));
        let mut it = line.splitn(4, ", ");
        let (Some(order), Some(character), Some(pronunciation), Some(templates)) =
            (it.next(), it.next(), it.next(), it.next())
        else {
            return Err(malformed());
        };
        let order: usize = order.trim().parse().map_err(|_| malformed())?;
        let mut chars = character.chars();
        let (Some(character), None) = (chars.next(), chars.next()) else {
            return Err(malformed());
        };
        let inner = templates
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(malformed)?;
        let templates = inner
            .split('|')
            .map(str::parse)
            .collect::<Result<Vec<PatternTemplate>>>()?;
        if order == 0 || pronunciation.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            order,
            character,
            pronunciation: pronunciation.to_owned(),
            templates,
        })
    }
}

/// 一条单异读规则：某字在这些模式中读该异读，替换到槽对应的变体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOneRule {
    pub slot: LookupSlot,
    pub character: char,
    pub pronunciation: String,
    pub templates: Vec<PatternTemplate>,
}

/// 单异读规则集（导出文本去掉标准读音行后的内容），保持行序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternOneRules {
    pub rules: Vec<PatternOneRule>,
}

impl PatternOneRules {
    fn from_lines(lines: impl IntoIterator<Item = ExportLine>) -> Result<Self> {
        let mut rules = Vec::new();
        for line in lines {
            if line.order == STANDARD_ORDER {
                continue;
            }
            // 序号 2 起为异读，槽从 0 开始
            let slot = LookupSlot::new(Layer::PatternOne, line.order - 2)?;
            rules.push(PatternOneRule {
                slot,
                character: line.character,
                pronunciation: line.pronunciation,
                templates: line.templates,
            });
        }
        Ok(Self { rules })
    }

    /// 读入导出文本；空行忽略。
    pub fn parse(text: &str) -> Result<Self> {
        let lines = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(str::parse::<ExportLine>)
            .collect::<Result<Vec<_>>>()?;
        Self::from_lines(lines)
    }

    /// 按槽分组，槽内保持行序。
    pub fn by_slot(&self) -> BTreeMap<LookupSlot, Vec<&PatternOneRule>> {
        let mut out: BTreeMap<LookupSlot, Vec<&PatternOneRule>> = BTreeMap::new();
        for rule in &self.rules {
            out.entry(rule.slot).or_default().push(rule);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
