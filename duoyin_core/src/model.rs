use std::{fmt, str::FromStr};

use crate::{
    error::{CompileError, Result},
    pronunciation::{PronunciationTable, STANDARD_INDEX},
};

/// 模式中代表目标字的占位符。
pub const PLACEHOLDER: char = '~';

/// 词语：字序列与逐字读音一一对应。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    chars: Vec<char>,
    pronunciations: Vec<String>,
}

/// 词中读音偏离标准读音的一个位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deviation {
    /// 在词中的位置
    pub position: usize,
    pub character: char,
    /// 实际读音
    pub pronunciation: String,
    /// 实际读音在读音表中的下标（>= 1）
    pub index: usize,
}

impl Word {
    /// 字数与读音数不一致时返回 `LengthMismatch`。
    pub fn new<S: Into<String>>(text: &str, pronunciations: Vec<S>) -> Result<Self> {
        let chars: Vec<char> = text.chars().collect();
        let pronunciations: Vec<String> = pronunciations.into_iter().map(Into::into).collect();
        if chars.is_empty() || chars.len() != pronunciations.len() {
            return Err(CompileError::LengthMismatch {
                word: text.to_owned(),
                characters: chars.len(),
                pronunciations: pronunciations.len(),
            });
        }
        Ok(Self {
            chars,
            pronunciations,
        })
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn pronunciations(&self) -> &[String] {
        &self.pronunciations
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// 找出所有偏离标准读音的位置（从左到右）。
    ///
    /// 同时校验每个读音都在读音表中：不在表中的字返回 `UnknownCharacter`，
    /// 不存在的读音返回 `InvalidPronunciation`。
    pub fn deviations<P>(&self, table: &P) -> Result<Vec<Deviation>>
    where
        P: PronunciationTable + ?Sized,
    {
        let mut out = Vec::new();
        for (position, (&character, pronunciation)) in
            self.chars.iter().zip(&self.pronunciations).enumerate()
        {
            let index = table.index_of(character, pronunciation)?;
            if index != STANDARD_INDEX {
                out.push(Deviation {
                    position,
                    character,
                    pronunciation: pronunciation.clone(),
                    index,
                });
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.text(), self.pronunciations.join("/"))
    }
}

/// 模式：把词中恰好一个位置换成占位符，表示“此字在此语境下读此音”。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternTemplate {
    chars: Vec<char>,
    position: usize,
}

/// 模式的形状，决定规则如何合并输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateShape {
    /// `~X`：目标字后紧跟一个字
    FollowedBy(char),
    /// `X~`：目标字前紧挨一个字
    PrecededBy(char),
    /// 其余（上下文多于一个字）
    Other,
}

impl PatternTemplate {
    /// 把 `chars[position]` 换成占位符。
    ///
    /// 按位置替换而不是按字替换：`累累` 这类叠字只能有一个位置成为占位符。
    pub fn at(chars: &[char], position: usize) -> Option<Self> {
        if position >= chars.len() {
            return None;
        }
        let mut chars = chars.to_vec();
        chars[position] = PLACEHOLDER;
        Some(Self { chars, position })
    }

    /// 占位符的位置。
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// 把占位符还原为 `character`，得到词语本身。
    pub fn instantiate(&self, character: char) -> Vec<char> {
        let mut chars = self.chars.clone();
        chars[self.position] = character;
        chars
    }

    pub fn shape(&self) -> TemplateShape {
        match (self.chars.as_slice(), self.position) {
            ([_, next], 0) => TemplateShape::FollowedBy(*next),
            ([prev, _], 1) => TemplateShape::PrecededBy(*prev),
            _ => TemplateShape::Other,
        }
    }
}

impl fmt::Display for PatternTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for PatternTemplate {
    type Err = CompileError;

    /// 必须恰好含一个占位符。
    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        let mut marks = chars
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == PLACEHOLDER)
            .map(|(i, _)| i);
        match (marks.next(), marks.next()) {
            (Some(position), None) => Ok(Self { chars, position }),
            _ => Err(CompileError::MalformedExport(format!(
                "模式 {s} 必须恰好含一个 {PLACEHOLDER}"
            ))),
        }
    }
}
