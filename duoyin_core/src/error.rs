use thiserror::Error;

use crate::slot::Layer;

/// 编译过程中的致命错误；任何一种都会中止整个编译。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// 词语里的读音不在该字的读音表中。
    #[error("{character} => {pronunciation} 不是正确的读音")]
    InvalidPronunciation {
        character: char,
        pronunciation: String,
    },

    /// 含两个以上异读字的词被交给了单异读编译器。
    #[error("{word} 含有 {deviations} 个异读字，只能放进多异读词表或例外表")]
    UnsupportedAmbiguity { word: String, deviations: usize },

    /// 例外表的写法有误（ignore 上下文、空规则等）。
    #[error("例外规则写法有误：{context}（{reason}）")]
    AuthoringError { context: String, reason: String },

    /// 字形映射（cmap）里找不到该字。
    #[error("找不到字形：{character} (U+{codepoint:04X})")]
    MissingGlyph { character: char, codepoint: u32 },

    /// 同一层的优先级槽超过上限。
    #[error("{layer} 的优先级槽 {requested} 超出上限（最多 {limit} 个）")]
    SlotOverflow {
        layer: Layer,
        requested: usize,
        limit: usize,
    },

    /// 字形总数超过字体能容纳的数量。
    #[error("字形数量 {count} 超过上限 {budget}")]
    CapacityExceeded { count: usize, budget: usize },

    /// 读音表里没有这个字。
    #[error("读音表中没有该字：{character}")]
    UnknownCharacter { character: char },

    /// 词语的字数与读音数不一致。
    #[error("{word} 有 {characters} 个字，却给了 {pronunciations} 个读音")]
    LengthMismatch {
        word: String,
        characters: usize,
        pronunciations: usize,
    },

    /// 导出的模式表/槽名无法解析。
    #[error("无法解析：{0}")]
    MalformedExport(String),
}

impl CompileError {
    pub(crate) fn missing_glyph(character: char) -> Self {
        Self::MissingGlyph {
            character,
            codepoint: u32::from(character),
        }
    }
}

/// 编译结果类型。
pub type Result<T> = std::result::Result<T, CompileError>;
