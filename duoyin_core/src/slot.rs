//! 规则层与优先级槽。
//!
//! 字形变体的偏移约定（`ssNN` 后缀）：
//! - `ss00`：不带注音的字形
//! - `ss01`：标准读音（多音字才有；和无后缀字形相同，用来绕过上下文替换强制指定）
//! - `ss02` 以后：异读，按读音表顺序
//!
//! 查找表名 `lookup_pattern_{层}{槽}`，每层最多 10 个槽，所以两位数字足以区分。
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

/// 不带注音的变体偏移。
pub const WITHOUT_PRONUNCIATION: u16 = 0;
/// 标准读音的变体偏移。
pub const STANDARD_PRONUNCIATION: u16 = 1;
/// 第一个异读的变体偏移。
pub const VARIANT_PRONUNCIATION: u16 = 2;

/// 每层最多的优先级槽数量。
pub const MAX_SLOTS: usize = 10;

const SLOT_PREFIX: &str = "lookup_pattern_";

/// 三个独立求值的上下文规则层，按此顺序执行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// 单异读模式
    PatternOne,
    /// 多异读模式
    PatternTwo,
    /// 手写例外
    Exceptional,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::PatternOne, Layer::PatternTwo, Layer::Exceptional];

    pub fn index(self) -> u8 {
        match self {
            Layer::PatternOne => 0,
            Layer::PatternTwo => 1,
            Layer::Exceptional => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.index() == index)
    }

    /// 该层上下文替换查找表的名字。
    pub fn chaining_lookup_name(self) -> String {
        format!("lookup_rclt_{}", self.index())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::PatternOne => "pattern_one",
            Layer::PatternTwo => "pattern_two",
            Layer::Exceptional => "exceptional_pattern",
        };
        f.write_str(name)
    }
}

/// 某层中的一个优先级槽（0 起）。
///
/// 排序先按层再按槽，与查找表名的字典序一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LookupSlot {
    layer: Layer,
    slot: u8,
}

impl LookupSlot {
    /// 超出 [`MAX_SLOTS`] 时返回 `SlotOverflow`。
    pub fn new(layer: Layer, slot: usize) -> Result<Self> {
        if slot >= MAX_SLOTS {
            return Err(CompileError::SlotOverflow {
                layer,
                requested: slot + 1,
                limit: MAX_SLOTS,
            });
        }
        Ok(Self {
            layer,
            slot: slot as u8,
        })
    }

    /// 该层的第一个槽。
    pub const fn first(layer: Layer) -> Self {
        Self { layer, slot: 0 }
    }

    /// 由读音在读音表中的下标得到槽：下标 1 对应槽 0。
    ///
    /// 标准读音（下标 0）不会成为异读，传入时按格式错误处理。
    pub fn for_variant(layer: Layer, index: usize) -> Result<Self> {
        let slot = index.checked_sub(1).ok_or_else(|| {
            CompileError::MalformedExport(format!("标准读音不能占用 {layer} 的优先级槽"))
        })?;
        Self::new(layer, slot)
    }

    pub fn layer(self) -> Layer {
        self.layer
    }

    pub fn slot(self) -> usize {
        usize::from(self.slot)
    }

    /// 该槽替换到的变体偏移（`ssNN` 的 NN）。
    pub fn glyph_offset(self) -> u16 {
        VARIANT_PRONUNCIATION + u16::from(self.slot)
    }
}

impl fmt::Display for LookupSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SLOT_PREFIX}{}{}", self.layer.index(), self.slot)
    }
}

impl FromStr for LookupSlot {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || CompileError::MalformedExport(format!("查找表名 {s}"));
        let digits = s.strip_prefix(SLOT_PREFIX).ok_or_else(malformed)?;
        let mut it = digits.chars().map(|c| c.to_digit(10));
        let (Some(Some(layer)), Some(Some(slot)), None) = (it.next(), it.next(), it.next()) else {
            return Err(malformed());
        };
        let layer = Layer::from_index(layer as u8).ok_or_else(malformed)?;
        Self::new(layer, slot as usize)
    }
}

impl TryFrom<String> for LookupSlot {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LookupSlot> for String {
    fn from(value: LookupSlot) -> Self {
        value.to_string()
    }
}

/// 字形变体名，以字本身书写，例如 `着.ss02`。
///
/// 合成 GSUB 时再换成字形名（`uni7740.ss02`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantName {
    pub character: char,
    pub offset: u16,
}

impl VariantName {
    pub fn new(character: char, offset: u16) -> Self {
        Self { character, offset }
    }

    /// 槽对应的变体名。
    pub fn for_slot(character: char, slot: LookupSlot) -> Self {
        Self::new(character, slot.glyph_offset())
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.ss{:02}", self.character, self.offset)
    }
}

impl FromStr for VariantName {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || CompileError::MalformedExport(format!("变体名 {s}"));
        let (head, suffix) = s.rsplit_once(".ss").ok_or_else(malformed)?;
        let mut chars = head.chars();
        let (Some(character), None) = (chars.next(), chars.next()) else {
            return Err(malformed());
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let offset = suffix.parse::<u16>().map_err(|_| malformed())?;
        Ok(Self { character, offset })
    }
}

impl TryFrom<String> for VariantName {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VariantName> for String {
    fn from(value: VariantName) -> Self {
        value.to_string()
    }
}
