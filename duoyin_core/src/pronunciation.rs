//! 读音表抽象：core 不关心读音表来自文件还是内存。
//!
//! 约定：
//! - 每个字对应一个有序的读音列表，长度至少为 1
//! - 下标 0 是标准读音，下标 i（i >= 1）是优先级为 i - 1 的异读
use std::collections::BTreeMap;

use crate::error::{CompileError, Result};

/// 标准读音在读音列表中的下标。
pub const STANDARD_INDEX: usize = 0;

/// 读音表（外部提供者）。
pub trait PronunciationTable: Send + Sync {
    /// 查询某字的读音列表；不在表中返回 `None`。
    fn pronunciations(&self, character: char) -> Option<&[String]>;

    /// 表中所有字，按码位升序。
    fn characters(&self) -> Vec<char>;

    /// 查询读音列表，不在表中时返回 `UnknownCharacter`。
    fn require(&self, character: char) -> Result<&[String]> {
        self.pronunciations(character)
            .filter(|list| !list.is_empty())
            .ok_or(CompileError::UnknownCharacter { character })
    }

    /// 标准读音（下标 0）。
    fn standard(&self, character: char) -> Result<&str> {
        Ok(self.require(character)?[STANDARD_INDEX].as_str())
    }

    /// 读音在列表中的下标；读音不在列表中返回 `InvalidPronunciation`。
    fn index_of(&self, character: char, pronunciation: &str) -> Result<usize> {
        self.require(character)?
            .iter()
            .position(|p| p == pronunciation)
            .ok_or_else(|| CompileError::InvalidPronunciation {
                character,
                pronunciation: pronunciation.to_owned(),
            })
    }

    /// 是否是多音字（读音多于一个）。不在表中的字视为非多音字。
    fn is_polyphonic(&self, character: char) -> bool {
        self.pronunciations(character)
            .is_some_and(|list| list.len() > 1)
    }
}

/// 内存中的读音表。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPronunciationTable {
    map: BTreeMap<char, Vec<String>>,
}

impl MemoryPronunciationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个字；空列表会被忽略，重复登记以后者为准。
    pub fn insert<I, S>(&mut self, character: char, pronunciations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = pronunciations.into_iter().map(Into::into).collect();
        if !list.is_empty() {
            self.map.insert(character, list);
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl PronunciationTable for MemoryPronunciationTable {
    fn pronunciations(&self, character: char) -> Option<&[String]> {
        self.map.get(&character).map(Vec::as_slice)
    }

    fn characters(&self) -> Vec<char> {
        self.map.keys().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<(char, Vec<S>)> for MemoryPronunciationTable {
    fn from_iter<T: IntoIterator<Item = (char, Vec<S>)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (character, list) in iter {
            table.insert(character, list);
        }
        table
    }
}
