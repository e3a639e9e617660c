use std::{fs, path::Path};

use duoyin_core::pronunciation::{MemoryPronunciationTable, PronunciationTable};
use tracing::info;

use crate::error::{Error, Result};

/// TSV 格式的读音表：
///
/// - `字<TAB>读音,读音,...`，第一个读音是标准读音
/// - 允许 `#` 开头注释行与空行
pub struct TsvPronunciationTable {
    inner: MemoryPronunciationTable,
}

impl TsvPronunciationTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let table = Self::from_tsv_str(&s)?;
        info!(path = %path.display(), characters = table.len(), "读音表已载入");
        Ok(table)
    }

    pub fn from_tsv_str(s: &str) -> Result<Self> {
        let mut inner = MemoryPronunciationTable::new();
        for (idx, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut it = line.split('\t');
            let text = it.next().unwrap_or("").trim();
            let list = it.next().unwrap_or("").trim();
            let mut chars = text.chars();
            let (Some(character), None) = (chars.next(), chars.next()) else {
                return Err(Error::parse(idx + 1, format!("第一列必须是单个字: {text}")));
            };
            let pronunciations: Vec<&str> = list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            if pronunciations.is_empty() {
                return Err(Error::parse(idx + 1, format!("{character} 缺少读音")));
            }
            if inner.pronunciations(character).is_some() {
                return Err(Error::parse(idx + 1, format!("{character} 重复出现")));
            }
            inner.insert(character, pronunciations);
        }
        Ok(Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PronunciationTable for TsvPronunciationTable {
    fn pronunciations(&self, character: char) -> Option<&[String]> {
        self.inner.pronunciations(character)
    }

    fn characters(&self) -> Vec<char> {
        self.inner.characters()
    }
}
