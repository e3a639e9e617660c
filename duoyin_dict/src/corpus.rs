use std::{collections::BTreeSet, fs, path::Path};

use duoyin_core::{CompileError, model::Word};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// 读入语料文件，见 [`parse_corpus`]。
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<Word>> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let words = parse_corpus(&s)?;
    info!(path = %path.display(), words = words.len(), "语料已载入");
    Ok(words)
}

/// 语料格式：
///
/// - `词: 读音/读音/...`，读音个数必须与字数一致
/// - 允许 `#` 开头注释行与空行
/// - 重复的词保留第一次出现的，记录警告
pub fn parse_corpus(s: &str) -> Result<Vec<Word>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for (idx, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((text, pinyin)) = line.split_once(':') else {
            return Err(Error::parse(idx + 1, format!("缺少 ':' 分隔: {line}")));
        };
        let text = text.trim();
        let pronunciations: Vec<&str> = pinyin.trim().split('/').map(str::trim).collect();
        if text.is_empty() || pronunciations.iter().any(|p| p.is_empty()) {
            return Err(Error::parse(idx + 1, format!("词或读音为空: {line}")));
        }
        let word = Word::new(text, pronunciations).map_err(|e| {
            if matches!(e, CompileError::LengthMismatch { .. }) {
                Error::parse(idx + 1, e.to_string())
            } else {
                Error::Compile(e)
            }
        })?;
        if !seen.insert(text.to_owned()) {
            warn!(line = idx + 1, word = %word, "重复的词，忽略");
            continue;
        }
        out.push(word);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_words() {
        let words = parse_corpus("# 单异读\n差别: chā/bié\n\n出差 : chū / chāi\n").unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text(), "出差");
        assert_eq!(words[1].pronunciations(), ["chū", "chāi"]);
    }

    #[test]
    fn keeps_first_duplicate() {
        let words = parse_corpus("差别: chā/bié\n差别: chà/bié\n").unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].pronunciations()[0], "chā");
    }

    #[test]
    fn length_mismatch_is_a_parse_error() {
        let err = parse_corpus("差别: chā/bié\n出差: chū\n").err().unwrap();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
        let err = parse_corpus("差别 chā/bié\n").err().unwrap();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }
}
