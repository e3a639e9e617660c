//! 拼音记号相关：带调号音节的校验与“简化”。
//!
//! 字体里每个读音都需要一个注音字形，字形名不能直接用 `chā` 这样的非 ASCII 串，
//! 所以统一简化为 “去掉调号 + 数字声调” 的形式（`chā` -> `cha1`，`lǜ` -> `lv4`）。

use std::fmt;

/// 拼音可能出现的字母（含调号）。
///
/// `m̀`、`m̄` 不是单一码位，字体里也往往没有收录，这里不支持。
pub const ALPHABET: [char; 55] = [
    'a', 'ā', 'á', 'ǎ', 'à', 'b', 'c', 'd', 'e', 'ē', 'é', 'ě', 'è', 'f', 'g', 'h', 'i', 'ī', 'í',
    'ǐ', 'ì', 'j', 'k', 'l', 'm', 'ḿ', 'n', 'ń', 'ň', 'ǹ', 'o', 'ō', 'ó', 'ǒ', 'ò', 'p', 'q', 'r',
    's', 't', 'u', 'ū', 'ú', 'ǔ', 'ù', 'ü', 'ǖ', 'ǘ', 'ǚ', 'ǜ', 'v', 'w', 'x', 'y', 'z',
];

/// 轻声在简化形式里的数字。
pub const NEUTRAL_TONE: u8 = 5;

// (带调字母, ASCII 字母, 声调)；声调 0 表示该字母本身不带调（如 `ü`）。
const TONE_MARKS: [(char, char, u8); 29] = [
    ('ā', 'a', 1),
    ('á', 'a', 2),
    ('ǎ', 'a', 3),
    ('à', 'a', 4),
    ('ē', 'e', 1),
    ('é', 'e', 2),
    ('ě', 'e', 3),
    ('è', 'e', 4),
    ('ī', 'i', 1),
    ('í', 'i', 2),
    ('ǐ', 'i', 3),
    ('ì', 'i', 4),
    ('ō', 'o', 1),
    ('ó', 'o', 2),
    ('ǒ', 'o', 3),
    ('ò', 'o', 4),
    ('ū', 'u', 1),
    ('ú', 'u', 2),
    ('ǔ', 'u', 3),
    ('ù', 'u', 4),
    ('ü', 'v', 0),
    ('ǖ', 'v', 1),
    ('ǘ', 'v', 2),
    ('ǚ', 'v', 3),
    ('ǜ', 'v', 4),
    ('ḿ', 'm', 2),
    ('ń', 'n', 2),
    ('ň', 'n', 3),
    ('ǹ', 'n', 4),
];

/// 判断字符是否属于拼音字母表。
pub fn is_pinyin_letter(c: char) -> bool {
    ALPHABET.contains(&c)
}

fn strip_tone(c: char) -> Option<(char, u8)> {
    TONE_MARKS
        .iter()
        .find(|(marked, _, _)| *marked == c)
        .map(|&(_, base, tone)| (base, tone))
}

/// 简化后的音节：ASCII 字母 + 声调。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Syllable {
    /// 去掉调号后的字母（`ü` 记作 `v`）
    pub letters: String,
    /// 1-4，轻声为 [`NEUTRAL_TONE`]
    pub tone: u8,
}

impl Syllable {
    /// 解析一个带调号的音节。
    ///
    /// 返回 `None` 的情况：空串、含拼音字母表以外的字符、出现两个以上调号。
    pub fn parse(pronunciation: &str) -> Option<Self> {
        if pronunciation.is_empty() {
            return None;
        }
        let mut letters = String::with_capacity(pronunciation.len());
        let mut tone = None;
        for c in pronunciation.chars() {
            if !is_pinyin_letter(c) {
                return None;
            }
            match strip_tone(c) {
                Some((base, 0)) => letters.push(base),
                Some((base, t)) => {
                    if tone.replace(t).is_some() {
                        return None;
                    }
                    letters.push(base);
                }
                None => letters.push(c),
            }
        }
        Some(Self {
            letters,
            tone: tone.unwrap_or(NEUTRAL_TONE),
        })
    }
}

impl fmt::Display for Syllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letters, self.tone)
    }
}

/// 判断是否是合法的带调音节。
pub fn is_valid_syllable(pronunciation: &str) -> bool {
    Syllable::parse(pronunciation).is_some()
}

/// `chā` -> `cha1`；非法音节返回 `None`。
pub fn simplify(pronunciation: &str) -> Option<String> {
    Syllable::parse(pronunciation).map(|s| s.to_string())
}
