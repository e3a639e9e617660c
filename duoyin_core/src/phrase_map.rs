//! 保留插入顺序的 “词语 -> 值” 映射。
//!
//! 导出的 JSON 以对象形式书写（`{"占卜": [...], ...}`），而规则输出必须沿用词表中的顺序，
//! 所以条目按插入顺序存在 `Vec` 中，另用 `BTreeMap` 记录词语的下标。
use std::{collections::BTreeMap, fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMap<V> {
    entries: Vec<(String, V)>,
    /// 词语 -> `entries` 下标
    index: BTreeMap<String, usize>,
}

impl<V> Default for PhraseMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<V> PhraseMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入；词语已存在时原位覆盖（保持最初的位置）。
    pub fn insert(&mut self, phrase: impl Into<String>, value: V) {
        let phrase = phrase.into();
        match self.index.get(&phrase) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(phrase.clone(), self.entries.len());
                self.entries.push((phrase, value));
            }
        }
    }

    pub fn get(&self, phrase: &str) -> Option<&V> {
        self.index.get(phrase).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for PhraseMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

struct PhraseMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for PhraseMapVisitor<V> {
    type Value = PhraseMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("以词语为键的对象")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut out = PhraseMap::new();
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            out.insert(k, v);
        }
        Ok(out)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for PhraseMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PhraseMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_document_order() {
        let json = r#"{"少不更事": 1, "占卜": 2, "阿谀": 3}"#;
        let map: PhraseMap<u32> = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["少不更事", "占卜", "阿谀"]);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"少不更事":1,"占卜":2,"阿谀":3}"#
        );
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut map = PhraseMap::new();
        map.insert("甲", 1);
        map.insert("乙", 2);
        map.insert("甲", 3);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("甲"), Some(&3));
        assert_eq!(map.iter().next(), Some(("甲", &3)));
    }

    #[test]
    fn many_phrases_stay_in_order() {
        let mut map = PhraseMap::new();
        for i in (0..50_000u32).rev() {
            map.insert(i.to_string(), i);
        }
        map.insert("7", 0);
        assert_eq!(map.len(), 50_000);
        assert_eq!(map.get("7"), Some(&0));
        assert_eq!(map.get("49999"), Some(&49_999));
        assert_eq!(map.iter().next(), Some(("49999", &49_999)));
        assert_eq!(map.iter().last(), Some(("0", &0)));
    }
}
