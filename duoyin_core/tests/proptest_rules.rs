//! 性质测试：随机语料上的压缩幂等、导出往返与规则形状。

use duoyin_core::{
    assembler::RuleAssembler,
    exceptional::ExceptionalTable,
    glyph::{Cmap, GlyphOptions},
    gsub::Lookup,
    model::Word,
    pattern_one::{PatternOneRules, PatternOneTable},
    pattern_two::PatternTwoTable,
    pronunciation::{MemoryPronunciationTable, PronunciationTable},
};
use proptest::prelude::*;

const TABLE: &[(char, &[&str])] = &[
    ('差', &["chà", "chā", "chāi"]),
    ('别', &["bié", "biè"]),
    ('出', &["chū"]),
    ('参', &["cān", "shēn", "cēn"]),
    ('不', &["bù", "bú", "bu"]),
    ('长', &["cháng", "zhǎng"]),
    ('大', &["dà", "dài"]),
    ('人', &["rén"]),
];

fn table() -> MemoryPronunciationTable {
    TABLE
        .iter()
        .map(|(c, list)| (*c, list.to_vec()))
        .collect()
}

fn cmap() -> Cmap {
    TABLE
        .iter()
        .map(|(c, _)| (*c, format!("uni{:04X}", u32::from(*c))))
        .collect()
}

/// 至多一个异读的词。
fn arb_single_word() -> impl Strategy<Value = Word> {
    (
        prop::collection::vec(0..TABLE.len(), 2..5),
        any::<prop::sample::Index>(),
        0..3usize,
    )
        .prop_map(|(chars, position, choice)| {
            let position = position.index(chars.len());
            let text: String = chars.iter().map(|&i| TABLE[i].0).collect();
            let pronunciations: Vec<&str> = chars
                .iter()
                .enumerate()
                .map(|(n, &i)| {
                    let list = TABLE[i].1;
                    if n == position { list[choice % list.len()] } else { list[0] }
                })
                .collect();
            Word::new(&text, pronunciations).unwrap()
        })
}

/// 任意读音组合的词。
fn arb_multi_word() -> impl Strategy<Value = Word> {
    prop::collection::vec((0..TABLE.len(), 0..3usize), 2..5).prop_map(|picks| {
        let text: String = picks.iter().map(|&(i, _)| TABLE[i].0).collect();
        let pronunciations: Vec<&str> = picks
            .iter()
            .map(|&(i, choice)| TABLE[i].1[choice % TABLE[i].1.len()])
            .collect();
        Word::new(&text, pronunciations).unwrap()
    })
}

fn compressed(words: &[Word]) -> PatternOneTable {
    let t = table();
    let mut one = PatternOneTable::compile(&t, words).unwrap();
    one.compress(&t).unwrap();
    one
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn compression_is_idempotent(words in prop::collection::vec(arb_single_word(), 0..20)) {
        let once = compressed(&words);
        let mut twice = once.clone();
        twice.compress(&table()).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.entries().iter().all(|e| !e.is_degenerate()));
    }

    #[test]
    fn export_round_trips(words in prop::collection::vec(arb_single_word(), 0..20)) {
        let t = table();
        let one = compressed(&words);
        let parsed = PatternOneRules::parse(&one.export(&t).unwrap()).unwrap();
        prop_assert_eq!(parsed, one.rules(&t).unwrap());
    }

    #[test]
    fn assembled_rules_are_well_formed(
        single in prop::collection::vec(arb_single_word(), 0..20),
        multi in prop::collection::vec(arb_multi_word(), 0..10),
    ) {
        let t = table();
        let c = cmap();
        let one = compressed(&single).rules(&t).unwrap();
        let two = PatternTwoTable::compile(&t, &multi).unwrap();
        let options = GlyphOptions::default();
        let gsub = RuleAssembler::new(&t, &c, &options)
            .assemble(&one, &two, &ExceptionalTable::default())
            .unwrap();
        for lookup in gsub.lookups.values() {
            if let Lookup::Chaining { subtables, .. } = lookup {
                for rule in subtables {
                    prop_assert!(rule.input_begins <= rule.input_ends);
                    prop_assert!(rule.is_well_formed(), "{rule:?}");
                    for apply in &rule.apply {
                        prop_assert!(gsub.lookups.contains_key(&apply.lookup));
                    }
                }
            }
        }
    }

    #[test]
    fn zero_deviation_words_register_leftmost_polyphonic(word in arb_single_word()) {
        let t = table();
        let deviations = word.deviations(&t).unwrap();
        prop_assume!(deviations.is_empty());
        let one = PatternOneTable::compile(&t, [&word]).unwrap();
        match word.chars().iter().position(|&c| t.is_polyphonic(c)) {
            None => prop_assert!(one.is_empty()),
            Some(position) => {
                let character = word.chars()[position];
                prop_assert_eq!(one.len(), 1);
                let templates = one
                    .get(character)
                    .and_then(|e| e.templates(t.standard(character).unwrap()))
                    .unwrap();
                prop_assert_eq!(templates.len(), 1);
                prop_assert_eq!(templates[0].position(), position);
            }
        }
    }
}
