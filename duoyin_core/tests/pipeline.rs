//! 端到端：语料 -> 模式表 -> GSUB / 字形计划。

use duoyin_core::{
    CompileError,
    engine::{CompileInput, Compiler},
    exceptional::ExceptionalTable,
    glyph::{Cmap, VARIATION_SELECTOR_BASE},
    gsub::Lookup,
    model::Word,
    pronunciation::{MemoryPronunciationTable, PronunciationTable},
    slot::Layer,
};

fn table() -> MemoryPronunciationTable {
    [
        ('差', vec!["chà", "chā", "chāi"]),
        ('劲', vec!["jìn", "jìng"]),
        ('别', vec!["bié", "biè"]),
        ('辨', vec!["biàn", "bàn"]),
        ('出', vec!["chū"]),
        ('占', vec!["zhàn", "zhān"]),
        ('卜', vec!["bǔ", "bo"]),
        ('着', vec!["zhe", "zhuó", "zháo", "zhāo"]),
        ('手', vec!["shǒu"]),
        ('背', vec!["bèi", "bēi"]),
        ('轴', vec!["zhóu", "zhòu"]),
        ('子', vec!["zǐ", "zi"]),
        ('大', vec!["dà", "dài"]),
        ('压', vec!["yā", "yà"]),
    ]
    .into_iter()
    .collect()
}

fn cmap() -> Cmap {
    table()
        .characters()
        .into_iter()
        .map(|c| (c, format!("cid{}", u32::from(c))))
        .collect()
}

fn word(text: &str, pinyin: &str) -> Word {
    Word::new(text, pinyin.split('/').collect()).unwrap()
}

fn single() -> Vec<Word> {
    vec![
        word("差劲", "chà/jìn"),
        word("差别", "chā/bié"),
        word("出差", "chū/chāi"),
        word("别劲", "biè/jìn"),
        word("别出", "bié/chū"),
    ]
}

#[test]
fn full_compilation() {
    let c = cmap();
    let multi = [word("占卜", "zhān/bo")];
    let single = single();
    let out = Compiler::new(table())
        .compile(CompileInput {
            single: &single,
            multi: &multi,
            cmap: &c,
            glyph_order: &[],
        })
        .unwrap();

    // 差 三个读音各一个模式，不压缩
    let entry = out.pattern_one.get('差').unwrap();
    assert_eq!(entry.patterns.len(), 3);
    // 劲 只在 差劲 中以标准读音出现，但登记给了最左的多音字 差
    assert!(out.pattern_one.get('劲').is_none());
    assert_eq!(
        out.pattern_one_export,
        "1, 差, chà, [~劲]\n2, 差, chā, [~别]\n3, 差, chāi, [出~]\n1, 别, bié, [~出]\n2, 别, biè, [~劲]\n"
    );

    let gsub = serde_json::to_value(&out.gsub).unwrap();
    assert_eq!(gsub["lookups"]["lookup_rclt_0"]["type"], "gsub_chaining");
    assert_eq!(
        gsub["lookups"]["lookup_pattern_00"]["subtables"][0]["cid24046"],
        "cid24046.ss02"
    );
    assert_eq!(
        gsub["lookups"]["lookup_pattern_20"]["subtables"][0]["cid30528"],
        "cid30528.ss02"
    );
    assert_eq!(gsub["lookups"]["lookup_rclt_1"]["subtables"][0]["inputEnds"], 2);

    // 着 有四个读音：ss00..ss04
    let zhe = u32::from('着');
    assert_eq!(
        out.glyphs.cmap_uvs.get(zhe, VARIATION_SELECTOR_BASE + 4),
        Some("cid30528.ss04")
    );
    assert_eq!(out.glyphs.cmap_uvs.get(zhe, VARIATION_SELECTOR_BASE + 5), None);
}

#[test]
fn single_reading_entries_are_merged() {
    // 辨 只有一个读音键，并入 别 的标准读音
    let mut words = single();
    words.push(word("辨别", "biàn/bié"));
    let compiler = Compiler::new(table());
    let one = compiler.pattern_one(&words).unwrap();
    assert!(one.get('辨').is_none());
    let templates = one.get('别').unwrap().templates("bié").unwrap();
    let rendered: Vec<String> = templates.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["~出", "辨~"]);
}

#[test]
fn two_deviations_route_to_pattern_two() {
    let compiler = Compiler::new(table());
    let words = [word("占卜", "zhān/bo")];
    assert!(matches!(
        compiler.pattern_one(&words),
        Err(CompileError::UnsupportedAmbiguity { deviations: 2, .. })
    ));
    let two = compiler.pattern_two(&words).unwrap();
    let positions = two.patterns.get("占卜").unwrap();
    assert_eq!(positions.iter().filter(|p| p.slot.is_some()).count(), 2);
    let registered: usize = two.lookup_table.values().map(|m| m.len()).sum();
    assert_eq!(registered, 2);
}

#[test]
fn missing_glyph_aborts_everything() {
    let mut c = Cmap::new();
    c.insert('差', "cid24046");
    let single = single();
    let result = Compiler::new(table()).compile(CompileInput {
        single: &single,
        multi: &[],
        cmap: &c,
        glyph_order: &[],
    });
    assert!(matches!(result, Err(CompileError::MissingGlyph { .. })));
}

#[test]
fn broken_exceptional_table_is_rejected() {
    let mut exceptional = ExceptionalTable::builtin();
    let mut entry = exceptional.patterns.get("着手").cloned().unwrap();
    entry.ignore = Some("背' 着' 手".to_owned());
    exceptional.patterns.insert("着手", entry);
    let c = cmap();
    let compiler = Compiler::new(table()).exceptional(exceptional);
    let result = compiler.assemble(&Default::default(), &Default::default(), &c);
    assert!(matches!(result, Err(CompileError::AuthoringError { .. })));
}

#[test]
fn layers_have_fixed_names() {
    let c = cmap();
    let gsub = Compiler::new(table())
        .assemble(&Default::default(), &Default::default(), &c)
        .unwrap();
    for layer in Layer::ALL {
        assert!(matches!(
            gsub.lookups[&layer.chaining_lookup_name()],
            Lookup::Chaining { .. }
        ));
    }
}
