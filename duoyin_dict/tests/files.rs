//! 从文件读入、编译、写出、再读回。

use std::{collections::BTreeMap, fs};

use duoyin_core::engine::{CompileInput, Compiler};
use duoyin_dict::{
    EXCEPTIONAL_FILE, GLYPH_PLAN_FILE, GSUB_FILE, OutputFiles, PATTERN_ONE_FILE,
    PATTERN_TWO_FILE, TsvPronunciationTable, UVS_FILE, load_corpus, load_font_maps,
    read_exceptional, read_pattern_one, read_pattern_two, write_compilation, write_gsub,
    write_patterns,
};

const TABLE: &str = "\
# 字\t读音
差\tchà,chā,chāi
别\tbié,biè
出\tchū
占\tzhàn,zhān
卜\tbǔ,bo
着\tzhe,zhuó,zháo,zhāo
手\tshǒu
背\tbèi,bēi
轴\tzhóu,zhòu
子\tzǐ,zi
大\tdà,dài
压\tyā,yà
";

const SINGLE: &str = "差别: chā/bié\n出差: chū/chāi\n别出: bié/chū\n";
const MULTI: &str = "占卜: zhān/bo\n";

fn cmap_json() -> String {
    let entries: Vec<String> = "差别出占卜着手背轴子大压"
        .chars()
        .map(|c| format!("\"{}\": \"cid{}\"", u32::from(c), u32::from(c)))
        .collect();
    format!(
        "{{\"cmap\": {{{}}}, \"glyph_order\": [\".notdef\"]}}",
        entries.join(", ")
    )
}

#[test]
fn compile_from_files_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("table.tsv"), TABLE).unwrap();
    fs::write(root.join("single.txt"), SINGLE).unwrap();
    fs::write(root.join("multi.txt"), MULTI).unwrap();
    fs::write(root.join("font.json"), cmap_json()).unwrap();

    let table = TsvPronunciationTable::from_path(root.join("table.tsv")).unwrap();
    let single = load_corpus(root.join("single.txt")).unwrap();
    let multi = load_corpus(root.join("multi.txt")).unwrap();
    let font = load_font_maps(root.join("font.json")).unwrap();
    assert_eq!(font.glyph_order, [".notdef"]);

    let compiler = Compiler::new(table);
    let out = compiler
        .compile(CompileInput {
            single: &single,
            multi: &multi,
            cmap: &font.cmap,
            glyph_order: &font.glyph_order,
        })
        .unwrap();
    assert!(out.glyphs.glyph_order.contains(&".notdef".to_owned()));

    let out_dir = root.join("out");
    let written = write_compilation(&out_dir, &out).unwrap();
    assert_eq!(written.len(), 6);

    let one = read_pattern_one(out_dir.join(PATTERN_ONE_FILE)).unwrap();
    assert_eq!(one, out.pattern_one.rules(compiler.table()).unwrap());
    let two = read_pattern_two(out_dir.join(PATTERN_TWO_FILE)).unwrap();
    assert_eq!(two, out.pattern_two);
    let exceptional = read_exceptional(out_dir.join(EXCEPTIONAL_FILE)).unwrap();
    assert_eq!(exceptional, out.exceptional);

    // 由读回的表重新合成，结果一致
    let gsub = compiler.assemble(&one, &two, &font.cmap).unwrap();
    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join(GSUB_FILE)).unwrap()).unwrap();
    assert_eq!(serde_json::to_value(&gsub).unwrap(), on_disk);

    let uvs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join(UVS_FILE)).unwrap()).unwrap();
    let key = format!("{} {}", u32::from('差'), 0xE01E0 + 3);
    assert_eq!(uvs[key.as_str()], "cid24046.ss03");
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_corpus(dir.path().join("nope.txt")).err().unwrap();
    assert!(err.to_string().contains("nope.txt"));
}

#[test]
fn broken_exceptional_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(EXCEPTIONAL_FILE);
    fs::write(
        &path,
        r#"{"lookup_table": {}, "patterns": {"着手": {"ignore": null, "pattern": [{"着": "lookup_pattern_20"}, {"手": null}]}}}"#,
    )
    .unwrap();
    assert!(matches!(
        read_exceptional(&path),
        Err(duoyin_dict::Error::Compile(_))
    ));
}

#[test]
fn patterns_then_gsub_in_two_steps() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let table = TsvPronunciationTable::from_tsv_str(TABLE).unwrap();
    let single = duoyin_dict::parse_corpus(SINGLE).unwrap();
    let multi = duoyin_dict::parse_corpus(MULTI).unwrap();
    let font = duoyin_dict::parse_font_maps(&cmap_json()).unwrap();
    let compiler = Compiler::new(table);

    let one = compiler.pattern_one(&single).unwrap();
    let export = one.export(compiler.table()).unwrap();
    let two = compiler.pattern_two(&multi).unwrap();
    let patterns = root.join("patterns");
    let written = write_patterns(&patterns, &export, &two, compiler.exceptional_table()).unwrap();
    assert_eq!(written.len(), 3);

    let one = read_pattern_one(patterns.join(PATTERN_ONE_FILE)).unwrap();
    let two = read_pattern_two(patterns.join(PATTERN_TWO_FILE)).unwrap();
    let gsub = compiler.assemble(&one, &two, &font.cmap).unwrap();
    let plan = compiler.glyph_plan(&font.cmap, &font.glyph_order).unwrap();
    let out = root.join("gsub");
    write_gsub(&out, &gsub, &plan).unwrap();
    for name in [GSUB_FILE, UVS_FILE, GLYPH_PLAN_FILE] {
        assert!(out.join(name).is_file(), "{name}");
    }
}

#[test]
fn nothing_is_written_when_serialization_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    // JSON 对象的键只能是字符串
    let bad = BTreeMap::from([((1u32, 2u32), 3u32)]);
    let result = OutputFiles::new(&out)
        .text(PATTERN_ONE_FILE, "1, 差, chà, [~劲]\n")
        .json(GSUB_FILE, &bad);
    assert!(matches!(result, Err(duoyin_dict::Error::Json { .. })));
    assert!(!out.exists());
}
