//! 字形变体的命名与异体字序列（IVS）。
//!
//! 对每个字（`uni5DEE` 为例）：
//! - `uni5DEE.ss00`：不带注音，几何与原字形相同
//! - `uni5DEE.ss01`：标准读音（仅多音字）。无后缀字形是上下文替换的目标，不能同时作为“尚未替换”的稳定引用
//! - `uni5DEE.ss02` 起：异读，按读音表顺序
//!
//! 另外生成 `(码位, 选择符)` -> 变体 的映射，让外部可以绕过上下文替换直接指定读音。
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use tracing::{debug, info};

use crate::{
    error::{CompileError, Result},
    pronunciation::{PronunciationTable, STANDARD_INDEX},
    slot::{STANDARD_PRONUNCIATION, VARIANT_PRONUNCIATION, WITHOUT_PRONUNCIATION},
};

/// 第一个变体对应的选择符：VS17。
pub const VARIATION_SELECTOR_BASE: u32 = 0xE01E0;
/// 一个字体能容纳的字形数量。
pub const GLYPH_BUDGET: usize = 65536;
/// 注音字形名前缀。
pub const DISPLAY_GLYPH_PREFIX: &str = "arranged_";

/// `uni5DEE` + 2 -> `uni5DEE.ss02`
pub fn variant_glyph_name(base: &str, offset: u16) -> String {
    format!("{base}.ss{offset:02}")
}

/// 某字拥有的最大变体偏移：单音字只有 `ss00`，多音字到 `ss{读音数}`。
pub fn max_variant_offset(pronunciation_count: usize) -> u16 {
    if pronunciation_count > 1 {
        pronunciation_count as u16
    } else {
        WITHOUT_PRONUNCIATION
    }
}

/// 字 -> 字形名（otfcc 的 `cmap`，键为十进制码位）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cmap {
    map: BTreeMap<u32, String>,
}

impl Cmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, character: char, glyph: impl Into<String>) {
        self.map.insert(u32::from(character), glyph.into());
    }

    /// 查不到时返回 `MissingGlyph`。
    pub fn glyph(&self, character: char) -> Result<&str> {
        self.map
            .get(&u32::from(character))
            .map(String::as_str)
            .ok_or_else(|| CompileError::missing_glyph(character))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(char, String)> for Cmap {
    fn from_iter<T: IntoIterator<Item = (char, String)>>(iter: T) -> Self {
        let mut cmap = Self::new();
        for (c, g) in iter {
            cmap.insert(c, g);
        }
        cmap
    }
}

/// 字形相关的编译选项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphOptions {
    pub variation_selector_base: u32,
    pub glyph_budget: usize,
    /// Unicode 中重复定义、字形相同的字，每组只生成一次字形
    pub duplicate_groups: Vec<Vec<char>>,
    pub display_glyph_prefix: String,
}

impl Default for GlyphOptions {
    fn default() -> Self {
        Self {
            variation_selector_base: VARIATION_SELECTOR_BASE,
            glyph_budget: GLYPH_BUDGET,
            // ⺎(U+2E8E) 兀(U+5140) 兀(U+FA0C)；嗀(U+55C0) 嗀(U+FA0D)
            duplicate_groups: vec![
                vec!['\u{2E8E}', '\u{5140}', '\u{FA0C}'],
                vec!['\u{55C0}', '\u{FA0D}'],
            ],
            display_glyph_prefix: DISPLAY_GLYPH_PREFIX.to_owned(),
        }
    }
}

impl GlyphOptions {
    fn duplicate_group(&self, character: char) -> Option<usize> {
        self.duplicate_groups
            .iter()
            .position(|g| g.contains(&character))
    }

    /// 注音字形名：`arranged_cha1`。
    pub fn display_glyph(&self, character: char, pronunciation: &str) -> Result<String> {
        let key = duoyin_pinyin::simplify(pronunciation).ok_or_else(|| {
            CompileError::InvalidPronunciation {
                character,
                pronunciation: pronunciation.to_owned(),
            }
        })?;
        Ok(format!("{}{key}", self.display_glyph_prefix))
    }
}

/// `(码位, 选择符)` -> 变体字形。
///
/// 序列化为 otfcc 的 `cmap_uvs`：键为 `"码位 选择符"`（十进制）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariationSequences {
    map: BTreeMap<(u32, u32), String>,
}

impl VariationSequences {
    pub fn insert(&mut self, codepoint: u32, selector: u32, glyph: String) {
        self.map.insert((codepoint, selector), glyph);
    }

    pub fn get(&self, codepoint: u32, selector: u32) -> Option<&str> {
        self.map.get(&(codepoint, selector)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Serialize for VariationSequences {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.map.len()))?;
        for ((codepoint, selector), glyph) in &self.map {
            map.serialize_entry(&format!("{codepoint} {selector}"), glyph)?;
        }
        map.end()
    }
}

/// 字形的构造方式，交给字体组装方执行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GlyphRecipe {
    /// 复制原字形的轮廓
    Copy { from: String },
    /// 由若干字形原位叠加
    Composite { references: Vec<String> },
}

/// 字形计划：字形顺序、构造方式与异体字序列。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlyphPlan {
    pub glyph_order: Vec<String>,
    pub glyphs: BTreeMap<String, GlyphRecipe>,
    pub cmap_uvs: VariationSequences,
}

/// 生成字形计划。
///
/// - `base_order`：字体原有的字形顺序
/// - 字形总数超过 `glyph_budget` 时返回 `CapacityExceeded`
pub fn plan<P>(
    table: &P,
    cmap: &Cmap,
    base_order: &[String],
    options: &GlyphOptions,
) -> Result<GlyphPlan>
where
    P: PronunciationTable + ?Sized,
{
    let mut order: BTreeSet<String> = base_order.iter().cloned().collect();
    let mut out = GlyphPlan::default();
    let mut materialized: BTreeSet<usize> = BTreeSet::new();

    for character in table.characters() {
        let list = table.require(character)?;
        let base = cmap.glyph(character)?;
        for offset in 0..=max_variant_offset(list.len()) {
            let name = variant_glyph_name(base, offset);
            out.cmap_uvs.insert(
                u32::from(character),
                options.variation_selector_base + u32::from(offset),
                name.clone(),
            );
            order.insert(name);
        }

        let group = options.duplicate_group(character);
        if group.is_some_and(|g| materialized.contains(&g)) {
            debug!(character = %character, glyph = base, "重复定义的字，字形已生成");
            continue;
        }
        for (name, recipe) in recipes(character, base, list, options)? {
            if let GlyphRecipe::Composite { references } = &recipe {
                order.extend(references.iter().cloned());
            }
            order.insert(name.clone());
            out.glyphs.insert(name, recipe);
        }
        if let Some(g) = group {
            materialized.insert(g);
        }
    }

    if order.len() > options.glyph_budget {
        return Err(CompileError::CapacityExceeded {
            count: order.len(),
            budget: options.glyph_budget,
        });
    }
    out.glyph_order = order.into_iter().collect();
    info!(
        glyphs = out.glyph_order.len(),
        sequences = out.cmap_uvs.len(),
        "字形计划完成"
    );
    Ok(out)
}

fn recipes(
    character: char,
    base: &str,
    list: &[String],
    options: &GlyphOptions,
) -> Result<Vec<(String, GlyphRecipe)>> {
    let bare = variant_glyph_name(base, WITHOUT_PRONUNCIATION);
    let annotated = |pronunciation: &str| -> Result<GlyphRecipe> {
        Ok(GlyphRecipe::Composite {
            references: vec![options.display_glyph(character, pronunciation)?, bare.clone()],
        })
    };

    let mut out = vec![(
        bare.clone(),
        GlyphRecipe::Copy {
            from: base.to_owned(),
        },
    )];
    let standard = &list[STANDARD_INDEX];
    if list.len() == 1 {
        out.push((base.to_owned(), annotated(standard)?));
        return Ok(out);
    }

    let forced = variant_glyph_name(base, STANDARD_PRONUNCIATION);
    out.push((forced.clone(), annotated(standard)?));
    out.push((
        base.to_owned(),
        GlyphRecipe::Composite {
            references: vec![forced],
        },
    ));
    for (i, pronunciation) in list.iter().enumerate().skip(1) {
        let offset = VARIANT_PRONUNCIATION + (i - 1) as u16;
        out.push((variant_glyph_name(base, offset), annotated(pronunciation)?));
    }
    Ok(out)
}
