use std::{fs, path::Path};

use duoyin_core::glyph::Cmap;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// 字体 JSON（otfcc 导出）中编译需要的部分。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontMaps {
    pub cmap: Cmap,
    pub glyph_order: Vec<String>,
}

#[derive(Deserialize)]
struct FontDump {
    cmap: Option<Cmap>,
    #[serde(default)]
    glyph_order: Vec<String>,
}

/// 接受两种形式：
/// - 完整的字体 JSON：取 `cmap` 与 `glyph_order`
/// - 单独的 `cmap`：`{"24046": "uni5DEE", ...}`
pub fn parse_font_maps(s: &str) -> serde_json::Result<FontMaps> {
    let dump: FontDump = serde_json::from_str(s)?;
    match dump.cmap {
        Some(cmap) => Ok(FontMaps {
            cmap,
            glyph_order: dump.glyph_order,
        }),
        None => Ok(FontMaps {
            cmap: serde_json::from_str(s)?,
            glyph_order: Vec::new(),
        }),
    }
}

pub fn load_font_maps(path: impl AsRef<Path>) -> Result<FontMaps> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let maps = parse_font_maps(&s).map_err(|e| Error::json(path, e))?;
    info!(
        path = %path.display(),
        cmap = maps.cmap.len(),
        glyphs = maps.glyph_order.len(),
        "字形表已载入"
    );
    Ok(maps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_cmap() {
        let maps = parse_font_maps(r#"{"24046": "uni5DEE", "19968": "uni4E00"}"#).unwrap();
        assert_eq!(maps.cmap.glyph('差').unwrap(), "uni5DEE");
        assert!(maps.glyph_order.is_empty());
    }

    #[test]
    fn embedded_cmap() {
        let maps = parse_font_maps(
            r#"{"head": {}, "cmap": {"24046": "uni5DEE"}, "glyph_order": [".notdef", "uni5DEE"]}"#,
        )
        .unwrap();
        assert_eq!(maps.cmap.len(), 1);
        assert_eq!(maps.glyph_order, [".notdef", "uni5DEE"]);
    }

    #[test]
    fn rejects_non_numeric_keys() {
        assert!(parse_font_maps(r#"{"差": "uni5DEE"}"#).is_err());
    }
}
