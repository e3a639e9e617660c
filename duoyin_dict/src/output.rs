use std::{
    fs,
    path::{Path, PathBuf},
};

use duoyin_core::{
    engine::Compilation, exceptional::ExceptionalTable, glyph::GlyphPlan, gsub::Gsub,
    pattern_one::PatternOneRules, pattern_two::PatternTwoTable,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use crate::error::{Error, Result};

pub const PATTERN_ONE_FILE: &str = "duoyinzi_pattern_one.txt";
pub const PATTERN_TWO_FILE: &str = "duoyinzi_pattern_two.json";
pub const EXCEPTIONAL_FILE: &str = "duoyinzi_exceptional_pattern.json";
pub const GSUB_FILE: &str = "GSUB.json";
pub const UVS_FILE: &str = "cmap_uvs.json";
pub const GLYPH_PLAN_FILE: &str = "glyph_plan.json";

fn to_json<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    let mut s = serde_json::to_string_pretty(value).map_err(|e| Error::json(path, e))?;
    s.push('\n');
    Ok(s)
}

/// 一组待写出的文件。
///
/// 先在内存中序列化全部内容，[`OutputFiles::write`] 时才落盘；
/// 任何一个文件序列化失败，目录里都不会出现新文件。
#[derive(Debug)]
pub struct OutputFiles {
    dir: PathBuf,
    files: Vec<(PathBuf, String)>,
}

impl OutputFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, contents: impl Into<String>) -> Self {
        self.files.push((self.dir.join(name), contents.into()));
        self
    }

    /// 以缩进格式序列化 JSON。
    pub fn json<T: Serialize>(mut self, name: &str, value: &T) -> Result<Self> {
        let path = self.dir.join(name);
        let contents = to_json(&path, value)?;
        self.files.push((path, contents));
        Ok(self)
    }

    /// 创建目录并写出全部文件，返回写出的路径。
    pub fn write(self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let mut written = Vec::with_capacity(self.files.len());
        for (file, contents) in self.files {
            fs::write(&file, contents).map_err(|e| Error::io(&file, e))?;
            info!(path = %file.display(), "已写出");
            written.push(file);
        }
        Ok(written)
    }
}

/// 写出全部编译产物。
pub fn write_compilation(dir: impl AsRef<Path>, out: &Compilation) -> Result<Vec<PathBuf>> {
    OutputFiles::new(dir.as_ref())
        .text(PATTERN_ONE_FILE, out.pattern_one_export.as_str())
        .json(PATTERN_TWO_FILE, &out.pattern_two)?
        .json(EXCEPTIONAL_FILE, &out.exceptional)?
        .json(GSUB_FILE, &out.gsub)?
        .json(UVS_FILE, &out.glyphs.cmap_uvs)?
        .json(GLYPH_PLAN_FILE, &out.glyphs)?
        .write()
}

/// 只写出三张模式表。
pub fn write_patterns(
    dir: impl AsRef<Path>,
    pattern_one_export: &str,
    pattern_two: &PatternTwoTable,
    exceptional: &ExceptionalTable,
) -> Result<Vec<PathBuf>> {
    OutputFiles::new(dir.as_ref())
        .text(PATTERN_ONE_FILE, pattern_one_export)
        .json(PATTERN_TWO_FILE, pattern_two)?
        .json(EXCEPTIONAL_FILE, exceptional)?
        .write()
}

/// 写出 GSUB 与字形计划。
pub fn write_gsub(dir: impl AsRef<Path>, gsub: &Gsub, plan: &GlyphPlan) -> Result<Vec<PathBuf>> {
    OutputFiles::new(dir.as_ref())
        .json(GSUB_FILE, gsub)?
        .json(UVS_FILE, &plan.cmap_uvs)?
        .json(GLYPH_PLAN_FILE, plan)?
        .write()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let s = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&s).map_err(|e| Error::json(path, e))
}

/// 读入单异读模式的导出文本。
pub fn read_pattern_one(path: impl AsRef<Path>) -> Result<PatternOneRules> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(PatternOneRules::parse(&s)?)
}

pub fn read_pattern_two(path: impl AsRef<Path>) -> Result<PatternTwoTable> {
    read_json(path.as_ref())
}

/// 读入例外表并校验。
pub fn read_exceptional(path: impl AsRef<Path>) -> Result<ExceptionalTable> {
    let table: ExceptionalTable = read_json(path.as_ref())?;
    table.validate()?;
    Ok(table)
}
