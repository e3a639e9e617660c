//! 文件格式：读音表、语料、字形表的读入，以及编译产物的写出。
//!
//! core 只处理内存中的数据，这里负责和文件打交道。
mod corpus;
mod error;
mod font;
mod output;
mod table;

pub use corpus::{load_corpus, parse_corpus};
pub use error::{Error, Result};
pub use font::{FontMaps, load_font_maps, parse_font_maps};
pub use output::{
    EXCEPTIONAL_FILE, GLYPH_PLAN_FILE, GSUB_FILE, OutputFiles, PATTERN_ONE_FILE, PATTERN_TWO_FILE,
    UVS_FILE, read_exceptional, read_pattern_one, read_pattern_two, write_compilation, write_gsub,
    write_patterns,
};
pub use table::TsvPronunciationTable;
