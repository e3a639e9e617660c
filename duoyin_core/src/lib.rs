//! `duoyin_core`：多音字规则编译的纯逻辑层，不做任何文件 I/O。
//!
//! 流水线：
//! - 读音表（`pronunciation`）+ 词语（`model::Word`）
//! - 单异读词 -> `pattern_one`（编译 + 压缩）；多异读词 -> `pattern_two`；手写例外 -> `exceptional`
//! - `assembler` 把三层规则合成 GSUB（`gsub`），`glyph` 负责变体字形命名与异体字序列
//! - `engine` 负责编排，任何错误都会中止整个编译（不输出部分结果）
pub mod assembler;
pub mod engine;
pub mod error;
pub mod exceptional;
pub mod glyph;
pub mod gsub;
pub mod model;
pub mod pattern_one;
pub mod pattern_two;
pub mod phrase_map;
pub mod pronunciation;
pub mod slot;

pub use error::{CompileError, Result};
