use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use duoyin_core::{
    engine::{CompileInput, Compiler},
    exceptional::ExceptionalTable,
};
use duoyin_dict::{
    TsvPronunciationTable, load_corpus, load_font_maps, read_exceptional, read_pattern_one,
    read_pattern_two, write_compilation, write_gsub, write_patterns,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 多音字注音字体的 GSUB 编译器。
#[derive(Parser)]
#[command(name = "duoyin", version)]
struct Cli {
    /// 输出 debug 日志（`RUST_LOG` 优先）
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 语料 -> 模式表 -> GSUB / 字形计划，一次完成
    Compile {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[command(flatten)]
        font: FontArgs,
    },
    /// 只生成模式表（pattern_one 文本、pattern_two 与例外表 JSON）
    Patterns {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// 由已导出的模式表合成 GSUB / 字形计划
    Gsub {
        /// 读音表 TSV
        #[arg(long)]
        pronunciations: PathBuf,
        #[arg(long)]
        pattern_one: PathBuf,
        #[arg(long)]
        pattern_two: PathBuf,
        /// 例外表 JSON；省略时使用内置表
        #[arg(long)]
        exceptional: Option<PathBuf>,
        #[command(flatten)]
        font: FontArgs,
        #[arg(long, default_value = "outputs")]
        out_dir: PathBuf,
    },
}

#[derive(Args)]
struct CorpusArgs {
    /// 读音表 TSV
    #[arg(long)]
    pronunciations: PathBuf,
    /// 单异读语料
    #[arg(long)]
    single_corpus: PathBuf,
    /// 多异读语料
    #[arg(long)]
    multi_corpus: PathBuf,
    /// 例外表 JSON；省略时使用内置表
    #[arg(long)]
    exceptional: Option<PathBuf>,
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct FontArgs {
    /// 字体 JSON 或单独的 cmap JSON
    #[arg(long)]
    cmap: PathBuf,
    /// 字形数量上限
    #[arg(long, default_value_t = duoyin_core::glyph::GLYPH_BUDGET)]
    glyph_budget: usize,
    /// 第一个变体（ss00）对应的异体字选择符，十进制或 `0x` 开头的十六进制
    #[arg(long, value_parser = parse_codepoint, default_value = "0xE01E0")]
    variation_selector_base: u32,
}

fn parse_codepoint(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("{s}: {e}"))
}

impl FontArgs {
    fn configure(
        &self,
        compiler: Compiler<TsvPronunciationTable>,
    ) -> Compiler<TsvPronunciationTable> {
        compiler
            .glyph_budget(self.glyph_budget)
            .variation_selector_base(self.variation_selector_base)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Compile { corpus, font } => compile(&corpus, &font),
        Command::Patterns { corpus } => patterns(&corpus),
        Command::Gsub {
            pronunciations,
            pattern_one,
            pattern_two,
            exceptional,
            font,
            out_dir,
        } => {
            let compiler = font.configure(compiler(&pronunciations, exceptional.as_deref())?);
            gsub(&compiler, &pattern_one, &pattern_two, &font.cmap, &out_dir)
        }
    }
}

fn init_logging(verbose: bool) {
    let directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn compiler(
    pronunciations: &Path,
    exceptional: Option<&Path>,
) -> Result<Compiler<TsvPronunciationTable>> {
    let table = TsvPronunciationTable::from_path(pronunciations)?;
    let exceptional = match exceptional {
        Some(path) => read_exceptional(path)?,
        None => ExceptionalTable::builtin(),
    };
    Ok(Compiler::new(table).exceptional(exceptional))
}

fn compile(corpus: &CorpusArgs, font: &FontArgs) -> Result<()> {
    let compiler = font.configure(compiler(
        &corpus.pronunciations,
        corpus.exceptional.as_deref(),
    )?);
    let single = load_corpus(&corpus.single_corpus)?;
    let multi = load_corpus(&corpus.multi_corpus)?;
    let maps = load_font_maps(&font.cmap)?;
    let out = compiler
        .compile(CompileInput {
            single: &single,
            multi: &multi,
            cmap: &maps.cmap,
            glyph_order: &maps.glyph_order,
        })
        .context("编译失败，未写出任何文件")?;
    let written = write_compilation(&corpus.out_dir, &out)?;
    info!(files = written.len(), dir = %corpus.out_dir.display(), "完成");
    Ok(())
}

fn patterns(corpus: &CorpusArgs) -> Result<()> {
    let compiler = compiler(&corpus.pronunciations, corpus.exceptional.as_deref())?;
    let single = load_corpus(&corpus.single_corpus)?;
    let multi = load_corpus(&corpus.multi_corpus)?;
    let one = compiler.pattern_one(&single)?;
    let export = one.export(compiler.table())?;
    let two = compiler.pattern_two(&multi)?;
    write_patterns(&corpus.out_dir, &export, &two, compiler.exceptional_table())?;
    info!(dir = %corpus.out_dir.display(), "模式表已写出");
    Ok(())
}

fn gsub(
    compiler: &Compiler<TsvPronunciationTable>,
    pattern_one: &Path,
    pattern_two: &Path,
    cmap: &Path,
    dir: &Path,
) -> Result<()> {
    let one = read_pattern_one(pattern_one)?;
    let two = read_pattern_two(pattern_two)?;
    let maps = load_font_maps(cmap)?;
    let gsub = compiler.assemble(&one, &two, &maps.cmap)?;
    let plan = compiler.glyph_plan(&maps.cmap, &maps.glyph_order)?;
    write_gsub(dir, &gsub, &plan)?;
    info!(dir = %dir.display(), "GSUB 已写出");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoyin_core::glyph::VARIATION_SELECTOR_BASE;

    #[test]
    fn codepoints_accept_hex_and_decimal() {
        assert_eq!(parse_codepoint("0xE01E0"), Ok(VARIATION_SELECTOR_BASE));
        assert_eq!(parse_codepoint("0XFE00"), Ok(0xFE00));
        assert_eq!(parse_codepoint("65024"), Ok(0xFE00));
        assert!(parse_codepoint("0xZZ").is_err());
    }

    #[test]
    fn variation_selector_base_flag() {
        let args = [
            "duoyin", "gsub", "--pronunciations", "t.tsv", "--pattern-one", "1.txt",
            "--pattern-two", "2.json", "--cmap", "font.json",
        ];
        let Command::Gsub { font, .. } = Cli::try_parse_from(args).unwrap().command else {
            panic!("应解析为 gsub");
        };
        assert_eq!(font.variation_selector_base, VARIATION_SELECTOR_BASE);

        let with_flag = args.iter().copied().chain(["--variation-selector-base", "0xFE00"]);
        let Command::Gsub { font, .. } = Cli::try_parse_from(with_flag).unwrap().command else {
            panic!("应解析为 gsub");
        };
        assert_eq!(font.variation_selector_base, 0xFE00);
    }
}
