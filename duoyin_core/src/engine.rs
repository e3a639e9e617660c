use tracing::info;

use crate::{
    assembler::RuleAssembler,
    error::Result,
    exceptional::ExceptionalTable,
    glyph::{self, Cmap, GLYPH_BUDGET, GlyphOptions, GlyphPlan},
    gsub::Gsub,
    model::Word,
    pattern_one::{PatternOneRules, PatternOneTable},
    pattern_two::PatternTwoTable,
    pronunciation::PronunciationTable,
};

/// 一次完整编译的输入。
#[derive(Debug, Clone, Copy)]
pub struct CompileInput<'a> {
    /// 单异读语料（每词至多一个异读字）
    pub single: &'a [Word],
    /// 多异读语料
    pub multi: &'a [Word],
    /// 字 -> 字形名
    pub cmap: &'a Cmap,
    /// 字体原有的字形顺序，可以为空
    pub glyph_order: &'a [String],
}

/// 一次完整编译的产物；只有全部阶段成功才会得到。
#[derive(Debug, Clone)]
pub struct Compilation {
    pub pattern_one: PatternOneTable,
    /// 单异读模式的导出文本
    pub pattern_one_export: String,
    pub pattern_two: PatternTwoTable,
    pub exceptional: ExceptionalTable,
    pub gsub: Gsub,
    pub glyphs: GlyphPlan,
}

/// 编译器：负责把读音表与语料编译成 GSUB 与字形计划。
///
/// 流水线：
/// - pattern_one（编译 + 压缩） -> 导出
/// - pattern_two（编译）
/// - 规则合成（三层 + aalt） -> 字形计划
pub struct Compiler<P> {
    /// 读音表（TSV 或其他实现）
    table: P,
    /// 手写例外表；默认使用内置表
    exceptional: ExceptionalTable,
    glyph_options: GlyphOptions,
}

impl<P> Compiler<P>
where
    P: PronunciationTable,
{
    pub fn new(table: P) -> Self {
        Self {
            table,
            exceptional: ExceptionalTable::builtin(),
            glyph_options: GlyphOptions::default(),
        }
    }

    /// 替换例外表。
    pub fn exceptional(mut self, table: ExceptionalTable) -> Self {
        self.exceptional = table;
        self
    }

    pub fn glyph_options(mut self, options: GlyphOptions) -> Self {
        self.glyph_options = options;
        self
    }

    /// 设置第一个变体对应的选择符。
    pub fn variation_selector_base(mut self, base: u32) -> Self {
        self.glyph_options.variation_selector_base = base;
        self
    }

    /// 设置字形数量上限；0 会回退到默认值。
    pub fn glyph_budget(mut self, budget: usize) -> Self {
        self.glyph_options.glyph_budget = if budget == 0 { GLYPH_BUDGET } else { budget };
        self
    }

    pub fn table(&self) -> &P {
        &self.table
    }

    pub fn exceptional_table(&self) -> &ExceptionalTable {
        &self.exceptional
    }

    /// 编译并压缩单异读模式。
    pub fn pattern_one(&self, words: &[Word]) -> Result<PatternOneTable> {
        let mut table = PatternOneTable::compile(&self.table, words)?;
        table.compress(&self.table)?;
        Ok(table)
    }

    pub fn pattern_two(&self, words: &[Word]) -> Result<PatternTwoTable> {
        PatternTwoTable::compile(&self.table, words)
    }

    /// 合成 GSUB；`pattern_one` 可以来自导出文本。
    pub fn assemble(
        &self,
        pattern_one: &PatternOneRules,
        pattern_two: &PatternTwoTable,
        cmap: &Cmap,
    ) -> Result<Gsub> {
        RuleAssembler::new(&self.table, cmap, &self.glyph_options).assemble(
            pattern_one,
            pattern_two,
            &self.exceptional,
        )
    }

    pub fn glyph_plan(&self, cmap: &Cmap, glyph_order: &[String]) -> Result<GlyphPlan> {
        glyph::plan(&self.table, cmap, glyph_order, &self.glyph_options)
    }

    /// 完整编译。任一阶段失败都直接返回错误，不产生部分结果。
    pub fn compile(&self, input: CompileInput<'_>) -> Result<Compilation> {
        let pattern_one = self.pattern_one(input.single)?;
        let pattern_one_export = pattern_one.export(&self.table)?;
        let pattern_two = self.pattern_two(input.multi)?;
        let gsub = self.assemble(&pattern_one.rules(&self.table)?, &pattern_two, input.cmap)?;
        let glyphs = self.glyph_plan(input.cmap, input.glyph_order)?;
        info!(
            pattern_one = pattern_one.len(),
            pattern_two = pattern_two.patterns.len(),
            glyphs = glyphs.glyph_order.len(),
            "编译完成"
        );
        Ok(Compilation {
            pattern_one,
            pattern_one_export,
            pattern_two,
            exceptional: self.exceptional.clone(),
            gsub,
            glyphs,
        })
    }
}
