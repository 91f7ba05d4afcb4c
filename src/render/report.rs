//! 汇总报告
//!
//! 先把所有成功结果投影为与格式无关的 `ReportDocument`，再交给 `docx_writer` 写盘。
//! 每个成功文件一个章节，按文件列表顺序排列，失败文件不出现在报告中。

use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::models::{GradingResult, InputFile};
use crate::render::{docx_writer, format_score, or_placeholder, MISSING_ESSAY};

/// 报告中逐句修改为空时的提示
pub const NO_CORRECTIONS: &str = "暂无具体修改建议。";

pub const COLOR_GREY: &str = "646464";
pub const COLOR_GREEN: &str = "008000";
pub const COLOR_BLUE: &str = "0000FF";
pub const COLOR_RED: &str = "FF0000";

/// 一段带格式的文字
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    /// 十六进制 RGB，如 "FF0000"
    pub color: Option<&'static str>,
    /// 字号（磅）
    pub size_pt: Option<u32>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, hex: &'static str) -> Self {
        self.color = Some(hex);
        self
    }

    pub fn size(mut self, pt: u32) -> Self {
        self.size_pt = Some(pt);
        self
    }
}

/// 报告中的块级元素
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<Run> },
    Bullet { text: String },
    /// 按行排列的单元格文本
    Table { rows: Vec<Vec<String>> },
    PageBreak,
}

impl Block {
    fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Block::Paragraph {
            runs: vec![Run::plain(text)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDocument {
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    /// 章节数（每个文件一个一级标题）
    pub fn section_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Heading { level: 1, .. }))
            .count()
    }

    /// 所有标题文本，按出现顺序
    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// 构建汇总报告
///
/// # 参数
/// - `entries`: 按文件列表顺序排列的成功结果
pub fn build_report(entries: &[(&InputFile, &GradingResult)]) -> ReportDocument {
    let mut doc = ReportDocument::default();
    for (file, result) in entries {
        push_section(&mut doc.blocks, file, result);
    }
    doc
}

/// 构建并写出 .docx 报告
///
/// # 返回
/// 写入的章节数
pub fn export_report(
    entries: &[(&InputFile, &GradingResult)],
    path: &Path,
) -> Result<usize, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let doc = build_report(entries);
    docx_writer::write_docx(&doc, path)?;

    let sections = doc.section_count();
    info!("📝 报告已导出: {} ({} 篇)", path.display(), sections);
    Ok(sections)
}

fn push_section(blocks: &mut Vec<Block>, file: &InputFile, result: &GradingResult) {
    blocks.push(Block::heading(1, format!("文件：{}", file.file_name())));

    blocks.push(Block::heading(2, "OCR 识别原文"));
    blocks.push(Block::text(or_placeholder(result.recognized_text())));

    // 评分表
    let scores = result.scores();
    blocks.push(Block::heading(2, "评分详情"));
    blocks.push(Block::Table {
        rows: vec![
            vec![
                "维度".to_string(),
                "内容要点".to_string(),
                "语言表达".to_string(),
                "结构衔接".to_string(),
            ],
            vec![
                "得分".to_string(),
                format_score(scores.dim1_score),
                format_score(scores.dim2_score),
                format_score(scores.dim3_score),
            ],
        ],
    });
    blocks.push(Block::Paragraph {
        runs: vec![Run::plain(format!("总分：{}/15", format_score(scores.total)))
            .bold()
            .color(COLOR_RED)
            .size(14)],
    });

    blocks.push(Block::heading(3, "一、内容要点"));
    blocks.push(Block::Bullet {
        text: format!("不足：{}", or_placeholder(result.weakness())),
    });
    blocks.push(Block::Bullet {
        text: format!("建议：{}", or_placeholder(result.suggestion())),
    });

    blocks.push(Block::heading(3, "二、语言表达与逐句修改"));
    let corrections = result.sentence_corrections();
    if corrections.is_empty() {
        blocks.push(Block::text(NO_CORRECTIONS));
    }
    for (i, item) in corrections.iter().enumerate() {
        blocks.push(Block::Paragraph {
            runs: vec![
                Run::plain(format!("{}. 原句：", i + 1)).bold(),
                Run::plain(or_placeholder(item.original.as_deref())).color(COLOR_GREY),
            ],
        });
        blocks.push(Block::Paragraph {
            runs: vec![
                Run::plain("   修改：").bold(),
                Run::plain(or_placeholder(item.revised.as_deref()))
                    .bold()
                    .color(COLOR_GREEN),
            ],
        });
        blocks.push(Block::Paragraph {
            runs: vec![
                Run::plain("   解析：").bold(),
                Run::plain(or_placeholder(item.explanation.as_deref())).color(COLOR_BLUE),
            ],
        });
        blocks.push(Block::Paragraph { runs: Vec::new() });
    }

    blocks.push(Block::heading(3, "三、结构与整体总结"));
    blocks.push(Block::text(format!(
        "结构评价：{}",
        or_placeholder(result.structure())
    )));
    blocks.push(Block::text(format!(
        "整体总结：{}",
        or_placeholder(result.overall_summary())
    )));

    blocks.push(Block::heading(2, "满分范文参考"));
    blocks.push(Block::text(result.revised_version().unwrap_or(MISSING_ESSAY)));

    blocks.push(Block::PageBreak);
}
