//! 单文件三栏视图：原文、批改详情（HTML 片段）、满分范文

use std::fmt::Write;

use quick_xml::escape::escape;

use crate::models::GradingResult;
use crate::render::{format_score, or_placeholder, MISSING_ESSAY};

/// 未批改或批改失败时原文栏的提示
pub const NOT_READY_MESSAGE: &str = "尚未批改或处理失败";

/// 逐句修改为空时的提示
pub const NO_CORRECTIONS: &str = "暂无具体句子修改建议。";

/// 选中某个文件时展示的三栏内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractiveView {
    /// 【类型】+ OCR 识别原文（纯文本）
    pub original: String,
    /// 批改详情（HTML 片段）
    pub feedback_html: String,
    /// 满分范文（纯文本）
    pub revised: String,
}

impl InteractiveView {
    pub fn from_result(result: &GradingResult) -> Self {
        Self {
            original: format!(
                "【类型】：{}\n\n{}",
                or_placeholder(result.essay_type()),
                or_placeholder(result.recognized_text())
            ),
            feedback_html: render_feedback_html(result),
            revised: result.revised_version().unwrap_or(MISSING_ESSAY).to_string(),
        }
    }

    /// 没有成功结果的文件
    pub fn not_ready() -> Self {
        Self {
            original: NOT_READY_MESSAGE.to_string(),
            ..Self::default()
        }
    }

    /// 生成独立的 HTML 页面（CLI 预览用）
    pub fn to_html_page(&self, title: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: "Times New Roman", "Microsoft YaHei", sans-serif; margin: 0; }}
.columns {{ display: flex; gap: 12px; padding: 12px; }}
.columns > section {{ flex: 1; border: 1px solid #ddd; padding: 8px; }}
.columns > section.feedback {{ flex: 2; }}
pre {{ white-space: pre-wrap; font-size: 14px; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div class="columns">
<section><h2>OCR 识别原文</h2><pre>{original}</pre></section>
<section class="feedback"><h2>深度批改 (逐句精修)</h2>
{feedback}
</section>
<section><h2>满分范文</h2><pre>{revised}</pre></section>
</div>
</body>
</html>
"#,
            title = escape(title),
            original = escape(self.original.as_str()),
            feedback = self.feedback_html,
            revised = escape(self.revised.as_str()),
        )
    }
}

fn text(value: Option<&str>) -> String {
    escape(or_placeholder(value)).into_owned()
}

fn render_feedback_html(result: &GradingResult) -> String {
    let scores = result.scores();
    let mut html = String::new();

    // write! 到 String 不会失败
    let _ = write!(
        html,
        "<h2 style='color:#333'>总分：<span style='color:#E53935; font-size:24px'>{}/15</span></h2>\n\
         <table border='1' cellpadding='6' cellspacing='0' style='border-collapse:collapse; width:100%; border-color:#ddd;'>\n\
         <tr style='background-color:#f5f5f5'><th width='33%'>内容要点</th><th width='33%'>语言表达</th><th width='33%'>结构衔接</th></tr>\n\
         <tr><td align='center'>{}/5</td><td align='center'>{}/5</td><td align='center'>{}/5</td></tr>\n\
         </table>\n",
        format_score(scores.total),
        format_score(scores.dim1_score),
        format_score(scores.dim2_score),
        format_score(scores.dim3_score),
    );

    let _ = write!(
        html,
        "<h3 style='background-color:#E3F2FD; padding:5px'>一、内容要点</h3>\n\
         <ul>\n<li><b>🔻 不足：</b> {}</li>\n<li><b>💡 建议：</b> {}</li>\n</ul>\n",
        text(result.weakness()),
        text(result.suggestion()),
    );

    html.push_str("<h3 style='background-color:#FFF3E0; padding:5px'>二、语言表达 (逐句精改)</h3>\n");
    let corrections = result.sentence_corrections();
    if corrections.is_empty() {
        let _ = writeln!(html, "<p>{}</p>", NO_CORRECTIONS);
    }
    for (idx, item) in corrections.iter().enumerate() {
        let _ = write!(
            html,
            "<div style='margin-bottom:15px; border-bottom:1px dashed #ccc; padding-bottom:10px;'>\n\
             <p style='margin:4px 0'><b>{}. 🔴 原句：</b> <span style='color:#555'>{}</span></p>\n\
             <p style='margin:4px 0'><b>🟢 修改：</b> <span style='color:#2E7D32; font-weight:bold'>{}</span></p>\n\
             <p style='margin:4px 0; color:#1565C0'><b>📘 解析：</b> {}</p>\n\
             </div>\n",
            idx + 1,
            text(item.original.as_deref()),
            text(item.revised.as_deref()),
            text(item.explanation.as_deref()),
        );
    }

    let _ = write!(
        html,
        "<p><b>整体评价：</b> {}</p>\n\
         <h3 style='background-color:#E8F5E9; padding:5px'>三、结构与衔接</h3>\n\
         <p>{}</p>\n\
         <hr>\n\
         <p><b>🌟 整体总结：</b> {}</p>\n",
        text(result.general_comment()),
        text(result.structure()),
        text(result.overall_summary()),
    );

    html
}
