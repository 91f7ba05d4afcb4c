//! 展示层：把批改结果投影为可阅读的形式
//!
//! - `interactive` - 单个文件的三栏视图（原文 / 批改详情 HTML / 范文）
//! - `report` - 全部成功结果的汇总文档
//! - `docx_writer` - 把汇总文档写成 .docx
//!
//! 两种投影都只读 `GradingResult`，缺失字段用占位符代替。

pub mod docx_writer;
pub mod interactive;
pub mod report;

pub use interactive::InteractiveView;
pub use report::{build_report, export_report, Block, ReportDocument, Run};

/// 缺失文本或分数时的占位符
pub const PLACEHOLDER: &str = "无";

/// 缺失范文时的占位符
pub const MISSING_ESSAY: &str = "暂无";

pub(crate) fn or_placeholder(value: Option<&str>) -> &str {
    value.unwrap_or(PLACEHOLDER)
}

pub(crate) fn format_score(score: Option<i64>) -> String {
    score
        .map(|s| s.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// 各种字段组合缺失的批改结果（两种投影的测试共用）
#[cfg(test)]
pub(crate) fn partial_results() -> Vec<crate::models::GradingResult> {
    use crate::models::{
        ContentFeedback, FeedbackDetail, GradingResult, LanguageFeedback, Scores,
        SentenceCorrection,
    };

    (0u32..512)
        .map(|mask| {
            let has = |bit: u32| mask & (1 << bit) != 0;
            let dims = |score: Option<i64>| Scores {
                dim1_score: score,
                dim2_score: score,
                dim3_score: score,
                total: None,
            };
            let scores = match (has(2), has(3)) {
                (false, false) => None,
                (true, false) => Some(Scores {
                    total: Some(9),
                    ..Scores::default()
                }),
                (false, true) => Some(dims(Some(3))),
                (true, true) => Some(Scores {
                    total: Some(9),
                    ..dims(Some(3))
                }),
            };
            let feedback_detail = (4..8).any(has).then(|| FeedbackDetail {
                content: has(5).then(|| ContentFeedback {
                    weakness: Some("要点遗漏".to_string()),
                    suggestion: None,
                }),
                language: has(6).then(|| LanguageFeedback {
                    sentence_corrections: vec![SentenceCorrection::default()],
                    general_comment: None,
                }),
                structure: has(7).then(|| "衔接自然".to_string()),
                overall_summary: None,
            });

            GradingResult {
                recognized_text: has(0).then(|| "Dear Tom,".to_string()),
                essay_type: has(1).then(|| "应用文".to_string()),
                scores,
                feedback_detail,
                revised_version: has(8).then(|| "Dear Tom, ...".to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(or_placeholder(None), "无");
        assert_eq!(or_placeholder(Some("good")), "good");
        assert_eq!(format_score(Some(11)), "11");
        assert_eq!(format_score(None), "无");
    }
}
