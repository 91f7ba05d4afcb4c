//! 批改结果数据结构
//!
//! 模型返回的 JSON 结构不保证完整，所有字段都是可选的：
//! 缺失字段在展示时使用占位符，而不是拒绝整个结果。
//! 字段类型不符时同样不报错：文本字段尽量转成文本，分数取开头的数字，其余视为缺失。

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 一篇作文的批改结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    /// OCR 识别原文
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub recognized_text: Option<String>,
    /// 作文类型（应用文 / 读后续写）
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub essay_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient", skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
    #[serde(default, deserialize_with = "deserialize_lenient", skip_serializing_if = "Option::is_none")]
    pub feedback_detail: Option<FeedbackDetail>,
    /// 满分范文
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub revised_version: Option<String>,
}

/// 三个维度得分与总分
///
/// `total` 不做校验，可能与三项之和不一致。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    /// 内容要点（0-5）
    #[serde(default, deserialize_with = "deserialize_score", skip_serializing_if = "Option::is_none")]
    pub dim1_score: Option<i64>,
    /// 语言表达（0-5）
    #[serde(default, deserialize_with = "deserialize_score", skip_serializing_if = "Option::is_none")]
    pub dim2_score: Option<i64>,
    /// 结构衔接（0-5）
    #[serde(default, deserialize_with = "deserialize_score", skip_serializing_if = "Option::is_none")]
    pub dim3_score: Option<i64>,
    /// 总分（0-15）
    #[serde(default, deserialize_with = "deserialize_score", skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDetail {
    #[serde(default, deserialize_with = "deserialize_lenient", skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentFeedback>,
    #[serde(default, deserialize_with = "deserialize_lenient", skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageFeedback>,
    /// 结构评价
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    /// 整体总结
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub overall_summary: Option<String>,
}

/// 内容要点：不足与建议
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentFeedback {
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub weakness: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// 语言表达：逐句修改与整体评价
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageFeedback {
    #[serde(default, deserialize_with = "deserialize_corrections")]
    pub sentence_corrections: Vec<SentenceCorrection>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub general_comment: Option<String>,
}

/// 单句修改（原句 / 修改 / 解析）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceCorrection {
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub revised: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

// ========== 展示层统一的字段访问 ==========

impl GradingResult {
    pub fn recognized_text(&self) -> Option<&str> {
        self.recognized_text.as_deref()
    }

    pub fn essay_type(&self) -> Option<&str> {
        self.essay_type.as_deref()
    }

    pub fn revised_version(&self) -> Option<&str> {
        self.revised_version.as_deref()
    }

    /// 得分（缺失时返回全空的得分）
    pub fn scores(&self) -> Scores {
        self.scores.clone().unwrap_or_default()
    }

    pub fn weakness(&self) -> Option<&str> {
        self.content_feedback().and_then(|c| c.weakness.as_deref())
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.content_feedback().and_then(|c| c.suggestion.as_deref())
    }

    /// 逐句修改列表（缺失时为空）
    pub fn sentence_corrections(&self) -> &[SentenceCorrection] {
        self.language_feedback()
            .map(|l| l.sentence_corrections.as_slice())
            .unwrap_or(&[])
    }

    pub fn general_comment(&self) -> Option<&str> {
        self.language_feedback().and_then(|l| l.general_comment.as_deref())
    }

    pub fn structure(&self) -> Option<&str> {
        self.feedback_detail.as_ref().and_then(|f| f.structure.as_deref())
    }

    pub fn overall_summary(&self) -> Option<&str> {
        self.feedback_detail
            .as_ref()
            .and_then(|f| f.overall_summary.as_deref())
    }

    fn content_feedback(&self) -> Option<&ContentFeedback> {
        self.feedback_detail.as_ref().and_then(|f| f.content.as_ref())
    }

    fn language_feedback(&self) -> Option<&LanguageFeedback> {
        self.feedback_detail.as_ref().and_then(|f| f.language.as_ref())
    }
}

// ========== 宽松反序列化 ==========

/// 文本字段：字符串原样保留，数字和布尔值转为文本，数组按行拼接
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_text))
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => {
            let lines: Vec<String> = items.into_iter().filter_map(value_to_text).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        object @ Value::Object(_) => Some(object.to_string()),
    }
}

/// 分数：整数、小数（四舍五入）、数字开头的字符串（如 "11/15"、"4分"），其他视为缺失
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| value_to_score(&v)))
}

fn value_to_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
            .or_else(|| number.as_f64().map(|v| v.round() as i64)),
        Value::String(text) => leading_number(text),
        _ => None,
    }
}

fn leading_number(text: &str) -> Option<i64> {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(text.len());
    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
}

/// 嵌套对象：类型不符时视为缺失
fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| serde_json::from_value(v).ok()))
}

/// 逐句修改：`null` 视为空列表，单个对象视为只有一条，非对象元素忽略
fn deserialize_corrections<'de, D>(deserializer: D) -> Result<Vec<SentenceCorrection>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(object @ Value::Object(_)) => vec![object],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
