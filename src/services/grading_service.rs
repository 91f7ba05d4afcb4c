//! 作文批改服务 - 业务能力层
//!
//! 只负责"图片 → 批改结果"能力，不关心批次和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如火山引擎方舟、Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GradingError;
use crate::infrastructure::ImagePayload;
use crate::models::GradingResult;
use crate::services::rubric::{RUBRIC_PROMPT, USER_INSTRUCTION};

/// 解析失败时保留的原始内容长度（字符）
pub const RESPONSE_EXCERPT_CHARS: usize = 200;

/// 批改能力
///
/// 输入标准化后的图片载荷，输出结构化结果或类型化错误。
/// 其他组件只依赖这个 trait，不依赖具体的传输细节。
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(&self, payload: &ImagePayload) -> Result<GradingResult, GradingError>;
}

/// 基于 Chat Completions 的批改服务
///
/// 职责：
/// - 发送评分标准 + 作文图片
/// - 清理并解析模型返回的 JSON
/// - 不出现文件列表
/// - 不关心处理顺序
pub struct LlmGradingService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
}

impl LlmGradingService {
    /// 创建新的批改服务
    ///
    /// # 参数
    /// - `config`: 提供 API 地址和采样温度
    /// - `api_key`: 本次会话的 API Key
    /// - `endpoint`: 接入点 ID（模型名称）
    pub fn new(config: &Config, api_key: &str, endpoint: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: endpoint.to_string(),
            temperature: config.temperature,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `imgs`: 图片 URL 列表（可以是 data URI），会追加到用户消息中
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已 trim）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        imgs: &[String],
    ) -> Result<String, GradingError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符, 图片 {} 张", user_message.len(), imgs.len());

        let build_error = |e: async_openai::error::OpenAIError| {
            GradingError::transport(&self.model_name, format!("构建请求失败: {}", e))
        };

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(build_error)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if imgs.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(build_error)?
        } else {
            // Vision API：文本 + 图片
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                vec![ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: user_message.to_string(),
                    },
                )];

            for url in imgs {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            detail: None,
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
                .map_err(build_error)?
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 低随机性，保证 JSON 格式稳定
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(build_error)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            GradingError::transport(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| GradingError::transport(&self.model_name, "LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Grader for LlmGradingService {
    async fn grade(&self, payload: &ImagePayload) -> Result<GradingResult, GradingError> {
        debug!(
            "提交批改 (模型: {})，图片 {}x{}，载荷 {} 字节",
            self.model_name,
            payload.width,
            payload.height,
            payload.base64_jpeg.len()
        );

        let response = self
            .send_to_llm(USER_INSTRUCTION, Some(RUBRIC_PROMPT), &[payload.data_uri()])
            .await?;

        parse_grading_response(&response)
    }
}

/// 清理 Markdown 代码块标记
///
/// 依次移除所有 "```json" 与 "```"，再去掉首尾空白。
pub fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// 解析模型返回的批改结果
///
/// 只要求顶层是 JSON 对象，字段缺失不视为错误。
/// 解析失败时附带清理后内容的前 200 个字符。
pub fn parse_grading_response(raw: &str) -> Result<GradingResult, GradingError> {
    let content = strip_code_fences(raw);
    let parse_error = || GradingError::ResponseParse {
        excerpt: content.chars().take(RESPONSE_EXCERPT_CHARS).collect(),
    };

    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        debug!("JSON 解析失败: {}", e);
        parse_error()
    })?;

    if !value.is_object() {
        return Err(parse_error());
    }

    serde_json::from_value(value).map_err(|e| {
        debug!("JSON 结构不符合批改结果: {}", e);
        parse_error()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ContentFeedback, FeedbackDetail, LanguageFeedback, Scores, SentenceCorrection,
    };

    fn sample_result() -> GradingResult {
        GradingResult {
            recognized_text: Some("Dear Tom,\nI am writing to invite you...".to_string()),
            essay_type: Some("应用文".to_string()),
            scores: Some(Scores {
                dim1_score: Some(4),
                dim2_score: Some(3),
                dim3_score: Some(4),
                total: Some(11),
            }),
            feedback_detail: Some(FeedbackDetail {
                content: Some(ContentFeedback {
                    weakness: Some("缺少活动时间".to_string()),
                    suggestion: Some("补充具体安排".to_string()),
                }),
                language: Some(LanguageFeedback {
                    sentence_corrections: vec![SentenceCorrection {
                        original: Some("I can relate you pain of it.".to_string()),
                        revised: Some("I can relate to your pain.".to_string()),
                        explanation: Some("relate to 是固定搭配".to_string()),
                    }],
                    general_comment: Some("语言基本准确".to_string()),
                }),
                structure: Some("结构清晰".to_string()),
                overall_summary: Some("整体良好".to_string()),
            }),
            revised_version: Some("Dear Tom, ...".to_string()),
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_fenced_response_round_trip() {
        let expected = sample_result();
        let raw = format!(
            "```json\n{}\n```",
            serde_json::to_string_pretty(&expected).unwrap()
        );
        let parsed = parse_grading_response(&raw).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_partial_response_is_accepted() {
        let parsed = parse_grading_response(r#"{"essay_type": "读后续写"}"#).unwrap();
        assert_eq!(parsed.essay_type(), Some("读后续写"));
        assert!(parsed.scores.is_none());
    }

    #[test]
    fn test_wrong_field_types_do_not_fail_the_file() {
        let parsed = parse_grading_response(
            r#"{"recognized_text":"Dear Tom","scores":{"dim1_score":4,"total":"11/15"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.scores().total, Some(11));
        assert_eq!(parsed.scores().dim1_score, Some(4));

        let parsed =
            parse_grading_response(r#"{"recognized_text":["para 1","para 2"]}"#).unwrap();
        assert_eq!(parsed.recognized_text(), Some("para 1\npara 2"));

        let parsed = parse_grading_response(
            r#"{"feedback_detail":{"language":{"sentence_corrections":{"original":"a","revised":"b"}}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.sentence_corrections().len(), 1);
    }

    #[test]
    fn test_non_json_response_keeps_excerpt() {
        let raw = format!("抱歉，我无法识别这张图片。{}", "x".repeat(500));
        let err = parse_grading_response(&raw).unwrap_err();
        match err {
            GradingError::ResponseParse { excerpt } => {
                assert_eq!(excerpt.chars().count(), RESPONSE_EXCERPT_CHARS);
                assert!(excerpt.starts_with("抱歉"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_json_is_parse_error() {
        let err = parse_grading_response(r#"{"recognized_text": "Dear"#).unwrap_err();
        assert!(matches!(err, GradingError::ResponseParse { .. }));
        assert!(err.to_string().contains("原始内容片段"));
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert!(parse_grading_response("[]").is_err());
        assert!(parse_grading_response("\"ok\"").is_err());
    }

    /// 测试真实接口调用
    ///
    /// 运行方式：
    /// ```bash
    /// ESSAY_API_KEY=... ESSAY_MODEL_ENDPOINT=ep-... cargo test test_live_grading -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_live_grading() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let service = LlmGradingService::new(&config, &config.api_key, &config.model_endpoint);

        let response = service
            .send_to_llm("用一句话介绍你自己", Some("你是一个简洁的助手。"), &[])
            .await;

        match response {
            Ok(text) => {
                println!("LLM 响应: {}", text);
                assert!(!text.is_empty());
            }
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }
}
