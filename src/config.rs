use crate::error::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 默认配置文件名（存在时自动加载）
pub const DEFAULT_CONFIG_FILE: &str = "essay_grader.toml";

/// 程序配置
///
/// 优先级：命令行 > 环境变量 > TOML 配置文件 > 默认值。
/// API Key 只在本次会话中使用，不会写入也不会从配置文件读取。
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型配置 ---
    #[serde(skip)]
    pub api_key: String,
    /// 接入点 ID（模型名称）
    pub model_endpoint: String,
    pub api_base_url: String,
    pub temperature: f32,
    // --- 图片预处理 ---
    /// 图片长边上限（像素）
    pub max_image_edge: u32,
    pub jpeg_quality: u8,
    /// PDF 首页渲染 DPI
    pub pdf_render_dpi: u32,
    // --- 输出 ---
    pub report_path: String,
    /// 失败文件清单
    pub failure_log_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_endpoint: String::new(),
            api_base_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
            temperature: 0.2,
            max_image_edge: 2048,
            jpeg_quality: 85,
            pdf_render_dpi: 200,
            report_path: "高考作文批改报告.docx".to_string(),
            failure_log_file: "failed.txt".to_string(),
            output_log_file: "grading_log.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model_endpoint", &self.model_endpoint)
            .field("api_base_url", &self.api_base_url)
            .field("temperature", &self.temperature)
            .field("max_image_edge", &self.max_image_edge)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("pdf_render_dpi", &self.pdf_render_dpi)
            .field("report_path", &self.report_path)
            .field("failure_log_file", &self.failure_log_file)
            .field("output_log_file", &self.output_log_file)
            .field("verbose_logging", &self.verbose_logging)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 加载配置：TOML 文件（可选）+ 环境变量
    ///
    /// 未指定路径时，若当前目录存在 `essay_grader.toml` 则加载它。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let file_load = |reason: String| ConfigError::FileLoad {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| file_load(e.to_string()))?;
        Self::from_toml_str(&content).map_err(|e| file_load(e.to_string()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            api_key: std::env::var("ESSAY_API_KEY").unwrap_or(default.api_key),
            model_endpoint: std::env::var("ESSAY_MODEL_ENDPOINT").unwrap_or(default.model_endpoint),
            api_base_url: std::env::var("ESSAY_API_BASE_URL").unwrap_or(default.api_base_url),
            temperature: std::env::var("ESSAY_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.temperature),
            max_image_edge: std::env::var("ESSAY_MAX_IMAGE_EDGE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_image_edge),
            jpeg_quality: std::env::var("ESSAY_JPEG_QUALITY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.jpeg_quality),
            pdf_render_dpi: std::env::var("ESSAY_PDF_DPI").ok().and_then(|v| v.parse().ok()).unwrap_or(default.pdf_render_dpi),
            report_path: std::env::var("ESSAY_REPORT_PATH").unwrap_or(default.report_path),
            failure_log_file: std::env::var("ESSAY_FAILURE_LOG").unwrap_or(default.failure_log_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_grading_contract() {
        let config = Config::default();
        assert_eq!(config.max_image_edge, 2048);
        assert_eq!(config.jpeg_quality, 85);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_toml_partial_override() {
        let config = Config::from_toml_str(
            r#"
            model_endpoint = "ep-2024-vision"
            max_image_edge = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.model_endpoint, "ep-2024-vision");
        assert_eq!(config.max_image_edge, 1024);
        assert_eq!(config.jpeg_quality, 85);
    }

    #[test]
    fn test_api_key_never_read_from_or_written_to_toml() {
        let config = Config::from_toml_str(r#"api_key = "sk-secret""#).unwrap();
        assert!(config.api_key.is_empty());

        let mut config = Config::default();
        config.api_key = "sk-secret".to_string();
        let serialized = toml::to_string(&config).unwrap();
        assert!(!serialized.contains("sk-secret"));
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }

    #[test]
    fn test_from_toml_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "max_image_edge = \"wide\"").unwrap();
        let err = Config::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::FileLoad { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }
}
