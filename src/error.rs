use thiserror::Error;

/// 应用程序错误类型
///
/// 单个文件的错误（预处理 / 批改 / 后台任务）只会让该文件标记为失败，
/// 配置错误和导出错误会直接反馈给用户。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 图片预处理错误
    #[error("图片预处理失败: {0}")]
    Preprocessing(#[from] ConversionError),
    /// 模型批改错误
    #[error("{0}")]
    Grading(#[from] GradingError),
    /// 报告导出错误
    #[error("导出失败: {0}")]
    Export(#[from] ExportError),
    /// 后台任务异常（panic 或未返回结果）
    #[error("后台任务异常: {reason}")]
    Worker { reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未填写 API Key
    #[error("请填写API Key")]
    MissingCredential,
    /// 未填写接入点 ID
    #[error("请填写Endpoint")]
    MissingEndpoint,
    /// 配置文件读取或解析失败
    #[error("无法加载配置文件 ({path}): {reason}")]
    FileLoad { path: String, reason: String },
}

/// 文件转换错误（图片解码 / PDF 渲染 / JPEG 编码）
#[derive(Debug, Error)]
pub enum ConversionError {
    /// 图片无法读取或解码
    #[error("无法加载文件内容 ({path}): {reason}")]
    Decode { path: String, reason: String },
    /// PDF 渲染组件缺失或无法加载
    #[error("PDF处理失败: {reason}\n(PDF 渲染组件未正确配置，请设置 PDFIUM_DYNAMIC_LIB_PATH 或安装 PDFium)")]
    RasterizerUnavailable { reason: String },
    /// PDF 文件本身无法渲染
    #[error("PDF处理失败: {reason}")]
    PdfRendering { reason: String },
    /// JPEG 编码失败
    #[error("JPEG编码失败: {reason}")]
    Encode { reason: String },
}

/// 模型批改错误
#[derive(Debug, Error)]
pub enum GradingError {
    /// 网络 / 鉴权 / 服务端错误，或返回内容为空
    #[error("模型接口调用失败 (模型: {model}): {reason}")]
    Transport { model: String, reason: String },
    /// 模型返回内容不是合法 JSON
    #[error("AI返回格式异常，无法解析 JSON。\n原始内容片段:\n{excerpt}")]
    ResponseParse { excerpt: String },
}

/// 报告导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 没有任何批改成功的结果
    #[error("没有可导出的数据")]
    NothingToExport,
    /// 目标文件无法创建或写入
    #[error("无法保存报告 ({path}): {reason}\n可能是文件被占用。")]
    Io { path: String, reason: String },
    /// 文档打包失败
    #[error("生成文档失败: {reason}")]
    Archive { reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建后台任务异常
    pub fn worker(reason: impl Into<String>) -> Self {
        AppError::Worker {
            reason: reason.into(),
        }
    }
}

impl GradingError {
    /// 创建模型调用失败错误
    pub fn transport(model: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        GradingError::Transport {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

impl ExportError {
    /// 创建文件写入错误
    pub fn io(path: impl Into<String>, source: impl std::fmt::Display) -> Self {
        ExportError::Io {
            path: path.into(),
            reason: source.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Archive {
            reason: err.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocessing_message_embeds_cause() {
        let err: AppError = ConversionError::Decode {
            path: "a.png".to_string(),
            reason: "unexpected EOF".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("图片预处理失败"));
        assert!(msg.contains("unexpected EOF"));
    }

    #[test]
    fn test_rasterizer_hint_is_distinct() {
        let err = ConversionError::RasterizerUnavailable {
            reason: "libpdfium.so not found".to_string(),
        };
        assert!(err.to_string().contains("PDFIUM_DYNAMIC_LIB_PATH"));

        let other = ConversionError::PdfRendering {
            reason: "encrypted".to_string(),
        };
        assert!(!other.to_string().contains("PDFIUM_DYNAMIC_LIB_PATH"));
    }

    #[test]
    fn test_config_and_export_messages() {
        assert_eq!(
            AppError::from(ConfigError::MissingCredential).to_string(),
            "配置错误: 请填写API Key"
        );
        assert_eq!(
            AppError::from(ExportError::NothingToExport).to_string(),
            "导出失败: 没有可导出的数据"
        );
    }
}
