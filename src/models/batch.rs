//! 批处理相关数据结构：待批改文件、缓存条目、文件状态

use crate::models::grading_result::GradingResult;
use std::fmt::Display;
use std::path::Path;

/// 支持的输入文件扩展名
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

/// 待批改文件
///
/// 以路径字符串作为唯一标识，加入批次后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputFile {
    path: String,
}

impl InputFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// 文件标识（完整路径）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 文件名（用于列表、日志和报告标题）
    pub fn file_name(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.clone())
    }

    /// 是否为 PDF（按扩展名判断，不区分大小写）
    pub fn is_pdf(&self) -> bool {
        has_extension(&self.path, "pdf")
    }
}

impl Display for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// 是否为支持的输入文件类型
pub fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

fn has_extension(path: &str, expected: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// 处理失败标记（已尝试但失败，区别于"尚未处理"）
#[derive(Debug, Clone, PartialEq)]
pub struct FailureMarker {
    pub message: String,
}

/// 结果缓存条目
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Graded(GradingResult),
    Failed(FailureMarker),
}

impl CacheEntry {
    pub fn as_graded(&self) -> Option<&GradingResult> {
        match self {
            CacheEntry::Graded(result) => Some(result),
            CacheEntry::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CacheEntry::Failed(_))
    }
}

/// 单个文件的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl FileStatus {
    /// 列表显示用的前缀标记
    pub fn marker(self) -> &'static str {
        match self {
            FileStatus::Pending => "[ ]",
            FileStatus::Running => "[…]",
            FileStatus::Succeeded => "[√]",
            FileStatus::Failed => "[X]",
        }
    }
}
