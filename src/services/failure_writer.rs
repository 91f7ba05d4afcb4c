//! 失败记录服务 - 业务能力层
//!
//! 只负责"写失败清单"能力，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 失败记录服务
///
/// 职责：
/// - 将批改失败的文件及原因追加写入清单（路径来自配置）
/// - 每次只记录单个文件
pub struct FailureWriter {
    failure_file_path: String,
}

impl FailureWriter {
    /// 使用指定的清单路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            failure_file_path: path.into(),
        }
    }

    /// 写入失败信息
    ///
    /// 多行错误信息会被压成一行，保证清单每个文件一行。
    pub fn write(&self, file_path: &str, reason: &str) -> Result<()> {
        debug!("写入失败记录: {} | 原因长度: {}", file_path, reason.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.failure_file_path)?;

        let reason = reason.lines().map(str::trim).collect::<Vec<_>>().join(" ");
        let line = format!(
            "{} | 文件 {} | 原因: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            file_path,
            reason
        );

        file.write_all(line.as_bytes())?;

        Ok(())
    }
}
