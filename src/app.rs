//! 命令行应用：一次运行就是一次批改会话
//!
//! 加载文件 → 批改 → 写失败清单和预览 → 导出报告 → 统计

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ExportError;
use crate::models::{is_supported_file, FileStatus};
use crate::orchestrator::{BatchEvent, BatchProcessor, BatchSummary};
use crate::render::InteractiveView;
use crate::services::FailureWriter;
use crate::utils::logging::{log_files_loaded, log_startup, truncate_text};

/// 一次运行的输入
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 命令行给出的文件或目录
    pub inputs: Vec<PathBuf>,
    /// 报告输出路径（None 时使用配置中的路径）
    pub output: Option<PathBuf>,
    /// 每个成功文件的 HTML 预览输出目录
    pub preview_dir: Option<PathBuf>,
}

/// 应用主结构
pub struct App {
    config: Config,
    processor: BatchProcessor,
}

impl App {
    /// 初始化应用
    ///
    /// 日志文件表头和日志输出由调用方先行初始化。
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config.model_endpoint, &config.api_base_url);

        let processor = BatchProcessor::new(config.clone());
        Ok(Self { config, processor })
    }

    pub fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self, options: &RunOptions) -> Result<BatchSummary> {
        let files = collect_input_files(&options.inputs)?;
        if files.is_empty() {
            warn!("⚠️ 没有找到待批改的文件（支持 png / jpg / jpeg / pdf），程序结束");
            return Ok(BatchSummary::default());
        }

        let found = files.len();
        let added = self
            .processor
            .add_files(files.iter().map(|p| p.to_string_lossy().to_string()));
        log_files_loaded(added, found - added);

        if let Some(dir) = &options.preview_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("无法创建预览目录: {}", dir.display()))?;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = spawn_event_consumer(
            rx,
            FailureWriter::with_path(self.config.failure_log_file.clone()),
            options.preview_dir.clone(),
        );

        let api_key = self.config.api_key.clone();
        let endpoint = self.config.model_endpoint.clone();
        let outcome = self.processor.run_batch(&api_key, &endpoint, &tx).await;

        // 关闭通道，等待事件全部处理完
        drop(tx);
        if let Err(e) = consumer.await {
            error!("事件处理任务异常: {}", e);
        }

        let summary = outcome?;

        let report_path = options
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.report_path));
        match self.processor.export_report(&report_path) {
            Ok(sections) => info!("✓ 成功导出 {} 篇批改结果", sections),
            Err(ExportError::NothingToExport) => {
                warn!("⚠️ {}，跳过报告导出", ExportError::NothingToExport)
            }
            Err(e) => return Err(e).context("导出报告失败"),
        }

        if summary.failed > 0 {
            info!("失败文件已记录至: {}", self.config.failure_log_file);
        }
        info!("\n日志已保存至: {}", self.config.output_log_file);

        Ok(summary)
    }
}

/// 展开命令行输入
///
/// 目录展开为其中支持的文件（按文件名排序，不递归）；文件按给出的顺序保留。
pub fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("无法读取目录: {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_supported_file(path))
                .collect();
            entries.sort();
            info!("📁 目录 {} 中找到 {} 个文件", input.display(), entries.len());
            files.extend(entries);
        } else if is_supported_file(input) {
            files.push(input.clone());
        } else {
            warn!("⚠️ 不支持的文件类型，已忽略: {}", input.display());
        }
    }

    Ok(files)
}

/// 消费批处理事件：打印进度、写失败清单、写预览
fn spawn_event_consumer(
    mut rx: mpsc::UnboundedReceiver<BatchEvent>,
    failure_writer: FailureWriter,
    preview_dir: Option<PathBuf>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(line) = status_line(&event) {
                info!("{}", line);
            }
            match event {
                BatchEvent::Progress { percent } => info!("⏳ 进度: {}%", percent),
                BatchEvent::FileStarted { .. } => {}
                BatchEvent::FileSucceeded { file, result, .. } => {
                    if let Some(dir) = &preview_dir {
                        let view = InteractiveView::from_result(&result);
                        if let Err(e) = write_preview(dir, &file.file_name(), &view) {
                            warn!("预览写入失败: {}", e);
                        }
                    }
                }
                BatchEvent::FileFailed { file, message, .. } => {
                    warn!("[{}] {}", file, truncate_text(&message, 200));
                    if let Err(e) = failure_writer.write(file.path(), &message) {
                        error!("写入失败清单失败: {}", e);
                    }
                }
                BatchEvent::BatchCompleted { summary } => info!(
                    "🏁 批改结束: 处理 {} 个，成功 {} 个，失败 {} 个，跳过 {} 个",
                    summary.processed, summary.succeeded, summary.failed, summary.skipped
                ),
            }
        }
    })
}

/// 文件状态变化时的列表行：`[…] a.png`、`[√] a.png`、`[X] a.png`
pub fn status_line(event: &BatchEvent) -> Option<String> {
    let (status, file) = match event {
        BatchEvent::FileStarted { file, .. } => (FileStatus::Running, file),
        BatchEvent::FileSucceeded { file, .. } => (FileStatus::Succeeded, file),
        BatchEvent::FileFailed { file, .. } => (FileStatus::Failed, file),
        BatchEvent::Progress { .. } | BatchEvent::BatchCompleted { .. } => return None,
    };
    Some(format!("{} {}", status.marker(), file.file_name()))
}

/// 写出单个文件的 HTML 预览，返回写入路径
pub fn write_preview(dir: &Path, file_name: &str, view: &InteractiveView) -> Result<PathBuf> {
    let path = dir.join(format!("{}.html", file_name));
    fs::write(&path, view.to_html_page(file_name))
        .with_context(|| format!("无法写入预览: {}", path.display()))?;
    Ok(path)
}
