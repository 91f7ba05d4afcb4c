//! 批量作文处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是一次批改会话的状态持有者，负责文件列表、结果缓存和处理调度。
//!
//! ## 核心功能
//!
//! 1. **文件管理**：按加入顺序保存文件列表，路径相同的文件只保留一个
//! 2. **配置校验**：API Key 或接入点为空时直接报错，不处理任何文件
//! 3. **顺序处理**：严格按列表顺序、同一时间只处理一个文件
//! 4. **失败隔离**：单个文件失败只标记为失败，批次继续
//! 5. **结果缓存**：已有结果（成功或失败）的文件再次运行时跳过
//! 6. **事件通知**：进度、开始、成功、失败、完成
//!
//! ## 设计特点
//!
//! - **单一所有者**：缓存只在编排任务中修改，后台任务只通过 oneshot 交回结果
//! - **向下委托**：单个文件的处理委托给 `EssayFlow`

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, ExportError};
use crate::infrastructure::ImageNormalizer;
use crate::models::{CacheEntry, FailureMarker, FileStatus, GradingResult, InputFile};
use crate::render::report;
use crate::services::{Grader, LlmGradingService};
use crate::utils::logging::{log_batch_start, log_file_start, print_final_stats};
use crate::workflow::{EssayCtx, EssayFlow};

/// 批处理事件（供界面或日志消费）
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// 进度百分比：文件开始前为 index / total * 100，全部完成后为 100
    Progress { percent: u32 },
    FileStarted { index: usize, file: InputFile },
    FileSucceeded {
        index: usize,
        file: InputFile,
        result: GradingResult,
    },
    FileFailed {
        index: usize,
        file: InputFile,
        message: String,
    },
    BatchCompleted { summary: BatchSummary },
}

/// 一次运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// 本次实际处理（调用了流程）的文件数
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 因已有结果而跳过的文件数
    pub skipped: usize,
}

/// 批量作文处理器（会话上下文）
pub struct BatchProcessor {
    config: Config,
    normalizer: Arc<ImageNormalizer>,
    files: Vec<InputFile>,
    cache: HashMap<String, CacheEntry>,
}

impl BatchProcessor {
    pub fn new(config: Config) -> Self {
        let normalizer = Arc::new(ImageNormalizer::new(&config));
        Self::with_normalizer(config, normalizer)
    }

    /// 使用自定义的图片标准化器创建
    pub fn with_normalizer(config: Config, normalizer: Arc<ImageNormalizer>) -> Self {
        Self {
            config,
            normalizer,
            files: Vec::new(),
            cache: HashMap::new(),
        }
    }

    // ========== 文件列表 ==========

    /// 加入文件，路径已存在时不做任何事
    ///
    /// # 返回
    /// 是否为新加入的文件
    pub fn add_file(&mut self, path: impl Into<String>) -> bool {
        let file = InputFile::new(path);
        if self.files.iter().any(|f| f == &file) {
            debug!("文件已在列表中，忽略: {}", file.path());
            return false;
        }
        self.files.push(file);
        true
    }

    /// 批量加入文件，返回新加入的数量
    pub fn add_files<I, S>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        paths
            .into_iter()
            .map(|p| self.add_file(p))
            .filter(|added| *added)
            .count()
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    // ========== 结果缓存 ==========

    pub fn entry(&self, path: &str) -> Option<&CacheEntry> {
        self.cache.get(path)
    }

    /// 文件当前状态
    ///
    /// 运行中的批次持有 `&mut self`，"处理中"只通过 `BatchEvent::FileStarted` 报告。
    pub fn status(&self, path: &str) -> FileStatus {
        match self.cache.get(path) {
            Some(CacheEntry::Graded(_)) => FileStatus::Succeeded,
            Some(CacheEntry::Failed(_)) => FileStatus::Failed,
            None => FileStatus::Pending,
        }
    }

    /// 清除某个文件的缓存，下次运行时会重新批改
    pub fn clear_entry(&mut self, path: &str) -> bool {
        self.cache.remove(path).is_some()
    }

    pub fn succeeded_count(&self) -> usize {
        self.cache.values().filter(|e| !e.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.cache.values().filter(|e| e.is_failed()).count()
    }

    /// 按列表顺序返回所有批改成功的结果
    pub fn graded_results(&self) -> Vec<(&InputFile, &GradingResult)> {
        self.files
            .iter()
            .filter_map(|file| {
                self.cache
                    .get(file.path())
                    .and_then(CacheEntry::as_graded)
                    .map(|result| (file, result))
            })
            .collect()
    }

    // ========== 批处理 ==========

    /// 运行批改
    ///
    /// API Key 或接入点为空时立即返回配置错误，不处理任何文件。
    pub async fn run_batch(
        &mut self,
        api_key: &str,
        endpoint: &str,
        events: &UnboundedSender<BatchEvent>,
    ) -> AppResult<BatchSummary> {
        let api_key = api_key.trim();
        let endpoint = endpoint.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingCredential.into());
        }
        if endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint.into());
        }

        let grader = LlmGradingService::new(&self.config, api_key, endpoint);
        Ok(self.run_with_grader(Arc::new(grader), events).await)
    }

    /// 使用指定的批改能力运行批改
    ///
    /// 单个文件的任何错误都只会让该文件标记为失败。
    pub async fn run_with_grader(
        &mut self,
        grader: Arc<dyn Grader>,
        events: &UnboundedSender<BatchEvent>,
    ) -> BatchSummary {
        let flow = EssayFlow::new(self.normalizer.clone(), grader);
        let total = self.files.len();
        let cached = self
            .files
            .iter()
            .filter(|f| self.cache.contains_key(f.path()))
            .count();
        let mut summary = BatchSummary::default();

        log_batch_start(total - cached, cached);

        for index in 0..total {
            let file = self.files[index].clone();

            // 已批改过（成功或失败），跳过
            if self.cache.contains_key(file.path()) {
                debug!("已有结果，跳过: {}", file.file_name());
                summary.skipped += 1;
                continue;
            }

            emit(events, BatchEvent::Progress {
                percent: progress_percent(index, total),
            });
            emit(events, BatchEvent::FileStarted {
                index,
                file: file.clone(),
            });
            log_file_start(index, total, &file.file_name());

            let outcome = match flow.spawn(EssayCtx::new(file.clone(), index, total)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AppError::worker("后台任务未返回结果")),
            };
            summary.processed += 1;

            match outcome {
                Ok(result) => {
                    summary.succeeded += 1;
                    self.cache
                        .insert(file.path().to_string(), CacheEntry::Graded(result.clone()));
                    emit(events, BatchEvent::FileSucceeded { index, file, result });
                }
                Err(e) => {
                    // 出错不中断，继续下一个
                    let message = e.to_string();
                    error!("[文件 {}] ❌ {}: {}", index + 1, file.file_name(), message);
                    summary.failed += 1;
                    self.cache.insert(
                        file.path().to_string(),
                        CacheEntry::Failed(FailureMarker {
                            message: message.clone(),
                        }),
                    );
                    emit(events, BatchEvent::FileFailed {
                        index,
                        file,
                        message,
                    });
                }
            }
        }

        print_final_stats(summary.succeeded, summary.failed, summary.skipped, total);
        info!("所有文件处理完成");

        emit(events, BatchEvent::Progress { percent: 100 });
        emit(events, BatchEvent::BatchCompleted { summary });

        summary
    }

    /// 导出所有批改成功的结果
    ///
    /// # 返回
    /// 导出的章节数
    pub fn export_report(&self, path: &Path) -> Result<usize, ExportError> {
        report::export_report(&self.graded_results(), path)
    }
}

/// 进度百分比：当前开始的文件序号 / 总数
pub fn progress_percent(index: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    (index * 100 / total) as u32
}

fn emit(events: &UnboundedSender<BatchEvent>, event: BatchEvent) {
    // 接收端关闭不影响批处理
    let _ = events.send(event);
}
