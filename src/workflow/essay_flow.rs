//! 作文处理流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整处理流程
//!
//! 流程顺序：
//! 1. 图片标准化（阻塞线程池，PDFium 不是 Send）
//! 2. 模型批改
//! 3. 通过 oneshot 把结果交回编排层

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::ImageNormalizer;
use crate::models::GradingResult;
use crate::services::Grader;
use crate::workflow::essay_ctx::EssayCtx;

/// 作文处理流程
///
/// - 不持有文件列表和结果缓存
/// - 只依赖标准化能力和批改能力
#[derive(Clone)]
pub struct EssayFlow {
    normalizer: Arc<ImageNormalizer>,
    grader: Arc<dyn Grader>,
}

impl EssayFlow {
    pub fn new(normalizer: Arc<ImageNormalizer>, grader: Arc<dyn Grader>) -> Self {
        Self { normalizer, grader }
    }

    pub async fn run(&self, ctx: &EssayCtx) -> AppResult<GradingResult> {
        info!("{} 🖼️ 正在预处理图片...", ctx);

        let normalizer = self.normalizer.clone();
        let file = ctx.file.clone();
        let payload = tokio::task::spawn_blocking(move || normalizer.normalize(&file))
            .await
            .map_err(|e| AppError::worker(format!("图片预处理任务异常: {}", e)))??;

        debug!("{} 图片载荷 {}x{}", ctx, payload.width, payload.height);
        info!("{} 🤖 正在调用模型批改...", ctx);

        let result = self.grader.grade(&payload).await?;

        match result.scores.as_ref().and_then(|s| s.total) {
            Some(total) => info!("{} ✓ 批改完成，总分 {}/15", ctx, total),
            None => warn!("{} ✓ 批改完成，但模型未返回总分", ctx),
        }

        Ok(result)
    }

    /// 在后台任务中运行流程
    ///
    /// 返回的接收端只会收到一次结果；任务 panic 时发送端被丢弃，接收端得到 `RecvError`。
    pub fn spawn(&self, ctx: EssayCtx) -> oneshot::Receiver<AppResult<GradingResult>> {
        let (tx, rx) = oneshot::channel();
        let flow = self.clone();

        tokio::spawn(async move {
            let outcome = flow.run(&ctx).await;
            if tx.send(outcome).is_err() {
                debug!("{} 结果接收端已关闭，丢弃结果", ctx);
            }
        });

        rx
    }
}
