//! # Essay Grader
//!
//! 高考英语作文批量批改：手写作文图片 / PDF → 视觉大模型评分 → 交互预览与 Word 报告
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构，外加展示层：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有平台资源（PDFium），只暴露能力
//! - `ImageNormalizer` - 图片 / PDF 首页 → 限制尺寸的 JPEG（Base64）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件
//! - `LlmGradingService` - 按评分细则调用视觉模型并解析 JSON
//! - `FailureWriter` - 写 failed.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整处理流程
//! - `EssayCtx` - 上下文封装（文件 + 序号）
//! - `EssayFlow` - 流程编排（标准化 → 批改 → 交回结果）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 会话状态、顺序调度、结果缓存、事件
//!
//! ### 展示层（Render）
//! - `render/` - 交互视图（HTML）与汇总报告（.docx）
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, RunOptions};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ImageNormalizer, ImagePayload};
pub use models::{CacheEntry, FileStatus, GradingResult, InputFile};
pub use orchestrator::{BatchEvent, BatchProcessor, BatchSummary};
pub use render::InteractiveView;
pub use services::{Grader, LlmGradingService};
pub use workflow::{EssayCtx, EssayFlow};
