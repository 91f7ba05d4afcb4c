//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次批改会话的调度和统计，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量作文处理器
//! - 持有文件列表和结果缓存（会话状态）
//! - 校验 API Key 和接入点
//! - 按顺序逐个处理文件，单个失败不影响其他文件
//! - 通过事件通道报告进度和结果
//! - 导出汇总报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<InputFile>)
//!     ↓
//! workflow::EssayFlow (处理单个文件)
//!     ↓
//! services (能力层：grading / failure_writer)
//!     ↓
//! infrastructure (基础设施：ImageNormalizer / PDFium)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一所有者**：只有编排层修改结果缓存
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不解析批改内容

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{progress_percent, BatchEvent, BatchProcessor, BatchSummary};
