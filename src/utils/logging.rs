use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

/// 初始化日志文件（覆盖旧内容并写入表头）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n作文批改日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `model_endpoint`: 接入点 ID
/// - `api_base_url`: API 地址
pub fn log_startup(model_endpoint: &str, api_base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 高考英语作文批量批改");
    info!("🤖 接入点: {}", if model_endpoint.is_empty() { "(未设置)" } else { model_endpoint });
    info!("🌐 API 地址: {}", api_base_url);
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
///
/// # 参数
/// - `added`: 新加入的文件数量
/// - `duplicates`: 因重复被忽略的数量
pub fn log_files_loaded(added: usize, duplicates: usize) {
    info!("✓ 加入 {} 个待批改文件", added);
    if duplicates > 0 {
        info!("📋 忽略 {} 个重复文件", duplicates);
    }
    info!("💡 文件将按列表顺序逐个批改\n");
}

/// 记录批次开始信息
///
/// # 参数
/// - `pending`: 待处理数量
/// - `cached`: 已有结果（将被跳过）的数量
pub fn log_batch_start(pending: usize, cached: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批改: 待处理 {} 个，已有结果 {} 个", pending, cached);
    info!("{}", "=".repeat(60));
}

/// 记录单个文件开始信息
pub fn log_file_start(index: usize, total: usize, file_name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📄 正在处理第 {}/{} 个文件: {}", index + 1, total, file_name);
}

/// 打印最终统计信息
///
/// # 参数
/// - `succeeded`: 成功数量
/// - `failed`: 失败数量
/// - `skipped`: 跳过（已有结果）数量
/// - `total`: 总数
pub fn print_final_stats(succeeded: usize, failed: usize, skipped: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", succeeded, total);
    info!("❌ 失败: {}", failed);
    if skipped > 0 {
        info!("⏭️ 跳过: {}", skipped);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
