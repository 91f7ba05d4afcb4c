//! tracing 日志初始化
//!
//! 控制台输出 + 可选的日志文件输出（追加到 `init_log_file` 写好的表头之后）。

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 初始化日志（仅控制台）
///
/// 默认级别为 info，可通过 `RUST_LOG` 覆盖。
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(false))
        .try_init();
}

/// 初始化日志（控制台 + 日志文件）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `verbose`: 是否输出 debug 级别日志
pub fn init_with_file(log_file_path: &str, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("日志系统已初始化")?;

    Ok(())
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
