use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use essay_grader::config::Config;
use essay_grader::logger;
use essay_grader::utils::logging::init_log_file;
use essay_grader::{App, RunOptions};

/// 高考英语作文批量批改
#[derive(Parser)]
#[command(name = "essay-grader", version, about)]
struct Cli {
    /// 作文图片 / PDF 文件，或包含它们的目录
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// TOML 配置文件（默认读取当前目录的 essay_grader.toml）
    #[arg(long)]
    config: Option<PathBuf>,

    /// API Key（也可通过 ESSAY_API_KEY 提供，不会被保存）
    #[arg(long)]
    api_key: Option<String>,

    /// 接入点 ID（Endpoint）
    #[arg(long)]
    endpoint: Option<String>,

    /// API 地址
    #[arg(long)]
    api_base: Option<String>,

    /// 报告输出路径
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// HTML 预览输出目录
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// 输出 debug 级别日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置（命令行优先）
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }
    if let Some(endpoint) = cli.endpoint {
        config.model_endpoint = endpoint;
    }
    if let Some(api_base) = cli.api_base {
        config.api_base_url = api_base;
    }
    config.verbose_logging |= cli.verbose;

    // 初始化日志：先写表头，再追加 tracing 输出
    init_log_file(&config.output_log_file)?;
    logger::init_with_file(&config.output_log_file, config.verbose_logging)?;

    // 初始化并运行应用
    let mut app = App::initialize(config)?;

    app.run(&RunOptions {
        inputs: cli.files,
        output: cli.output,
        preview_dir: cli.preview_dir,
    })
    .await?;

    Ok(())
}
