use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use batch_core::config::AppConfig;
use batch_core::logging::{LogConfig, LogLevel, OutputFormat};
use batch_core::{OperationKind, SubmissionGate};
use batch_dispatcher::BatchScheduler;
use batch_worker::OperationDispatcher;
use clap::{Arg, ArgAction, Command};
use tracing::{debug, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;

use app::{AutoApprove, DryRunEngine, StdinGate};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("batch-scheduler")
        .version("1.0.0")
        .about("批量文档任务调度引擎")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，默认查找 config/batch.toml"),
        )
        .arg(
            Arg::new("operation")
                .short('o')
                .long("operation")
                .value_name("KIND")
                .help("操作类型")
                .value_parser(["merge", "compress", "ocr", "convert"])
                .required(true),
        )
        .arg(
            Arg::new("option")
                .long("option")
                .value_name("KEY=VALUE")
                .help("操作参数，可重复")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("跳过大批量提交确认")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty", "text"]),
        )
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .help("输入文件或目录")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);

    // 加载配置
    let mut config = AppConfig::load(config_path).with_context(|| {
        format!("加载配置失败: {}", config_path.unwrap_or("<默认路径>"))
    })?;

    // LOG_* 环境变量覆盖配置文件，命令行参数优先级最高
    config.logging = config.logging.clone().with_env_overrides()?;
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.parse::<LogLevel>()?;
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.logging.format = format.parse::<OutputFormat>()?;
    }

    // 初始化日志系统
    init_logging(&config.logging)?;

    let kind: OperationKind = matches
        .get_one::<String>("operation")
        .context("缺少操作类型")?
        .parse()?;
    let options = app::parse_options(
        matches
            .get_many::<String>("option")
            .into_iter()
            .flatten()
            .map(String::as_str),
    )?;
    let paths: Vec<PathBuf> = matches
        .get_many::<PathBuf>("paths")
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    let inputs = app::collect_inputs(&paths).await?;
    if inputs.is_empty() {
        warn!("没有找到任何输入文件");
        return Ok(());
    }

    let dispatcher = OperationDispatcher::from_config(Arc::new(DryRunEngine), &config);
    let scheduler = BatchScheduler::new(config.scheduler.clone(), Arc::new(dispatcher))?;

    let gate: Box<dyn SubmissionGate> = if matches.get_flag("yes") {
        Box::new(AutoApprove)
    } else {
        Box::new(StdinGate)
    };
    if scheduler.requires_confirmation(inputs.len()) && !gate.confirm(inputs.len(), kind).await {
        info!("用户取消了提交");
        return Ok(());
    }

    scheduler.on_progress(|progress| {
        debug!(
            current = progress.current,
            total = progress.total,
            batch_current = progress.batch_current,
            batch_total = progress.batch_total,
            "进度更新"
        );
    });
    scheduler.on_error(|item, error| {
        warn!(item = item.name(), kind = error.kind(), "处理失败: {error}");
    });

    let item_count = inputs.len();
    let position = scheduler.add_items(inputs, kind, options).await?;
    info!(items = item_count, position, operation = %kind, "已提交");

    scheduler.wait_idle().await;

    match scheduler.last_summary() {
        Some(summary) => app::print_summary(&summary, &scheduler.error_log()),
        None => warn!("未生成处理汇总"),
    }

    Ok(())
}

/// 初始化日志系统
fn init_logging(log_config: &LogConfig) -> Result<()> {
    log_config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_config.level.as_directive()));

    let writer = match (&log_config.log_file_path, log_config.enable_file_logging) {
        (Some(path), true) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("打开日志文件失败: {path}"))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        _ => BoxMakeWriter::new(std::io::stderr),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(log_config.include_target);
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_config.format {
        OutputFormat::Json => registry
            .with(layer.json())
            .try_init()
            .context("初始化JSON日志格式失败")?,
        OutputFormat::Pretty => registry
            .with(layer.pretty())
            .try_init()
            .context("初始化Pretty日志格式失败")?,
        OutputFormat::Text => registry
            .with(layer)
            .try_init()
            .context("初始化文本日志格式失败")?,
    }

    Ok(())
}
