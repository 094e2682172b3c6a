//! 从 JSON Lines 读取已执行的查询并交给 `Writer` 处理

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;

use sql_logger::http_client::ProxyConfig;
use sql_logger::ingest::process;
use sql_logger::model::config::Config;
use sql_logger::notification::{
    CapturedBacktrace, DisabledSink, NotificationSink, SlackNotifier,
};
use sql_logger::query_log::{FileName, Formatter, QueryLogConfig, Writer};

#[derive(Parser, Debug)]
#[command(name = "sql-logger-rs", version, about = "SQL 查询日志与慢查询通知")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = Config::default_config_path())]
    config: PathBuf,

    /// 查询输入文件（JSON Lines），缺省时读取 stdin
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    config.apply_env_overrides()?;
    if let Some(path) = config.config_path() {
        tracing::info!("配置文件: {}", path.display());
    }
    let query_config = Arc::new(QueryLogConfig::from_settings(&config.sql_logger)?);

    let slack = match &config.slack {
        Some(slack) => {
            let proxy = ProxyConfig::from_config(&config);
            Some(Arc::new(SlackNotifier::new(slack, proxy.as_ref())?))
        }
        None => None,
    };
    let notifier: Arc<dyn NotificationSink> = match &slack {
        Some(slack) => slack.clone() as Arc<dyn NotificationSink>,
        None => Arc::new(DisabledSink),
    };
    if !notifier.has_route() {
        tracing::info!("未配置 Slack webhook，慢查询通知已禁用");
    }

    let file_name = FileName::new(&query_config);
    let mut writer = Writer::new(Formatter::new(), query_config, file_name, notifier);
    if config.sql_logger.capture_backtrace {
        writer = writer.with_backtrace(Arc::new(CapturedBacktrace::default()));
    }

    tracing::info!(directory = %writer.directory().display(), "SQL 日志已启动");

    let processed = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("打开输入文件失败: {}", path.display()))?;
            process(&writer, BufReader::new(file)).await?
        }
        None => process(&writer, BufReader::new(tokio::io::stdin())).await?,
    };

    if let Some(slack) = slack {
        slack.shutdown().await;
    }

    tracing::info!(processed, "处理完成");
    Ok(())
}
