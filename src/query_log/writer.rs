//! 查询日志写入
//!
//! 每条查询依次执行：
//! 1. 第一条查询（`number == 1`）确保日志目录存在
//! 2. 匹配 `allQueriesPattern` 时写入日志文件
//! 3. 超过慢查询阈值且匹配 `slowQueriesPattern` 时发送 Slack 通知
//!
//! `logAllQueries = false` 时只创建目录、不写日志文件，慢查询通知不受影响。

use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::notification::{BacktraceProvider, Level, NotificationSink, SlackNotification};

use super::config::QueryLogConfig;
use super::file_name::FileName;
use super::formatter::{Formatter, SlackRecord};
use super::record::QueryRecord;

/// 慢查询通知标题
pub const SLOW_QUERY_SLACK_TITLE: &str = "スロークエリー";

/// 未配置调用栈采集时的占位文本
pub const BACKTRACE_UNAVAILABLE: &str = "未実装";

/// 查询日志写入器
pub struct Writer {
    formatter: Formatter,
    config: Arc<QueryLogConfig>,
    file_name: FileName,
    notifier: Arc<dyn NotificationSink>,
    backtrace: Option<Arc<dyn BacktraceProvider>>,
}

impl Writer {
    pub fn new(
        formatter: Formatter,
        config: Arc<QueryLogConfig>,
        file_name: FileName,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            formatter,
            config,
            file_name,
            notifier,
            backtrace: None,
        }
    }

    /// 慢查询通知附带调用栈
    pub fn with_backtrace(mut self, provider: Arc<dyn BacktraceProvider>) -> Self {
        self.backtrace = Some(provider);
        self
    }

    /// 记录一条查询
    ///
    /// 目录创建或文件写入失败时返回错误；Slack 通知失败不会返回错误。
    pub fn save(&self, query: &QueryRecord) -> anyhow::Result<()> {
        self.create_directory_if_not_exists(query.number())?;

        let line = self.formatter.line(query);
        let context = self.formatter.slack_record(query);

        let persisted = if self.should_log_query(query) {
            self.file_name
                .for_all_queries(query.request())
                .and_then(|name| self.save_line(&line, &name, self.should_override_file(query)))
        } else {
            Ok(())
        };

        if self.should_log_slow_query(query) {
            self.to_slack(&context);
        }

        persisted
    }

    /// 日志目录
    pub fn directory(&self) -> &Path {
        self.config.log_directory()
    }

    /// 每次运行只在第一条查询时创建目录，已存在时不做任何事
    fn create_directory_if_not_exists(&self, query_number: u64) -> anyhow::Result<()> {
        if query_number != 1 {
            return Ok(());
        }

        let directory = self.directory();
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o775);
        }
        builder
            .create(directory)
            .with_context(|| format!("创建日志目录失败: {}", directory.display()))?;

        tracing::debug!(directory = %directory.display(), "日志目录已就绪");
        Ok(())
    }

    fn should_log_query(&self, query: &QueryRecord) -> bool {
        self.config.log_all_queries() && self.config.all_queries_pattern().is_match(query.raw())
    }

    fn should_log_slow_query(&self, query: &QueryRecord) -> bool {
        self.config.log_slow_queries()
            && query.time() >= self.config.slow_log_time()
            && self.config.slow_queries_pattern().is_match(query.raw())
    }

    fn should_override_file(&self, query: &QueryRecord) -> bool {
        query.number() == 1 && self.config.override_file()
    }

    fn save_line(&self, line: &str, file_name: &str, override_file: bool) -> anyhow::Result<()> {
        let path: PathBuf = self.directory().join(file_name);
        let mut options = OpenOptions::new();
        options.create(true);
        if override_file {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }

        let mut file = options
            .open(&path)
            .with_context(|| format!("打开日志文件失败: {}", path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("写入日志文件失败: {}", path.display()))?;

        tracing::trace!(path = %path.display(), override_file, "查询已写入日志文件");
        Ok(())
    }

    fn to_slack(&self, context: &SlackRecord) {
        let backtrace = match &self.backtrace {
            Some(provider) => provider.formatted_backtrace(),
            None => BACKTRACE_UNAVAILABLE.to_string(),
        };

        let notification = SlackNotification::new()
            .with_level(Level::Error)
            .with_announced(false)
            .with_attachment_title(SLOW_QUERY_SLACK_TITLE)
            .with_fields(vec![slack_content(context, &backtrace)]);

        if !self.notifier.has_route() {
            tracing::debug!(database = %context.database, time = context.time, "未配置通知目标，跳过慢查询通知");
            return;
        }

        tracing::info!(database = %context.database, time = context.time, "检测到慢查询");
        self.notifier.dispatch(notification);
    }
}

/// 慢查询通知正文
pub fn slack_content(context: &SlackRecord, backtrace: &str) -> String {
    format!(
        "*database* {}\n*query* ({})\n{}\n{}\n*backTrace*\n{}\n",
        context.database, context.time, context.query, context.request, backtrace
    )
}
