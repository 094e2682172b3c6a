use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// SQL 日志配置（原始值，正则与日期格式在 `QueryLogConfig` 中校验）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlLoggerConfig {
    /// 日志目录
    #[serde(default = "default_log_directory")]
    pub log_directory: String,

    /// 是否记录全部查询
    #[serde(default = "default_true")]
    pub log_all_queries: bool,

    /// 全部查询的过滤正则
    #[serde(default = "default_pattern")]
    pub all_queries_pattern: String,

    /// 全部查询的日志文件名，`[...]` 内为 strftime 日期格式
    #[serde(default = "default_all_queries_file_name")]
    pub all_queries_file_name: String,

    /// 每次运行的第一条查询是否覆盖日志文件
    #[serde(default)]
    pub override_file: bool,

    /// 是否上报慢查询
    #[serde(default = "default_true")]
    pub log_slow_queries: bool,

    /// 慢查询的过滤正则
    #[serde(default = "default_pattern")]
    pub slow_queries_pattern: String,

    /// 慢查询阈值（毫秒）
    #[serde(default = "default_slow_log_time")]
    pub slow_log_time: f64,

    /// 日志文件扩展名
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// 控制台（非 HTTP）来源的文件名后缀
    #[serde(default)]
    pub console_suffix: String,

    /// 慢查询通知中是否附带调用栈
    #[serde(default)]
    pub capture_backtrace: bool,
}

fn default_log_directory() -> String {
    "storage/logs/sql".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pattern() -> String {
    "(?i).*".to_string()
}

fn default_all_queries_file_name() -> String {
    "[%Y-%m-%d]-log".to_string()
}

fn default_slow_log_time() -> f64 {
    100.0
}

fn default_file_extension() -> String {
    ".sql".to_string()
}

impl Default for SqlLoggerConfig {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            log_all_queries: true,
            all_queries_pattern: default_pattern(),
            all_queries_file_name: default_all_queries_file_name(),
            override_file: false,
            log_slow_queries: true,
            slow_queries_pattern: default_pattern(),
            slow_log_time: default_slow_log_time(),
            file_extension: default_file_extension(),
            console_suffix: String::new(),
            capture_backtrace: false,
        }
    }
}

/// Slack 通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Incoming Webhook 地址，为空时不发送通知
    #[serde(default)]
    pub webhook_url: String,

    /// 覆盖 webhook 默认频道（可选）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// 发送者名称（可选）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// 发送者图标（可选，如 `:warning:`）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,

    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            channel: None,
            username: None,
            icon_emoji: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub sql_logger: SqlLoggerConfig,

    /// Slack 通知配置（可选）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,

    /// HTTP 代理地址（可选）
    /// 支持格式: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// 代理认证用户名（可选）
    #[serde(default)]
    pub proxy_username: Option<String>,

    /// 代理认证密码（可选）
    #[serde(default)]
    pub proxy_password: Option<String>,

    /// 配置文件路径（运行时元数据，不写入 JSON）
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置
            let mut config = Self::default();
            config.config_path = Some(path.to_path_buf());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// 获取配置文件路径（如果有）
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 用进程环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// 用 `lookup` 提供的值覆盖配置
    ///
    /// 环境变量名与 `SQL_LOGGER_*` 约定一致，`SLACK_WEBHOOK_URL` 会在缺少
    /// `slack` 段时创建默认段。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sql = &mut self.sql_logger;

        if let Some(v) = lookup("SQL_LOGGER_DIRECTORY") {
            sql.log_directory = v;
        }
        if let Some(v) = lookup("SQL_LOGGER_ALL_QUERIES_ENABLED") {
            sql.log_all_queries = parse_bool("SQL_LOGGER_ALL_QUERIES_ENABLED", &v)?;
        }
        if let Some(v) = lookup("SQL_LOGGER_ALL_QUERIES_PATTERN") {
            sql.all_queries_pattern = v;
        }
        if let Some(v) = lookup("SQL_LOGGER_ALL_QUERIES_FILE_NAME") {
            sql.all_queries_file_name = v;
        }
        if let Some(v) = lookup("SQL_LOGGER_ALL_QUERIES_OVERRIDE") {
            sql.override_file = parse_bool("SQL_LOGGER_ALL_QUERIES_OVERRIDE", &v)?;
        }
        if let Some(v) = lookup("SQL_LOGGER_SLOW_QUERIES_ENABLED") {
            sql.log_slow_queries = parse_bool("SQL_LOGGER_SLOW_QUERIES_ENABLED", &v)?;
        }
        if let Some(v) = lookup("SQL_LOGGER_SLOW_QUERIES_PATTERN") {
            sql.slow_queries_pattern = v;
        }
        if let Some(v) = lookup("SQL_LOGGER_SLOW_QUERIES_MIN_EXEC_TIME") {
            sql.slow_log_time = v.trim().parse().with_context(|| {
                format!("SQL_LOGGER_SLOW_QUERIES_MIN_EXEC_TIME 不是有效数字: {}", v)
            })?;
        }
        if let Some(v) = lookup("SQL_LOGGER_LOG_EXTENSION") {
            sql.file_extension = v;
        }
        if let Some(v) = lookup("SQL_LOGGER_CONSOLE_SUFFIX") {
            sql.console_suffix = v;
        }
        if let Some(v) = lookup("SLACK_WEBHOOK_URL") {
            self.slack.get_or_insert_with(SlackConfig::default).webhook_url = v;
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("{} 不是有效的布尔值: {}", key, other),
    }
}
