//! 查询日志运行时配置
//!
//! 启动时由 [`SqlLoggerConfig`] 校验生成，之后只读，通过 `Arc` 共享。

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use regex::Regex;

use crate::model::config::SqlLoggerConfig;

use super::file_name::{date_placeholders, render_pattern};

/// 已校验的查询日志配置
#[derive(Debug, Clone)]
pub struct QueryLogConfig {
    log_directory: PathBuf,
    log_all_queries: bool,
    all_queries_pattern: Regex,
    all_queries_file_name: String,
    override_file: bool,
    log_slow_queries: bool,
    slow_queries_pattern: Regex,
    slow_log_time: f64,
    file_extension: String,
    console_suffix: String,
}

impl QueryLogConfig {
    /// 校验原始配置
    ///
    /// 正则无法编译、文件名日期格式无效或阈值非法时返回错误。
    pub fn from_settings(settings: &SqlLoggerConfig) -> anyhow::Result<Self> {
        let all_queries_pattern = Regex::new(&settings.all_queries_pattern).with_context(|| {
            format!("allQueriesPattern 无效: {}", settings.all_queries_pattern)
        })?;
        let slow_queries_pattern =
            Regex::new(&settings.slow_queries_pattern).with_context(|| {
                format!("slowQueriesPattern 无效: {}", settings.slow_queries_pattern)
            })?;

        for format in date_placeholders(&settings.all_queries_file_name) {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                anyhow::bail!(
                    "allQueriesFileName 中的日期格式无效: [{}] ({})",
                    format,
                    settings.all_queries_file_name
                );
            }
        }

        // 生成的文件名必须位于日志目录下，不能含路径分隔符
        let sample = render_pattern(&settings.all_queries_file_name, &Local::now())
            .with_context(|| {
                format!("allQueriesFileName 无法生成文件名: {}", settings.all_queries_file_name)
            })?;
        let sample = format!("{}{}{}", sample, settings.console_suffix, settings.file_extension);
        if sample.contains(['/', '\\']) {
            anyhow::bail!(
                "日志文件名不能包含路径分隔符: {} (allQueriesFileName={})",
                sample,
                settings.all_queries_file_name
            );
        }

        if !settings.slow_log_time.is_finite() || settings.slow_log_time < 0.0 {
            anyhow::bail!("slowLogTime 必须是非负数: {}", settings.slow_log_time);
        }

        // 去掉末尾的路径分隔符
        let trimmed = settings.log_directory.trim_end_matches(['/', '\\']);
        let log_directory = if trimmed.is_empty() {
            PathBuf::from(&settings.log_directory)
        } else {
            PathBuf::from(trimmed)
        };

        Ok(Self {
            log_directory,
            log_all_queries: settings.log_all_queries,
            all_queries_pattern,
            all_queries_file_name: settings.all_queries_file_name.clone(),
            override_file: settings.override_file,
            log_slow_queries: settings.log_slow_queries,
            slow_queries_pattern,
            slow_log_time: settings.slow_log_time,
            file_extension: settings.file_extension.clone(),
            console_suffix: settings.console_suffix.clone(),
        })
    }

    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    pub fn log_all_queries(&self) -> bool {
        self.log_all_queries
    }

    pub fn all_queries_pattern(&self) -> &Regex {
        &self.all_queries_pattern
    }

    pub fn all_queries_file_name(&self) -> &str {
        &self.all_queries_file_name
    }

    pub fn override_file(&self) -> bool {
        self.override_file
    }

    pub fn log_slow_queries(&self) -> bool {
        self.log_slow_queries
    }

    pub fn slow_queries_pattern(&self) -> &Regex {
        &self.slow_queries_pattern
    }

    /// 慢查询阈值（毫秒）
    pub fn slow_log_time(&self) -> f64 {
        self.slow_log_time
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    pub fn console_suffix(&self) -> &str {
        &self.console_suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_compile() {
        let config = QueryLogConfig::from_settings(&SqlLoggerConfig::default()).unwrap();
        assert_eq!(config.log_directory(), Path::new("storage/logs/sql"));
        assert!(config.all_queries_pattern().is_match("select * from users"));
        assert!(config.slow_queries_pattern().is_match(""));
        assert_eq!(config.slow_log_time(), 100.0);
    }

    #[test]
    fn test_trailing_separators_trimmed() {
        let settings = SqlLoggerConfig {
            log_directory: "/var/log/sql//".to_string(),
            ..Default::default()
        };
        let config = QueryLogConfig::from_settings(&settings).unwrap();
        assert_eq!(config.log_directory(), Path::new("/var/log/sql"));

        let settings = SqlLoggerConfig {
            log_directory: "/".to_string(),
            ..Default::default()
        };
        let config = QueryLogConfig::from_settings(&settings).unwrap();
        assert_eq!(config.log_directory(), Path::new("/"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let settings = SqlLoggerConfig {
            slow_queries_pattern: "(select".to_string(),
            ..Default::default()
        };
        let err = QueryLogConfig::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("slowQueriesPattern"));
    }

    #[test]
    fn test_invalid_date_format_rejected() {
        let settings = SqlLoggerConfig {
            all_queries_file_name: "[%Q]-log".to_string(),
            ..Default::default()
        };
        let err = QueryLogConfig::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("allQueriesFileName"));
    }

    #[test]
    fn test_offset_date_format_accepted() {
        let settings = SqlLoggerConfig {
            all_queries_file_name: "[%Y-%m-%d%z]-log".to_string(),
            ..Default::default()
        };
        assert!(QueryLogConfig::from_settings(&settings).is_ok());
    }

    #[test]
    fn test_path_separator_in_file_name_rejected() {
        for pattern in ["[%Y/%m]-log", "logs/[%Y]", "[%Y]\\log"] {
            let settings = SqlLoggerConfig {
                all_queries_file_name: pattern.to_string(),
                ..Default::default()
            };
            let err = QueryLogConfig::from_settings(&settings).unwrap_err();
            assert!(err.to_string().contains("路径分隔符"), "{}", pattern);
        }

        let settings = SqlLoggerConfig {
            file_extension: "/x.sql".to_string(),
            ..Default::default()
        };
        assert!(QueryLogConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let settings = SqlLoggerConfig {
            slow_log_time: -1.0,
            ..Default::default()
        };
        assert!(QueryLogConfig::from_settings(&settings).is_err());
    }
}
