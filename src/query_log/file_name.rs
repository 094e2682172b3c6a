//! 日志文件名生成

use std::fmt::{self, Write as _};
use std::sync::LazyLock;

use chrono::{DateTime, Local, TimeZone};
use regex::Regex;

use super::config::QueryLogConfig;
use super::record::RequestOrigin;

/// 文件名中的日期占位符，如 `[%Y-%m-%d]`
static DATE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("日期占位符正则无效"));

/// 提取文件名模板中的全部日期格式
pub(crate) fn date_placeholders(pattern: &str) -> impl Iterator<Item = &str> {
    DATE_PLACEHOLDER
        .captures_iter(pattern)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// 用 `now` 替换模板中的全部日期占位符
pub(crate) fn render_pattern<Tz>(pattern: &str, now: &DateTime<Tz>) -> anyhow::Result<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut rendered = String::with_capacity(pattern.len() + 16);
    let mut last = 0;
    for caps in DATE_PLACEHOLDER.captures_iter(pattern) {
        let (Some(whole), Some(format)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        rendered.push_str(&pattern[last..whole.start()]);
        write!(rendered, "{}", now.format(format.as_str()))
            .map_err(|_| anyhow::anyhow!("日期格式无法渲染: [{}]", format.as_str()))?;
        last = whole.end();
    }
    rendered.push_str(&pattern[last..]);
    Ok(rendered)
}

/// 日志文件名生成器
#[derive(Debug, Clone)]
pub struct FileName {
    all_queries: String,
    extension: String,
    console_suffix: String,
}

impl FileName {
    pub fn new(config: &QueryLogConfig) -> Self {
        Self {
            all_queries: config.all_queries_file_name().to_string(),
            extension: config.file_extension().to_string(),
            console_suffix: config.console_suffix().to_string(),
        }
    }

    /// 全部查询日志的文件名（按当前本地时间）
    pub fn for_all_queries(&self, request: &RequestOrigin) -> anyhow::Result<String> {
        self.for_all_queries_at(&Local::now(), request)
    }

    fn for_all_queries_at<Tz>(
        &self,
        now: &DateTime<Tz>,
        request: &RequestOrigin,
    ) -> anyhow::Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let base = render_pattern(&self.all_queries, now)?;
        let suffix = if request.is_console() {
            self.console_suffix.as_str()
        } else {
            ""
        };
        Ok(format!("{}{}{}", base, suffix, self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::SqlLoggerConfig;
    use chrono::FixedOffset;

    fn file_name(pattern: &str, suffix: &str) -> FileName {
        let settings = SqlLoggerConfig {
            all_queries_file_name: pattern.to_string(),
            console_suffix: suffix.to_string(),
            ..Default::default()
        };
        FileName::new(&QueryLogConfig::from_settings(&settings).unwrap())
    }

    fn at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_date_placeholder_replaced() {
        let name = file_name("[%Y-%m-%d]-log", "")
            .for_all_queries_at(&at(), &RequestOrigin::http("GET", "/"))
            .unwrap();
        assert_eq!(name, "2026-10-19-log.sql");
    }

    #[test]
    fn test_offset_placeholder_rendered() {
        let names = file_name("[%Y-%m-%d%z]-log", "");
        let name = names
            .for_all_queries_at(&at(), &RequestOrigin::http("GET", "/"))
            .unwrap();
        assert_eq!(name, "2026-10-19+0900-log.sql");

        // 按本地时间生成也不会出错
        assert!(names.for_all_queries(&RequestOrigin::http("GET", "/")).is_ok());
    }

    #[test]
    fn test_multiple_placeholders() {
        let name = file_name("queries-[%Y]_[%m%d]-[%H]", "")
            .for_all_queries_at(&at(), &RequestOrigin::http("GET", "/"))
            .unwrap();
        assert_eq!(name, "queries-2026_1019-08.sql");
    }

    #[test]
    fn test_console_suffix_only_for_console() {
        let names = file_name("log", "-artisan");
        assert_eq!(
            names
                .for_all_queries_at(&at(), &RequestOrigin::console(None))
                .unwrap(),
            "log-artisan.sql"
        );
        assert_eq!(
            names
                .for_all_queries_at(&at(), &RequestOrigin::http("GET", "/"))
                .unwrap(),
            "log.sql"
        );
    }

    #[test]
    fn test_unrenderable_format_is_error() {
        // 无效格式在启动时就会被拒绝，这里直接验证渲染本身不 panic
        assert!(render_pattern("[%Q]-log", &at()).is_err());
    }

    #[test]
    fn test_placeholders_listed() {
        let formats: Vec<&str> = date_placeholders("[%Y]-x-[%m]").collect();
        assert_eq!(formats, vec!["%Y", "%m"]);
        assert_eq!(date_placeholders("plain").count(), 0);
    }
}
