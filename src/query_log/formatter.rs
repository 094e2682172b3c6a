//! 查询记录格式化

use chrono::Local;

use super::record::QueryRecord;

const SEPARATOR: &str = "/*==================================================*/";

/// 慢查询通知上下文
#[derive(Debug, Clone, PartialEq)]
pub struct SlackRecord {
    pub database: String,
    /// 耗时（毫秒）
    pub time: f64,
    pub query: String,
    pub request: String,
}

/// 把查询记录渲染为日志行和通知上下文
#[derive(Debug, Clone, Default)]
pub struct Formatter;

impl Formatter {
    pub fn new() -> Self {
        Self
    }

    /// 渲染日志文件中的一条记录（含结尾换行）
    pub fn line(&self, query: &QueryRecord) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let sql = query.raw().trim_end().trim_end_matches(';');
        format!(
            "/* Query {} - {} [{}ms] [{}] */\n/* Origin: {} */\n{};\n{}\n",
            query.number(),
            timestamp,
            query.time(),
            query.database(),
            query.request(),
            sql,
            SEPARATOR
        )
    }

    pub fn slack_record(&self, query: &QueryRecord) -> SlackRecord {
        SlackRecord {
            database: query.database().to_string(),
            time: query.time(),
            query: query.raw().to_string(),
            request: query.request().to_string(),
        }
    }
}
