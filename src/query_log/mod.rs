//! SQL 查询日志模块
//!
//! 接收已执行的查询记录，按配置写入日志文件并上报慢查询

pub mod config;
pub mod file_name;
pub mod formatter;
pub mod record;
pub mod writer;

pub use config::QueryLogConfig;
pub use file_name::FileName;
pub use formatter::{Formatter, SlackRecord};
pub use record::{QueryRecord, RequestOrigin};
pub use writer::{BACKTRACE_UNAVAILABLE, SLOW_QUERY_SLACK_TITLE, Writer};
