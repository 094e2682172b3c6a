//! SQL 查询日志与慢查询 Slack 通知

pub mod http_client;
pub mod ingest;
pub mod model;
pub mod notification;
pub mod query_log;
