//! JSON Lines 查询输入
//!
//! 每行一个查询：`{"sql": "...", "time": 12.5, "database": "app", "request": {...}}`

use std::num::NonZeroU64;

use anyhow::Context;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::query_log::{QueryRecord, RequestOrigin, Writer};

/// 输入中的一条查询
#[derive(Debug, Deserialize)]
pub struct IncomingQuery {
    pub sql: String,
    /// 耗时（毫秒）
    pub time: f64,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub request: RequestOrigin,
}

/// 逐行读取查询，按读取顺序从 1 开始编号
///
/// 空行、无法解析的行和耗时无效的行会被跳过且不占用编号；
/// 单条记录保存失败只记录日志。返回已处理的查询数。
pub async fn process<R>(writer: &Writer, reader: R) -> anyhow::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut number: u64 = 0;
    let mut line_no: u64 = 0;

    while let Some(line) = lines.next_line().await.context("读取输入失败")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let incoming: IncomingQuery = match serde_json::from_str(&line) {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!("第 {} 行不是有效的查询记录: {}", line_no, e);
                continue;
            }
        };
        if !incoming.time.is_finite() || incoming.time < 0.0 {
            tracing::warn!("第 {} 行耗时无效: {}", line_no, incoming.time);
            continue;
        }

        number += 1;
        let Some(ordinal) = NonZeroU64::new(number) else {
            continue;
        };
        let record = QueryRecord::new(
            ordinal,
            incoming.sql,
            incoming.time,
            incoming.database,
            incoming.request,
        );

        if let Err(e) = writer.save(&record) {
            tracing::error!("记录第 {} 条查询失败: {:#}", number, e);
        }
    }

    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::model::config::SqlLoggerConfig;
    use crate::notification::DisabledSink;
    use crate::query_log::{FileName, Formatter, QueryLogConfig};

    const INPUT: &[u8] = b"not json\n\n{\"sql\":\"SELECT 1\",\"time\":1}\n{\"sql\":\"SELECT 2\",\"time\":-1}\n{\"sql\":\"SELECT 3\",\"time\":2,\"database\":\"app\"}\n";

    fn writer(log_directory: &std::path::Path) -> Writer {
        let settings = SqlLoggerConfig {
            log_directory: log_directory.to_string_lossy().into_owned(),
            all_queries_file_name: "queries".to_string(),
            ..Default::default()
        };
        let config = Arc::new(QueryLogConfig::from_settings(&settings).unwrap());
        let file_name = FileName::new(&config);
        Writer::new(Formatter::new(), config, file_name, Arc::new(DisabledSink))
    }

    #[tokio::test]
    async fn test_skipped_lines_do_not_consume_ordinals() {
        let dir = tempfile::tempdir().unwrap();
        let log_directory = dir.path().join("nested").join("sql");
        let writer = writer(&log_directory);

        let processed = process(&writer, INPUT).await.unwrap();
        assert_eq!(processed, 2);

        // 第一条有效记录编号为 1，目录因此被创建
        assert!(log_directory.is_dir());
        let content = std::fs::read_to_string(log_directory.join("queries.sql")).unwrap();
        assert!(content.contains("/* Query 1 - "));
        assert!(content.contains("SELECT 1;"));
        assert!(content.contains("/* Query 2 - "));
        assert!(content.contains("SELECT 3;"));
        assert!(content.contains("[app]"));
        assert!(!content.contains("SELECT 2"));
        assert!(!content.contains("/* Query 3 - "));
    }

    #[tokio::test]
    async fn test_save_errors_do_not_stop_processing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let writer = writer(&blocker.join("sql"));

        let processed = process(&writer, INPUT).await.unwrap();
        assert_eq!(processed, 2);
        assert!(!blocker.join("sql").exists());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(&dir.path().join("sql"));

        assert_eq!(process(&writer, &b""[..]).await.unwrap(), 0);
        assert!(!dir.path().join("sql").exists());
    }
}
