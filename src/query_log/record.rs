//! 已执行查询的记录

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// 查询来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RequestOrigin {
    /// HTTP 请求
    Http {
        method: String,
        url: String,
        #[serde(default, rename = "clientIp")]
        #[serde(skip_serializing_if = "Option::is_none")]
        client_ip: Option<String>,
    },
    /// 控制台命令
    Console {
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
}

impl RequestOrigin {
    pub fn http(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Http {
            method: method.into(),
            url: url.into(),
            client_ip: None,
        }
    }

    pub fn console(command: Option<String>) -> Self {
        Self::Console { command }
    }

    pub fn is_console(&self) -> bool {
        matches!(self, Self::Console { .. })
    }
}

impl Default for RequestOrigin {
    fn default() -> Self {
        Self::Console { command: None }
    }
}

impl fmt::Display for RequestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http {
                method,
                url,
                client_ip: Some(ip),
            } => write!(f, "{} {} ({})", method, url, ip),
            Self::Http { method, url, .. } => write!(f, "{} {}", method, url),
            Self::Console { command: Some(cmd) } => write!(f, "console: {}", cmd),
            Self::Console { command: None } => f.write_str("console"),
        }
    }
}

/// 单条已执行查询
///
/// `number` 是本次运行内的序号，从 1 开始。
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    number: NonZeroU64,
    raw: String,
    time: f64,
    database: String,
    request: RequestOrigin,
}

impl QueryRecord {
    /// 创建查询记录
    ///
    /// # Panics
    /// `time` 不是有限的非负数时 panic，调用方负责传入合法值。
    pub fn new(
        number: NonZeroU64,
        raw: impl Into<String>,
        time: f64,
        database: impl Into<String>,
        request: RequestOrigin,
    ) -> Self {
        assert!(
            time.is_finite() && time >= 0.0,
            "查询耗时必须是有限的非负数: {}",
            time
        );
        Self {
            number,
            raw: raw.into(),
            time,
            database: database.into(),
            request,
        }
    }

    pub fn number(&self) -> u64 {
        self.number.get()
    }

    /// 原始 SQL（已绑定参数）
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 耗时（毫秒）
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn request(&self) -> &RequestOrigin {
        &self.request
    }
}
