//! 通知模块
//!
//! 定义通知发送端口 [`NotificationSink`]，Slack 实现见 [`slack`]。

pub mod backtrace;
pub mod slack;

pub use backtrace::{BacktraceProvider, CapturedBacktrace};
pub use slack::SlackNotifier;

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Info,
    Warning,
    Error,
}

impl Level {
    /// Slack attachment 颜色
    pub fn color(self) -> &'static str {
        match self {
            Level::Info => "good",
            Level::Warning => "warning",
            Level::Error => "danger",
        }
    }
}

/// 一条 Slack 通知
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlackNotification {
    pub level: Level,
    /// 是否 @channel
    pub is_announced: bool,
    pub attachment_title: String,
    pub fields: Vec<String>,
}

impl SlackNotification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_announced(mut self, is_announced: bool) -> Self {
        self.is_announced = is_announced;
        self
    }

    pub fn with_attachment_title(mut self, title: impl Into<String>) -> Self {
        self.attachment_title = title.into();
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

/// 通知发送端口
///
/// `dispatch` 必须立即返回，发送失败只记录日志。
pub trait NotificationSink: Send + Sync {
    /// 是否配置了可用的发送目标
    fn has_route(&self) -> bool;

    fn dispatch(&self, notification: SlackNotification);
}

/// 未配置通知时使用，不发送任何内容
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

impl NotificationSink for DisabledSink {
    fn has_route(&self) -> bool {
        false
    }

    fn dispatch(&self, _notification: SlackNotification) {
        tracing::debug!("通知未配置，丢弃通知");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let notification = SlackNotification::new()
            .with_level(Level::Error)
            .with_announced(true)
            .with_attachment_title("title")
            .with_fields(vec!["a".to_string(), "b".to_string()]);

        assert_eq!(notification.level, Level::Error);
        assert!(notification.is_announced);
        assert_eq!(notification.attachment_title, "title");
        assert_eq!(notification.fields.len(), 2);
    }

    #[test]
    fn test_level_color() {
        assert_eq!(Level::Info.color(), "good");
        assert_eq!(Level::Warning.color(), "warning");
        assert_eq!(Level::Error.color(), "danger");
    }

    #[test]
    fn test_disabled_sink_has_no_route() {
        assert!(!DisabledSink.has_route());
    }
}
