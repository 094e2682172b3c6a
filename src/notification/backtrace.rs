//! 调用栈采集

use std::backtrace::Backtrace;

/// 调用栈提供者
pub trait BacktraceProvider: Send + Sync {
    /// 返回格式化后的调用栈文本
    fn formatted_backtrace(&self) -> String;
}

/// 使用标准库采集当前线程的调用栈
#[derive(Debug, Clone)]
pub struct CapturedBacktrace {
    max_lines: usize,
}

impl CapturedBacktrace {
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }
}

impl Default for CapturedBacktrace {
    fn default() -> Self {
        Self::new(40)
    }
}

impl BacktraceProvider for CapturedBacktrace {
    fn formatted_backtrace(&self) -> String {
        truncate_lines(&Backtrace::force_capture().to_string(), self.max_lines)
    }
}

/// 保留前 `max_lines` 行，超出部分以 `...` 结尾
fn truncate_lines(text: &str, max_lines: usize) -> String {
    let mut lines: Vec<&str> = text.lines().take(max_lines + 1).collect();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        lines.push("...");
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_marks_omitted_lines() {
        assert_eq!(truncate_lines("a\nb\nc", 2), "a\nb\n...");
        assert_eq!(truncate_lines("a\nb", 2), "a\nb");
        assert_eq!(truncate_lines("", 2), "");
    }

    #[test]
    fn test_captured_backtrace_is_bounded() {
        let text = CapturedBacktrace::new(2).formatted_backtrace();
        assert!(!text.is_empty());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() <= 3);
        // 强制采集的调用栈远超两行
        assert_eq!(lines.last(), Some(&"..."));
    }
}
