//! Slack 通知模块
//!
//! 通过 Incoming Webhook 发送 attachment 形式的通知。
//! 使用 mpsc channel 解耦同步调用与异步 HTTP 发送，发送失败只记录日志。

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::http_client::{ProxyConfig, build_client};
use crate::model::config::SlackConfig;

use super::{NotificationSink, SlackNotification};

/// channel 容量，Slack 故障时超出部分直接丢弃
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Serialize)]
struct SlackPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_emoji: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'static str>,
    attachments: Vec<SlackAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment<'a> {
    color: &'static str,
    title: &'a str,
    fields: Vec<SlackField<'a>>,
    ts: i64,
}

#[derive(Debug, Serialize)]
struct SlackField<'a> {
    value: &'a str,
    short: bool,
}

/// 发送上下文（传入 consume_loop）
struct SendContext {
    url: String,
    channel: Option<String>,
    username: Option<String>,
    icon_emoji: Option<String>,
    client: reqwest::Client,
}

/// Slack 通知器
///
/// 必须在 tokio runtime 内创建；`dispatch` 不阻塞，可从同步代码调用。
pub struct SlackNotifier {
    webhook_url: String,
    sender: Mutex<Option<mpsc::Sender<SlackNotification>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SlackNotifier {
    /// 创建新的 SlackNotifier，启动后台消费任务
    pub fn new(config: &SlackConfig, proxy: Option<&ProxyConfig>) -> anyhow::Result<Self> {
        let client = build_client(proxy, config.timeout_secs)?;
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let ctx = SendContext {
            url: config.webhook_url.trim().to_string(),
            channel: config.channel.clone(),
            username: config.username.clone(),
            icon_emoji: config.icon_emoji.clone(),
            client,
        };
        let worker = tokio::spawn(Self::consume_loop(ctx, rx));
        Ok(Self {
            webhook_url: config.webhook_url.clone(),
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// 后台消费循环
    async fn consume_loop(ctx: SendContext, mut rx: mpsc::Receiver<SlackNotification>) {
        while let Some(notification) = rx.recv().await {
            let body = Self::render_body(&ctx, &notification);
            let request = ctx
                .client
                .post(&ctx.url)
                .header("Content-Type", "application/json")
                .body(body);

            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::info!("Slack 通知已发送: {}", notification.attachment_title);
                }
                Ok(resp) => {
                    tracing::warn!(
                        "Slack 通知发送失败: HTTP {} ({})",
                        resp.status(),
                        notification.attachment_title
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Slack 通知发送失败: {} ({})",
                        e,
                        notification.attachment_title
                    );
                }
            }
        }
        tracing::debug!("Slack 通知消费循环已退出");
    }

    /// 渲染 webhook body
    fn render_body(ctx: &SendContext, notification: &SlackNotification) -> String {
        let payload = SlackPayload {
            channel: ctx.channel.as_deref(),
            username: ctx.username.as_deref(),
            icon_emoji: ctx.icon_emoji.as_deref(),
            text: notification.is_announced.then_some("<!channel>"),
            attachments: vec![SlackAttachment {
                color: notification.level.color(),
                title: &notification.attachment_title,
                fields: notification
                    .fields
                    .iter()
                    .map(|value| SlackField {
                        value,
                        short: false,
                    })
                    .collect(),
                ts: chrono::Utc::now().timestamp(),
            }],
        };
        serde_json::to_string(&payload).unwrap_or_default()
    }

    /// 关闭 channel 并等待已排队的通知发送完毕
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::warn!("Slack 通知任务异常退出: {}", e);
            }
        }
    }
}

impl NotificationSink for SlackNotifier {
    fn has_route(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }

    fn dispatch(&self, notification: SlackNotification) {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => {
                if let Err(e) = tx.try_send(notification) {
                    tracing::warn!("Slack 通知入队失败（channel 已满或已关闭）: {}", e);
                }
            }
            None => tracing::warn!("Slack 通知器已关闭，丢弃通知"),
        }
    }
}
