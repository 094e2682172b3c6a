//! HTTP Client 构建模块
//!
//! Input: 代理配置、超时
//! Output: reqwest::Client
//! Pos: Slack webhook 发送使用的客户端

use reqwest::{Client, Proxy};
use std::time::Duration;

use crate::model::config::Config;

/// 代理配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// 代理地址，支持 http://、https://、socks5://
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// 从应用配置中提取代理设置，未配置时返回 None
    pub fn from_config(config: &Config) -> Option<Self> {
        let url = config.proxy_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            username: config.proxy_username.clone(),
            password: config.proxy_password.clone(),
        })
    }
}

/// 构建 HTTP Client
///
/// # Arguments
/// * `proxy` - 可选的代理配置，用户名存在时附加 Basic 认证
/// * `timeout_secs` - 超时时间（秒）
pub fn build_client(proxy: Option<&ProxyConfig>, timeout_secs: u64) -> anyhow::Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));

    match proxy {
        Some(config) => {
            let mut proxy = Proxy::all(&config.url)?;
            if let Some(username) = &config.username {
                proxy = proxy.basic_auth(username, config.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(proxy);
            tracing::debug!("HTTP Client 使用代理: {}", config.url);
        }
        // 只使用配置文件中的代理，忽略 HTTP_PROXY 等环境变量
        None => builder = builder.no_proxy(),
    }

    Ok(builder.build()?)
}
