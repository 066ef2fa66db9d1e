// 邮件服务
// 负责"发送给朋友"邮件的组装和投递

use async_trait::async_trait;
use anyhow::{Result, Context};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use crate::messages::Messages;
use crate::models::{MailMessage, SendFriendQuery};
use crate::utils::InputValidator;

/// 邮件投递
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// 通过HTTP邮件中继投递
pub struct HttpMailer {
    client: Client,
    relay_url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    /// 创建邮件中继客户端
    ///
    /// # Arguments
    /// * `relay_url` - 中继接口地址
    /// * `api_key` - 中继鉴权密钥 (可选)
    pub fn new(relay_url: String, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, relay_url, api_key })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let mut request = self.client.post(&self.relay_url).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Failed to send mail relay request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Mail relay responded with HTTP {}", status.as_u16());
        }

        log::info!("Mail '{}' delivered to {}", message.subject, message.to);
        Ok(())
    }
}

/// 只记录日志的投递实现 (未配置中继时使用)
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        log::info!(
            "Mail relay not configured, dropping mail '{}' from {} to {}",
            message.subject, message.from, message.to
        );
        Ok(())
    }
}

/// 邮件服务
pub struct MailService {
    mailer: Arc<dyn Mailer>,
    sender: String,
    messages: Messages,
}

impl MailService {
    pub fn new(mailer: Arc<dyn Mailer>, sender: String, messages: Messages) -> Self {
        Self { mailer, sender, messages }
    }

    /// 验证"发送给朋友"参数
    pub fn validate_send_friend(query: &SendFriendQuery) -> Result<()> {
        let mut validator = InputValidator::new();
        validator.validate_email_field("from", &query.from);
        validator.validate_email_field("to", &query.to);
        validator.validate_required("subject", &query.subject);
        validator.validate_length("subject", &query.subject, 0, 200);
        validator.validate_length("body", &query.body, 0, 10_000);
        validator.into_result()
    }

    /// 组装邮件: 正文后附商品详情链接
    pub fn compose_send_friend(&self, query: &SendFriendQuery, detail_url: &str) -> MailMessage {
        MailMessage {
            from: self.sender.clone(),
            reply_to: Some(query.from.clone()),
            to: query.to.clone(),
            subject: query.subject.clone(),
            html_body: format!(
                "{}<hr/><a href='{}'>{}</a>",
                escape_html(&query.body),
                escape_html(detail_url),
                self.messages.view_details()
            ),
        }
    }

    /// 发送商品信息给朋友
    ///
    /// # Returns
    /// * 本地化的成功提示
    pub async fn send_to_friend(&self, query: &SendFriendQuery, detail_url: &str) -> Result<&'static str> {
        Self::validate_send_friend(query)?;

        let message = self.compose_send_friend(query, detail_url);
        self.mailer.send(&message).await?;

        Ok(self.messages.send_friend_success())
    }
}

/// 由站点公开地址拼接商品详情地址
///
/// `https://shop.vn/` + 7 -> `https://shop.vn/product/detail/7`
pub fn detail_url(public_base_url: &str, product_id: i32) -> String {
    format!("{}/product/detail/{}", public_base_url.trim_end_matches('/'), product_id)
}

/// 转义HTML特殊字符，用户填写的正文按纯文本放入邮件
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
