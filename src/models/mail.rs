// 邮件数据模型
// 定义"发送给朋友"请求和待发送邮件

use serde::{Deserialize, Serialize};

/// 发送给朋友的请求参数
#[derive(Debug, Deserialize, Clone)]
pub struct SendFriendQuery {
    /// 商品ID
    pub id: i32,
    /// 发件人邮箱
    pub from: String,
    /// 收件人邮箱
    pub to: String,
    /// 邮件主题
    pub subject: String,
    /// 邮件正文
    pub body: String,
}

/// 待发送的邮件
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MailMessage {
    /// 发件地址 (系统配置)
    pub from: String,
    /// 回复地址
    pub reply_to: Option<String>,
    /// 收件地址
    pub to: String,
    /// 主题
    pub subject: String,
    /// HTML正文
    pub html_body: String,
}
