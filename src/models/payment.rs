// 支付链接数据模型
// 定义支付请求、网关令牌响应和支付链接生成结果

use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use std::str::FromStr;
use super::PartnerCode;

fn default_currency() -> String {
    "VND".to_string()
}

/// 支付请求
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentRequest {
    /// 合作方代码
    pub partner_code: PartnerCode,
    /// 用户名
    pub username: String,
    /// 支付金额
    pub amount: Decimal,
    /// 币种 (默认VND)
    #[serde(default = "default_currency")]
    pub currency: String,
    /// 订单描述
    #[serde(default)]
    pub order_info: String,
    /// 支付完成回跳地址 (可选，覆盖合作方默认配置)
    #[serde(default)]
    pub return_url: Option<String>,
    /// 客户端IP
    #[serde(default)]
    pub client_ip: Option<String>,
    /// 发票ID (生成交易ID后由服务端填充)
    #[serde(default, skip_deserializing)]
    pub invoice_id: Option<String>,
}

/// 网关令牌响应
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PaymentTokenResponse {
    /// 是否成功
    pub success: bool,
    /// 合作方返回的错误码
    pub partner_code: String,
    /// 合作方返回的描述
    pub partner_desc: String,
    /// 托管支付页面地址
    pub web_payment_url: Option<String>,
    /// 支付令牌
    pub payment_token: Option<String>,
}

/// 支付链接生成结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UrlGeneratorResponse {
    /// 是否成功
    pub is_success: bool,
    /// 支付链接 (成功时)
    pub url: Option<String>,
    /// 错误信息 (失败时)
    pub error_message: Option<String>,
}

impl UrlGeneratorResponse {
    /// 创建成功结果
    pub fn create(url: impl Into<String>) -> Self {
        Self {
            is_success: true,
            url: Some(url.into()),
            error_message: None,
        }
    }

    /// 创建失败结果
    pub fn failed_with(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            url: None,
            error_message: Some(message.into()),
        }
    }
}

/// 已存在交易再次请求支付链接时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatLinkPolicy {
    /// 每次都向合作方重新获取支付链接
    #[default]
    Reissue,
    /// 已有支付链接时直接返回
    Reuse,
}

impl FromStr for RepeatLinkPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reissue" => Ok(RepeatLinkPolicy::Reissue),
            "reuse" => Ok(RepeatLinkPolicy::Reuse),
            other => anyhow::bail!("Unknown repeat link policy: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_request_defaults() {
        let request: PaymentRequest = serde_json::from_str(
            r#"{"partner_code":"VNPAY","username":"nguyenvana","amount":150000,"invoice_id":"forged"}"#,
        )
        .unwrap();

        assert_eq!(request.partner_code, PartnerCode::Vnpay);
        assert_eq!(request.currency, "VND");
        assert_eq!(request.order_info, "");
        assert_eq!(request.amount, Decimal::new(150000, 0));
        assert!(request.invoice_id.is_none());
    }

    #[test]
    fn test_url_generator_response() {
        let ok = UrlGeneratorResponse::create("https://pay.example.com/t/abc");
        assert!(ok.is_success);
        assert_eq!(ok.url.as_deref(), Some("https://pay.example.com/t/abc"));
        assert!(ok.error_message.is_none());

        let failed = UrlGeneratorResponse::failed_with("Không tìm thấy VNPAY");
        assert!(!failed.is_success);
        assert!(failed.url.is_none());
    }

    #[test]
    fn test_repeat_link_policy_parse() {
        assert_eq!("reissue".parse::<RepeatLinkPolicy>().unwrap(), RepeatLinkPolicy::Reissue);
        assert_eq!("REUSE".parse::<RepeatLinkPolicy>().unwrap(), RepeatLinkPolicy::Reuse);
        assert!("cache".parse::<RepeatLinkPolicy>().is_err());
        assert_eq!(RepeatLinkPolicy::default(), RepeatLinkPolicy::Reissue);
    }
}
