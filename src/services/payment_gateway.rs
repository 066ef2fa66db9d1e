// 支付网关适配器
// 向合作方令牌接口发起单次请求，获取支付令牌和托管支付页面地址

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use crate::models::{Partner, PaymentRequest, PaymentTokenResponse};
use crate::utils::{sign_token_request, token_signing_payload};

/// 合作方表示成功的响应码
const SUCCESS_CODE: &str = "00";

/// 网关调用错误
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Partner responded with HTTP {0}")]
    Status(u16),

    #[error("Invalid token request: {0}")]
    InvalidRequest(String),
}

/// 支付网关
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// 获取支付令牌
    ///
    /// 不重试；传输错误以 `GatewayError` 返回，由调用方处理。
    async fn get_payment_token(
        &self,
        partner: &Partner,
        request: &PaymentRequest,
    ) -> Result<PaymentTokenResponse, GatewayError>;
}

/// 令牌请求报文
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    merchant_id: &'a str,
    invoice_id: &'a str,
    amount: String,
    currency: &'a str,
    order_info: &'a str,
    return_url: &'a str,
    client_ip: Option<&'a str>,
    username: &'a str,
    timestamp: i64,
    signature: String,
}

/// 令牌响应报文
#[derive(Debug, Deserialize)]
struct TokenReply {
    response_code: String,
    #[serde(default)]
    response_desc: String,
    payment_token: Option<String>,
    payment_url: Option<String>,
}

impl From<TokenReply> for PaymentTokenResponse {
    fn from(reply: TokenReply) -> Self {
        let success = reply.response_code == SUCCESS_CODE && reply.payment_url.is_some();
        PaymentTokenResponse {
            success,
            partner_code: reply.response_code,
            partner_desc: reply.response_desc,
            web_payment_url: reply.payment_url,
            payment_token: reply.payment_token,
        }
    }
}

/// 基于HTTP的网关实现
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
}

impl HttpPaymentGateway {
    /// 创建网关客户端
    ///
    /// # Arguments
    /// * `timeout` - 单次请求超时时间
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shopcart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    fn build_request<'a>(
        partner: &'a Partner,
        request: &'a PaymentRequest,
        timestamp: i64,
    ) -> Result<TokenRequest<'a>, GatewayError> {
        let invoice_id = request
            .invoice_id
            .as_deref()
            .ok_or_else(|| GatewayError::InvalidRequest("missing invoice id".to_string()))?;

        let amount = request.amount.normalize().to_string();
        let payload = token_signing_payload(
            &partner.merchant_id,
            invoice_id,
            &amount,
            &request.currency,
            timestamp,
        );
        let signature = sign_token_request(&partner.secret_key, &payload)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        Ok(TokenRequest {
            merchant_id: &partner.merchant_id,
            invoice_id,
            amount,
            currency: &request.currency,
            order_info: &request.order_info,
            return_url: request.return_url.as_deref().unwrap_or(&partner.return_url),
            client_ip: request.client_ip.as_deref(),
            username: &request.username,
            timestamp,
            signature,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn get_payment_token(
        &self,
        partner: &Partner,
        request: &PaymentRequest,
    ) -> Result<PaymentTokenResponse, GatewayError> {
        let body = Self::build_request(partner, request, chrono::Utc::now().timestamp())?;

        let response = self.client
            .post(&partner.token_url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let reply: TokenReply = response.json().await?;
        Ok(reply.into())
    }
}

/// 记录调用耗时和结果的网关装饰器
pub struct LoggingGateway<G> {
    inner: G,
}

impl<G> LoggingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: PaymentGateway> PaymentGateway for LoggingGateway<G> {
    async fn get_payment_token(
        &self,
        partner: &Partner,
        request: &PaymentRequest,
    ) -> Result<PaymentTokenResponse, GatewayError> {
        let start_time = Instant::now();
        let invoice_id = request.invoice_id.as_deref().unwrap_or("-");
        log::info!("[{}] requesting payment token for invoice {}", partner.code, invoice_id);

        let result = self.inner.get_payment_token(partner, request).await;
        let elapsed = start_time.elapsed().as_millis();

        match &result {
            Ok(token) if token.success => {
                log::info!("[{}] payment token issued for invoice {} in {}ms", partner.code, invoice_id, elapsed);
            }
            Ok(token) => {
                log::warn!(
                    "[{}] payment token refused for invoice {} in {}ms: {} ({})",
                    partner.code, invoice_id, elapsed, token.partner_desc, token.partner_code
                );
            }
            Err(e) => {
                log::error!("[{}] payment token call failed for invoice {} in {}ms: {}", partner.code, invoice_id, elapsed, e);
            }
        }

        result
    }
}
