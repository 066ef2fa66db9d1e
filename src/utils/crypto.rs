// 签名工具函数
// 为支付网关令牌请求生成HMAC-SHA256签名

use hmac::{Hmac, Mac};
use sha2::Sha256;
use anyhow::{Result, Context};

type HmacSha256 = Hmac<Sha256>;

/// 签名字段分隔符
const FIELD_SEPARATOR: &str = "|";

/// 生成HMAC-SHA256签名
///
/// # Arguments
/// * `message` - 要签名的消息
/// * `secret` - 签名密钥
///
/// # Returns
/// * 十六进制格式的签名字符串
pub fn generate_hmac_signature(message: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .context("Invalid HMAC key")?;

    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// 常量时间比较两个字符串
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

/// 拼接网关签名原文
///
/// 字段顺序固定: merchant_id|invoice_id|amount|currency|timestamp
pub fn token_signing_payload(
    merchant_id: &str,
    invoice_id: &str,
    amount: &str,
    currency: &str,
    timestamp: i64,
) -> String {
    [merchant_id, invoice_id, amount, currency, &timestamp.to_string()].join(FIELD_SEPARATOR)
}

/// 为支付令牌请求签名
///
/// # Arguments
/// * `secret` - 合作方密钥
/// * `payload` - 由 `token_signing_payload` 生成的原文
///
/// # Returns
/// * HMAC签名
pub fn sign_token_request(secret: &str, payload: &str) -> Result<String> {
    generate_hmac_signature(payload, secret)
}
