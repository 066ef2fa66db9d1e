// 支付合作方数据模型
// 定义支付合作方代码及其网关配置

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// 支付合作方代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartnerCode {
    /// VNPAY支付网关
    Vnpay,
    /// MoMo电子钱包
    Momo,
    /// ZaloPay电子钱包
    Zalopay,
}

impl PartnerCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerCode::Vnpay => "VNPAY",
            PartnerCode::Momo => "MOMO",
            PartnerCode::Zalopay => "ZALOPAY",
        }
    }
}

impl fmt::Display for PartnerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartnerCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VNPAY" => Ok(PartnerCode::Vnpay),
            "MOMO" => Ok(PartnerCode::Momo),
            "ZALOPAY" => Ok(PartnerCode::Zalopay),
            other => anyhow::bail!("Unknown partner code: {}", other),
        }
    }
}

/// 支付合作方配置
///
/// 由种子数据创建，加载后不可变。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Partner {
    /// 合作方ID
    pub id: i32,
    /// 合作方代码
    pub code: PartnerCode,
    /// 显示名称
    pub name: String,
    /// 令牌接口地址
    pub token_url: String,
    /// 商户终端号
    pub merchant_id: String,
    /// 签名密钥 (不在API响应中返回)
    #[serde(skip_serializing)]
    pub secret_key: String,
    /// 默认支付完成回跳地址
    pub return_url: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_code_round_trip() {
        for code in [PartnerCode::Vnpay, PartnerCode::Momo, PartnerCode::Zalopay] {
            assert_eq!(code.as_str().parse::<PartnerCode>().unwrap(), code);
        }
        assert_eq!("vnpay".parse::<PartnerCode>().unwrap(), PartnerCode::Vnpay);
        assert!("PAYPAL".parse::<PartnerCode>().is_err());
    }

    #[test]
    fn test_partner_code_serde() {
        assert_eq!(serde_json::to_string(&PartnerCode::Zalopay).unwrap(), "\"ZALOPAY\"");
        let code: PartnerCode = serde_json::from_str("\"MOMO\"").unwrap();
        assert_eq!(code, PartnerCode::Momo);
    }

    #[test]
    fn test_secret_key_not_serialized() {
        let partner = Partner {
            id: 1,
            code: PartnerCode::Vnpay,
            name: "VNPAY".to_string(),
            token_url: "https://sandbox.vnpayment.vn/token".to_string(),
            merchant_id: "TERM01".to_string(),
            secret_key: "top-secret".to_string(),
            return_url: "http://localhost:8080/payment/return".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&partner).unwrap();
        assert!(!json.contains("top-secret"));
        assert!(json.contains("\"code\":\"VNPAY\""));
    }
}
