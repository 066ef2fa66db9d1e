// 本地化提示信息
// 返回给用户的文案按配置的语言生成

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 界面语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// 越南语
    #[default]
    Vi,
    /// 英语
    En,
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" => Ok(Locale::Vi),
            "en" => Ok(Locale::En),
            other => anyhow::bail!("Unsupported locale: {}", other),
        }
    }
}

/// 提示信息目录
#[derive(Debug, Clone, Copy, Default)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// 找不到支付合作方
    pub fn partner_not_found(&self, partner: &str) -> String {
        match self.locale {
            Locale::Vi => format!("Không tìm thấy {}", partner),
            Locale::En => format!("Payment partner {} not found", partner),
        }
    }

    /// 合作方拒绝签发支付令牌
    pub fn payment_redirect_failed(&self, partner: &str) -> String {
        match self.locale {
            Locale::Vi => format!("Không thể chuyển hướng thanh toán qua {}", partner),
            Locale::En => format!("Unable to redirect the payment through {}", partner),
        }
    }

    /// 连接合作方时出错
    pub fn partner_connection_failed(&self, partner: &str) -> String {
        match self.locale {
            Locale::Vi => format!("Có lỗi xảy ra trong quá trình kết nối với {}", partner),
            Locale::En => format!("An error occurred while connecting to {}", partner),
        }
    }

    /// 邮件发送成功
    pub fn send_friend_success(&self) -> &'static str {
        match self.locale {
            Locale::Vi => "Đã gửi thông tin thành công",
            Locale::En => "The information was sent successfully",
        }
    }

    /// 商品详情链接文字
    pub fn view_details(&self) -> &'static str {
        match self.locale {
            Locale::Vi => "Xem chi tiết",
            Locale::En => "View details",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse() {
        assert_eq!("vi".parse::<Locale>().unwrap(), Locale::Vi);
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_messages_mention_partner() {
        let vi = Messages::new(Locale::Vi);
        assert_eq!(vi.partner_not_found("VNPAY"), "Không tìm thấy VNPAY");
        assert!(vi.payment_redirect_failed("MOMO").ends_with("MOMO"));

        let en = Messages::new(Locale::En);
        assert!(en.partner_connection_failed("ZALOPAY").contains("ZALOPAY"));
        assert_eq!(en.view_details(), "View details");
    }
}
