// 数据验证工具函数
// 提供输入数据验证和格式检查功能

use regex::Regex;
use rust_decimal::Decimal;
use anyhow::Result;
use std::collections::HashMap;

/// 验证邮箱地址格式
///
/// # Arguments
/// * `email` - 邮箱地址字符串
///
/// # Returns
/// * 邮箱是否有效
pub fn validate_email(email: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// 验证URL格式
pub fn validate_url(url: &str) -> bool {
    Regex::new(r"^https?://[^\s/$.?#].[^\s]*$")
        .map(|re| re.is_match(url))
        .unwrap_or(false)
}

/// 验证用户名
///
/// 用户名不能为空，最长64个字符，只允许字母、数字、点、下划线和连字符
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        anyhow::bail!("Username cannot be empty");
    }

    if username.len() > 64 {
        anyhow::bail!("Username too long (max 64 characters)");
    }

    let valid_chars = username.chars().all(|c| {
        c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
    });

    if !valid_chars {
        anyhow::bail!("Username contains invalid characters");
    }

    Ok(())
}

/// 支持的币种
pub const SUPPORTED_CURRENCIES: [&str; 2] = ["VND", "USD"];

/// 金额上限，与交易表 NUMERIC(18, 2) 的整数位一致
const MAX_AMOUNT_DIGITS: u32 = 16;

/// 验证币种代码
///
/// 币种需为大写的ISO代码且在支持列表中
pub fn validate_currency(currency: &str) -> Result<()> {
    if !SUPPORTED_CURRENCIES.contains(&currency) {
        anyhow::bail!("Unsupported currency {:?}", currency);
    }

    Ok(())
}

/// 验证支付金额
///
/// # Arguments
/// * `amount` - 支付金额
/// * `currency` - 币种代码
///
/// # Returns
/// * 金额是否有效
pub fn validate_payment_amount(amount: &Decimal, currency: &str) -> Result<()> {
    if *amount <= Decimal::ZERO {
        anyhow::bail!("Payment amount must be positive");
    }

    if *amount >= Decimal::from(10i64.pow(MAX_AMOUNT_DIGITS)) {
        anyhow::bail!("Payment amount too large");
    }

    // VND没有小数单位
    let max_scale = if currency.eq_ignore_ascii_case("VND") { 0 } else { 2 };

    if amount.scale() > max_scale {
        anyhow::bail!("Amount precision too high for currency {}", currency);
    }

    Ok(())
}

/// 通用输入验证器
pub struct InputValidator {
    errors: HashMap<String, Vec<String>>,
}

impl InputValidator {
    /// 创建新的验证器
    pub fn new() -> Self {
        Self {
            errors: HashMap::new(),
        }
    }

    /// 添加字段验证错误
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    /// 验证必填字段
    pub fn validate_required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(field, "This field is required");
        }
    }

    /// 验证字符串长度
    pub fn validate_length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            self.add_error(field, &format!("Must be at least {} characters", min));
        }
        if len > max {
            self.add_error(field, &format!("Must be at most {} characters", max));
        }
    }

    /// 验证邮箱格式
    pub fn validate_email_field(&mut self, field: &str, email: &str) {
        if !validate_email(email) {
            self.add_error(field, "Invalid email format");
        }
    }

    /// 检查是否有验证错误
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 转换为错误结果
    pub fn into_result(self) -> Result<()> {
        if self.has_errors() {
            let mut fields: Vec<_> = self.errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));

            let error_msg = fields
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
                .collect::<Vec<_>>()
                .join("; ");

            anyhow::bail!("Validation failed: {}", error_msg);
        }

        Ok(())
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}
