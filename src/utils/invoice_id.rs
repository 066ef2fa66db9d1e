// 发票/交易ID生成器
// 按合作方代码生成带前缀的交易ID

use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicU32, Ordering};
use crate::models::PartnerCode;

/// 序列号取模范围 (4位)
const SEQUENCE_MODULUS: u32 = 10_000;

/// 交易ID生成器
pub trait InvoiceIdGenerator: Send + Sync {
    /// 为指定合作方生成交易ID
    fn generate(&self, code: PartnerCode) -> String;
}

/// 基于时间戳和进程内序列号的ID生成器
///
/// 格式: `{合作方代码}{yyyyMMddHHmmss}{4位序列号}`，例如 `VNPAY202610181200450001`
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    sequence: AtomicU32,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按给定时间生成ID
    pub fn generate_at(&self, code: PartnerCode, now: DateTime<Local>) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) % SEQUENCE_MODULUS;
        format!("{}{}{:04}", code.as_str(), now.format("%Y%m%d%H%M%S"), seq)
    }
}

impl InvoiceIdGenerator for TimestampIdGenerator {
    fn generate(&self, code: PartnerCode) -> String {
        self.generate_at(code, Local::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_partner_scoped() {
        let generator = TimestampIdGenerator::new();
        let now = Local.with_ymd_and_hms(2026, 10, 18, 12, 0, 45).unwrap();

        assert_eq!(generator.generate_at(PartnerCode::Vnpay, now), "VNPAY202610181200450000");
        assert_eq!(generator.generate_at(PartnerCode::Momo, now), "MOMO202610181200450001");
    }

    #[test]
    fn test_consecutive_ids_differ() {
        let generator = TimestampIdGenerator::new();
        let first = generator.generate(PartnerCode::Zalopay);
        let second = generator.generate(PartnerCode::Zalopay);

        assert!(first.starts_with("ZALOPAY"));
        assert_ne!(first, second);
    }
}
