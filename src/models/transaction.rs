// 支付交易记录数据模型
// 每个 (transaction_id, username) 组合至多对应一条记录

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use super::{Partner, PartnerCode, PaymentRequest};

/// 支付交易记录
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Transaction {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 交易ID (由ID生成器按合作方生成)
    pub transaction_id: String,
    /// 用户名
    pub username: String,
    /// 合作方ID
    pub partner_id: i32,
    /// 合作方代码
    pub partner_code: PartnerCode,
    /// 支付金额
    pub amount: Decimal,
    /// 币种
    pub currency: String,
    /// 订单描述
    pub order_info: String,
    /// 交易状态
    pub status: TransactionStatus,
    /// 已获取的支付链接
    pub payment_url: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 交易状态枚举
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// 待支付
    #[default]
    Pending,
    /// 已支付
    Paid,
    /// 失败
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            "failed" => Ok(TransactionStatus::Failed),
            other => anyhow::bail!("Unknown transaction status: {}", other),
        }
    }
}

/// 条件插入的结果
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// 新建了记录
    Created(Transaction),
    /// 记录已存在，返回已有记录
    Existing(Transaction),
}

impl InsertOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            InsertOutcome::Created(tx) | InsertOutcome::Existing(tx) => tx,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}

impl Transaction {
    /// 根据合作方和支付请求创建交易记录
    ///
    /// # Arguments
    /// * `partner` - 支付合作方
    /// * `transaction_id` - 已生成的交易ID
    /// * `request` - 支付请求
    pub fn from_request(partner: &Partner, transaction_id: &str, request: &PaymentRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            transaction_id: transaction_id.to_string(),
            username: request.username.clone(),
            partner_id: partner.id,
            partner_code: partner.code,
            amount: request.amount,
            currency: request.currency.clone(),
            order_info: request.order_info.clone(),
            status: TransactionStatus::Pending,
            payment_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}
