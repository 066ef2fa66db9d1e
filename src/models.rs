// 商城数据模型定义
// 包含商品、分类、支付合作方、交易记录、支付请求等核心数据结构

mod mail;
mod partner;
mod payment;
mod product;
mod transaction;
mod view;

// 重新导出核心类型
pub use mail::*;
pub use partner::*;
pub use payment::*;
pub use product::*;
pub use transaction::*;
pub use view::*;

use serde::Serialize;

/// 标准API响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 响应状态码
    pub code: i32,
    /// 响应消息
    pub message: String,
    /// 响应数据
    pub data: Option<T>,
    /// 响应时间戳
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    /// 创建错误响应
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        ApiResponse {
            code,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }
}
