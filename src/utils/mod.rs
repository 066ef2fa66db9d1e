// 工具函数模块
// 包含签名、验证、Cookie ID集合、交易ID生成等通用工具

pub mod crypto;
pub mod id_set;
pub mod invoice_id;
pub mod validation;

// 重新导出常用函数
pub use crypto::*;
pub use id_set::IdSet;
pub use invoice_id::{InvoiceIdGenerator, TimestampIdGenerator};
pub use validation::*;
