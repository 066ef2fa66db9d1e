// API处理器模块
// 包含所有HTTP请求处理逻辑

pub mod product_handlers;
pub mod payment_handlers;
pub mod health_handlers;

// 重新导出处理器
pub use product_handlers::*;
pub use payment_handlers::*;
pub use health_handlers::*;
