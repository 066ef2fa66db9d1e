// 中间件模块
// 包含请求日志、跨域和管理接口认证中间件

pub mod auth;
pub mod logging;
pub mod cors;

// 重新导出中间件
pub use auth::AdminKeyAuth;
pub use logging::RequestLogging;
pub use cors::create_cors;
