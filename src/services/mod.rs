// 服务层模块
// 包含所有业务逻辑服务

pub mod catalog_service;
pub mod mail_service;
pub mod payment_gateway;
pub mod payment_service;

// 重新导出服务
pub use catalog_service::CatalogService;
pub use mail_service::{detail_url, HttpMailer, LogMailer, MailService, Mailer};
pub use payment_gateway::{GatewayError, HttpPaymentGateway, LoggingGateway, PaymentGateway};
pub use payment_service::PaymentService;
