// 配置管理模块
// 负责加载和管理应用程序配置

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use anyhow::{Result, Context};
use crate::messages::Locale;
use crate::models::RepeatLinkPolicy;
use crate::utils::{validate_email, validate_url};

/// 应用程序配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 支付配置
    pub payment: PaymentConfig,
    /// 邮件配置
    pub mail: MailConfig,
    /// 页面相关配置 (Cookie、语言、跨域)
    pub web: WebConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 服务器监听地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 工作线程数
    pub workers: Option<usize>,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接URL，未配置时使用内存存储
    pub url: Option<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小空闲连接数
    pub min_connections: u32,
    /// 连接超时时间 (秒)
    pub connect_timeout: u64,
    /// 空闲超时时间 (秒)
    pub idle_timeout: u64,
}

/// 支付配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// 已存在交易的链接处理策略
    pub repeat_policy: RepeatLinkPolicy,
    /// 网关请求超时时间 (秒)
    pub gateway_timeout: u64,
}

/// 邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// 邮件中继地址，未配置时只记录日志
    pub relay_url: Option<String>,
    /// 邮件中继密钥
    #[serde(skip_serializing)]
    pub relay_api_key: Option<String>,
    /// 系统发件地址
    pub sender: String,
}

/// 页面相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Cookie有效期 (天)
    pub cookie_max_age_days: i64,
    /// Cookie中最多保存的商品ID数量
    pub cookie_max_ids: usize,
    /// 提示信息语言
    pub locale: Locale,
    /// 允许的跨域来源，为空时只允许本机
    pub cors_allowed_origins: Vec<String>,
    /// 站点公开地址，用于邮件中的商品链接
    pub public_base_url: String,
    /// 管理接口密钥，未配置时管理接口不可用
    #[serde(skip_serializing)]
    pub admin_api_key: Option<String>,
}

/// 读取环境变量并解析，未设置时使用默认值
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid {}", key)),
        Err(_) => Ok(default),
    }
}

/// 读取可选的环境变量，空字符串视为未设置
fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // 加载.env文件，忽略错误

        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_or("SERVER_PORT", defaults.server.port)?,
                workers: env::var("SERVER_WORKERS")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
            database: DatabaseConfig {
                url: env_opt("DATABASE_URL"),
                max_connections: env_or("DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
                min_connections: env_or("DB_MIN_CONNECTIONS", defaults.database.min_connections)?,
                connect_timeout: env_or("DB_CONNECT_TIMEOUT", defaults.database.connect_timeout)?,
                idle_timeout: env_or("DB_IDLE_TIMEOUT", defaults.database.idle_timeout)?,
            },
            payment: PaymentConfig {
                repeat_policy: env_or("PAYMENT_REPEAT_POLICY", defaults.payment.repeat_policy)?,
                gateway_timeout: env_or("PAYMENT_GATEWAY_TIMEOUT", defaults.payment.gateway_timeout)?,
            },
            mail: MailConfig {
                relay_url: env_opt("MAIL_RELAY_URL"),
                relay_api_key: env_opt("MAIL_RELAY_API_KEY"),
                sender: env_opt("MAIL_SENDER").unwrap_or(defaults.mail.sender),
            },
            web: WebConfig {
                cookie_max_age_days: env_or("COOKIE_MAX_AGE_DAYS", defaults.web.cookie_max_age_days)?,
                cookie_max_ids: env_or("COOKIE_MAX_IDS", defaults.web.cookie_max_ids)?,
                locale: env_or("APP_LOCALE", defaults.web.locale)?,
                cors_allowed_origins: env_opt("CORS_ALLOWED_ORIGINS")
                    .map(|s| parse_origins(&s))
                    .unwrap_or_default(),
                public_base_url: env_opt("PUBLIC_BASE_URL").unwrap_or(defaults.web.public_base_url),
                admin_api_key: env_opt("ADMIN_API_KEY"),
            },
        })
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        // 验证服务器配置
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        // 验证数据库配置
        if let Some(url) = &self.database.url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                anyhow::bail!("DATABASE_URL must be a postgres connection string");
            }
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!("DB_MIN_CONNECTIONS cannot exceed DB_MAX_CONNECTIONS");
        }

        // 验证支付配置
        if self.payment.gateway_timeout == 0 {
            anyhow::bail!("Payment gateway timeout cannot be 0");
        }

        // 验证邮件配置
        if let Some(url) = &self.mail.relay_url {
            if !validate_url(url) {
                anyhow::bail!("Invalid MAIL_RELAY_URL: {}", url);
            }
        }

        if !validate_email(&self.mail.sender) {
            anyhow::bail!("Invalid MAIL_SENDER: {}", self.mail.sender);
        }

        // 验证Cookie配置
        if self.web.cookie_max_age_days <= 0 {
            anyhow::bail!("Cookie max age must be positive");
        }

        if self.web.cookie_max_ids == 0 {
            anyhow::bail!("Cookie id capacity cannot be 0");
        }

        if !validate_url(&self.web.public_base_url) {
            anyhow::bail!("Invalid PUBLIC_BASE_URL: {}", self.web.public_base_url);
        }

        if let Some(key) = &self.web.admin_api_key {
            if key.len() < 16 {
                anyhow::bail!("ADMIN_API_KEY must be at least 16 characters");
            }
        }

        Ok(())
    }

    /// 获取服务器绑定地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 解析逗号分隔的跨域来源列表
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                min_connections: 1,
                connect_timeout: 30,
                idle_timeout: 600,
            },
            payment: PaymentConfig {
                repeat_policy: RepeatLinkPolicy::Reissue,
                gateway_timeout: 30,
            },
            mail: MailConfig {
                relay_url: None,
                relay_api_key: None,
                sender: "noreply@shopcart.local".to_string(),
            },
            web: WebConfig {
                cookie_max_age_days: 15,
                cookie_max_ids: 50,
                locale: Locale::Vi,
                cors_allowed_origins: Vec::new(),
                public_base_url: "http://127.0.0.1:8080".to_string(),
                admin_api_key: None,
            },
        }
    }
}
