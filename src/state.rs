// 应用状态管理
// 包含配置、各业务服务和可选的数据库连接池

use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use sqlx::PgPool;
use crate::config::Config;
use crate::messages::Messages;
use crate::repositories::in_memory::SeedData;
use crate::repositories::{
    CategoryRepository, InMemoryCategoryRepository, InMemoryPartnerRepository,
    InMemoryProductRepository, InMemoryTransactionRepository, PartnerRepository,
    PgCategoryRepository, PgPartnerRepository, PgProductRepository, PgTransactionRepository,
    ProductRepository, TransactionRepository,
};
use crate::services::{
    CatalogService, HttpMailer, HttpPaymentGateway, LogMailer, LoggingGateway, MailService,
    Mailer, PaymentGateway, PaymentService,
};
use crate::utils::TimestampIdGenerator;

/// 存储层实现集合
struct Repositories {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
    partners: Arc<dyn PartnerRepository>,
    transactions: Arc<dyn TransactionRepository>,
}

impl Repositories {
    fn postgres(pool: &PgPool) -> Self {
        Self {
            products: Arc::new(PgProductRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            partners: Arc::new(PgPartnerRepository::new(pool.clone())),
            transactions: Arc::new(PgTransactionRepository::new(pool.clone())),
        }
    }

    fn in_memory(seed: SeedData) -> Self {
        Self {
            products: Arc::new(InMemoryProductRepository::with_products(seed.products)),
            categories: Arc::new(InMemoryCategoryRepository::with_categories(seed.categories)),
            partners: Arc::new(InMemoryPartnerRepository::with_partners(seed.partners)),
            transactions: Arc::new(InMemoryTransactionRepository::new()),
        }
    }
}

/// 应用全局状态
pub struct AppState {
    /// 应用配置
    pub config: Config,
    /// 商品目录服务
    pub catalog: CatalogService,
    /// 支付服务
    pub payments: PaymentService,
    /// 邮件服务
    pub mail: MailService,
    /// 数据库连接池 (内存存储时为 None)
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// 创建新的应用状态实例
    ///
    /// # Arguments
    /// * `config` - 应用配置
    /// * `db_pool` - 数据库连接池，None 时使用带种子数据的内存存储
    ///
    /// # Returns
    /// * 应用状态实例
    pub fn new(config: Config, db_pool: Option<PgPool>) -> Result<Self> {
        let repositories = match &db_pool {
            Some(pool) => Repositories::postgres(pool),
            None => Repositories::in_memory(SeedData::demo()),
        };

        let gateway = HttpPaymentGateway::new(Duration::from_secs(config.payment.gateway_timeout))?;
        let gateway: Arc<dyn PaymentGateway> = Arc::new(LoggingGateway::new(gateway));

        let mailer: Arc<dyn Mailer> = match &config.mail.relay_url {
            Some(url) => Arc::new(HttpMailer::new(url.clone(), config.mail.relay_api_key.clone())?),
            None => Arc::new(LogMailer),
        };

        Ok(Self::assemble(config, repositories, gateway, mailer, db_pool))
    }

    fn assemble(
        config: Config,
        repositories: Repositories,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        db_pool: Option<PgPool>,
    ) -> Self {
        let messages = Messages::new(config.web.locale);

        let catalog = CatalogService::new(repositories.products, repositories.categories);
        let payments = PaymentService::new(
            repositories.partners,
            repositories.transactions,
            gateway,
            Arc::new(TimestampIdGenerator::new()),
            config.payment.repeat_policy,
            messages,
        );
        let mail = MailService::new(mailer, config.mail.sender.clone(), messages);

        Self {
            config,
            catalog,
            payments,
            mail,
            db_pool,
        }
    }

    /// 当前使用的存储类型
    pub fn storage_backend(&self) -> &'static str {
        if self.db_pool.is_some() {
            "postgres"
        } else {
            "in-memory"
        }
    }

    /// 创建测试用的应用状态 (内存存储 + 替身网关和邮件投递)
    #[cfg(test)]
    pub fn new_for_test(gateway: Arc<dyn PaymentGateway>, mailer: Arc<dyn Mailer>) -> Self {
        Self::assemble(
            Config::default(),
            Repositories::in_memory(SeedData::demo()),
            gateway,
            mailer,
            None,
        )
    }
}
