// 数据访问层
// 定义商品、分类、支付合作方和交易记录的存储接口

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use anyhow::Result;
use crate::models::{Category, HotKey, InsertOutcome, Partner, PartnerCode, Product, Transaction};

pub use in_memory::{
    InMemoryCategoryRepository, InMemoryPartnerRepository, InMemoryProductRepository,
    InMemoryTransactionRepository,
};
pub use postgres::{
    PgCategoryRepository, PgPartnerRepository, PgProductRepository, PgTransactionRepository,
};

/// 商品存储
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Product>>;

    /// 按给定ID顺序返回存在的商品
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Product>>;

    async fn find_by_category(&self, category_id: i32) -> Result<Vec<Product>>;

    /// 名称或描述包含关键字 (不区分大小写)
    async fn find_by_keywords(&self, keywords: &str) -> Result<Vec<Product>>;

    async fn find_by_hot(&self, key: HotKey, limit: usize) -> Result<Vec<Product>>;

    /// 原子地将浏览次数加一，返回更新后的商品
    async fn increment_view_count(&self, id: i32) -> Result<Option<Product>>;
}

/// 分类存储
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>>;
    async fn find_all(&self) -> Result<Vec<Category>>;
}

/// 支付合作方注册表
#[async_trait]
pub trait PartnerRepository: Send + Sync {
    async fn find_by_code(&self, code: PartnerCode) -> Result<Option<Partner>>;
    async fn find_all(&self) -> Result<Vec<Partner>>;
}

/// 交易记录存储
///
/// (transaction_id, username) 唯一，由存储层保证。
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_transaction_id_and_username(
        &self,
        transaction_id: &str,
        username: &str,
    ) -> Result<Option<Transaction>>;

    async fn find_all(&self) -> Result<Vec<Transaction>>;

    /// 不存在时插入，存在时返回已有记录
    async fn insert_if_absent(&self, tx: &Transaction) -> Result<InsertOutcome>;

    /// 记录已获取的支付链接
    async fn attach_payment_url(&self, transaction_id: &str, username: &str, url: &str) -> Result<()>;
}

/// 按请求的ID顺序排列商品，忽略不存在的ID
pub(crate) fn order_by_ids(products: Vec<Product>, ids: &[i32]) -> Vec<Product> {
    ids.iter()
        .filter_map(|id| products.iter().find(|p| p.id == *id).cloned())
        .collect()
}
