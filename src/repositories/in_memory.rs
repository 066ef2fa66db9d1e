// 内存存储实现
// 未配置数据库时用于本地开发，也用于测试

use async_trait::async_trait;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::models::{
    Category, HotKey, InsertOutcome, Partner, PartnerCode, Product, Transaction,
};
use super::{order_by_ids, CategoryRepository, PartnerRepository, ProductRepository, TransactionRepository};

/// 线程安全的内存商品存储
#[derive(Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<BTreeMap<i32, Product>>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Arc::new(RwLock::new(map)),
        }
    }

    async fn all(&self) -> Vec<Product> {
        self.products.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Product>> {
        Ok(order_by_ids(self.all().await, ids))
    }

    async fn find_by_category(&self, category_id: i32) -> Result<Vec<Product>> {
        Ok(self
            .all()
            .await
            .into_iter()
            .filter(|p| p.category_id == category_id)
            .collect())
    }

    async fn find_by_keywords(&self, keywords: &str) -> Result<Vec<Product>> {
        Ok(self
            .all()
            .await
            .into_iter()
            .filter(|p| p.matches_keywords(keywords))
            .collect())
    }

    async fn find_by_hot(&self, key: HotKey, limit: usize) -> Result<Vec<Product>> {
        let mut products = self.all().await;

        match key {
            HotKey::Latest => {
                products.sort_by(|a, b| b.product_date.cmp(&a.product_date).then(b.id.cmp(&a.id)));
            }
            HotKey::MostViewed => {
                products.sort_by(|a, b| b.view_count.cmp(&a.view_count).then(a.id.cmp(&b.id)));
            }
            HotKey::Discount => {
                products.retain(|p| p.discount > Decimal::ZERO);
                products.sort_by(|a, b| b.discount.cmp(&a.discount).then(a.id.cmp(&b.id)));
            }
            HotKey::Special => {
                products.retain(|p| p.special);
                products.sort_by(|a, b| b.id.cmp(&a.id));
            }
        }

        products.truncate(limit);
        Ok(products)
    }

    async fn increment_view_count(&self, id: i32) -> Result<Option<Product>> {
        // 读取和写入在同一把写锁内完成
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).map(|product| {
            product.view_count += 1;
            product.clone()
        }))
    }
}

/// 内存分类存储
#[derive(Default, Clone)]
pub struct InMemoryCategoryRepository {
    categories: Arc<RwLock<BTreeMap<i32, Category>>>,
}

impl InMemoryCategoryRepository {
    pub fn with_categories(categories: Vec<Category>) -> Self {
        let map = categories.into_iter().map(|c| (c.id, c)).collect();
        Self {
            categories: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Category>> {
        Ok(self.categories.read().await.values().cloned().collect())
    }
}

/// 内存支付合作方注册表
#[derive(Default, Clone)]
pub struct InMemoryPartnerRepository {
    partners: Arc<RwLock<Vec<Partner>>>,
}

impl InMemoryPartnerRepository {
    pub fn with_partners(partners: Vec<Partner>) -> Self {
        Self {
            partners: Arc::new(RwLock::new(partners)),
        }
    }
}

#[async_trait]
impl PartnerRepository for InMemoryPartnerRepository {
    async fn find_by_code(&self, code: PartnerCode) -> Result<Option<Partner>> {
        Ok(self.partners.read().await.iter().find(|p| p.code == code).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Partner>> {
        Ok(self.partners.read().await.clone())
    }
}

/// 内存交易记录存储
#[derive(Default, Clone)]
pub struct InMemoryTransactionRepository {
    transactions: Arc<RwLock<HashMap<(String, String), Transaction>>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已存储的记录数
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }
}

fn transaction_key(transaction_id: &str, username: &str) -> (String, String) {
    (transaction_id.to_string(), username.to_string())
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn find_by_transaction_id_and_username(
        &self,
        transaction_id: &str,
        username: &str,
    ) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(&transaction_key(transaction_id, username)).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Transaction>> {
        let mut all: Vec<Transaction> = self.transactions.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn insert_if_absent(&self, tx: &Transaction) -> Result<InsertOutcome> {
        let mut transactions = self.transactions.write().await;
        let key = transaction_key(&tx.transaction_id, &tx.username);

        if let Some(existing) = transactions.get(&key) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }

        transactions.insert(key, tx.clone());
        Ok(InsertOutcome::Created(tx.clone()))
    }

    async fn attach_payment_url(&self, transaction_id: &str, username: &str, url: &str) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(&transaction_key(transaction_id, username)) {
            Some(tx) => {
                tx.payment_url = Some(url.to_string());
                tx.updated_at = Utc::now();
                Ok(())
            }
            None => anyhow::bail!("Transaction {} not found", transaction_id),
        }
    }
}

/// 本地开发用的种子数据
pub struct SeedData {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub partners: Vec<Partner>,
}

impl SeedData {
    pub fn demo() -> Self {
        let categories = vec![
            Category { id: 1, name: "Laptop".to_string(), name_vn: "Máy tính xách tay".to_string() },
            Category { id: 2, name: "Phone".to_string(), name_vn: "Điện thoại".to_string() },
        ];

        let product = |id: i32, name: &str, price: i64, category_id: i32, discount: Decimal, special: bool| Product {
            id,
            name: name.to_string(),
            unit_price: Decimal::new(price, 0),
            image: format!("product-{}.jpg", id),
            product_date: NaiveDate::from_ymd_opt(2026, 1, id as u32).unwrap_or_default(),
            available: true,
            category_id,
            quantity: 10,
            description: format!("{} chính hãng", name),
            discount,
            view_count: 0,
            special,
        };

        let products = vec![
            product(1, "Dell XPS 13", 32_000_000, 1, Decimal::ZERO, false),
            product(2, "MacBook Air M3", 28_000_000, 1, Decimal::new(5, 2), true),
            product(3, "ThinkPad X1 Carbon", 35_000_000, 1, Decimal::new(10, 2), false),
            product(4, "iPhone 16", 22_000_000, 2, Decimal::ZERO, true),
            product(5, "Galaxy S25", 20_000_000, 2, Decimal::new(15, 2), false),
        ];

        let partners = vec![Partner {
            id: 1,
            code: PartnerCode::Vnpay,
            name: "VNPAY".to_string(),
            token_url: "https://sandbox.vnpayment.vn/paymentv2/token".to_string(),
            merchant_id: "DEMO0001".to_string(),
            secret_key: "demo-secret-change-me".to_string(),
            return_url: "http://127.0.0.1:8080/payment/return".to_string(),
            created_at: Utc::now(),
        }];

        Self { categories, products, partners }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentRequest, TransactionStatus};

    fn sample_transaction(transaction_id: &str, username: &str) -> Transaction {
        let partner = &SeedData::demo().partners[0];
        let request = PaymentRequest {
            partner_code: PartnerCode::Vnpay,
            username: username.to_string(),
            amount: Decimal::new(150000, 0),
            currency: "VND".to_string(),
            order_info: "Thanh toán đơn hàng".to_string(),
            return_url: None,
            client_ip: None,
            invoice_id: None,
        };
        Transaction::from_request(partner, transaction_id, &request)
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let store = InMemoryTransactionRepository::new();
        let tx = sample_transaction("VNPAY1", "alice");

        let first = store.insert_if_absent(&tx).await.unwrap();
        assert!(first.is_created());

        let mut duplicate = sample_transaction("VNPAY1", "alice");
        duplicate.order_info = "changed".to_string();
        let second = store.insert_if_absent(&duplicate).await.unwrap();
        assert!(!second.is_created());
        assert_eq!(second.transaction().id, tx.id);
        assert_eq!(store.len().await, 1);

        // 相同交易ID、不同用户是另一条记录
        let other_user = sample_transaction("VNPAY1", "bob");
        assert!(store.insert_if_absent(&other_user).await.unwrap().is_created());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_insert_creates_one_record() {
        let store = InMemoryTransactionRepository::new();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_if_absent(&sample_transaction("VNPAY2", "alice")).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_created() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_attach_payment_url() {
        let store = InMemoryTransactionRepository::new();
        store.insert_if_absent(&sample_transaction("VNPAY3", "alice")).await.unwrap();

        store.attach_payment_url("VNPAY3", "alice", "https://pay/abc").await.unwrap();
        let stored = store
            .find_by_transaction_id_and_username("VNPAY3", "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.payment_url.as_deref(), Some("https://pay/abc"));
        assert_eq!(stored.status, TransactionStatus::Pending);

        assert!(store.attach_payment_url("missing", "alice", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_view_count_increments() {
        let repo = InMemoryProductRepository::with_products(SeedData::demo().products);
        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move { repo.increment_view_count(1).await.unwrap() }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(repo.find_by_id(1).await.unwrap().unwrap().view_count, 50);
        assert!(repo.increment_view_count(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_hot() {
        let repo = InMemoryProductRepository::with_products(SeedData::demo().products);

        let latest = repo.find_by_hot(HotKey::Latest, 2).await.unwrap();
        assert_eq!(latest.iter().map(|p| p.id).collect::<Vec<_>>(), vec![5, 4]);

        let discount = repo.find_by_hot(HotKey::Discount, 12).await.unwrap();
        assert_eq!(discount.iter().map(|p| p.id).collect::<Vec<_>>(), vec![5, 3, 2]);

        let special = repo.find_by_hot(HotKey::Special, 12).await.unwrap();
        assert_eq!(special.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 2]);

        repo.increment_view_count(3).await.unwrap();
        let viewed = repo.find_by_hot(HotKey::MostViewed, 1).await.unwrap();
        assert_eq!(viewed[0].id, 3);
    }

    #[tokio::test]
    async fn test_find_by_ids_preserves_order() {
        let repo = InMemoryProductRepository::with_products(SeedData::demo().products);
        let products = repo.find_by_ids(&[4, 99, 1]).await.unwrap();
        assert_eq!(products.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 1]);
    }
}
