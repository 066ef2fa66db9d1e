// PostgreSQL存储实现
// 唯一约束与原子更新由数据库保证

use async_trait::async_trait;
use anyhow::{Result, Context};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use crate::models::{
    Category, HotKey, InsertOutcome, Partner, PartnerCode, Product, Transaction,
};
use super::{order_by_ids, CategoryRepository, PartnerRepository, ProductRepository, TransactionRepository};

const PRODUCT_COLUMNS: &str = "id, name, unit_price, image, product_date, available, category_id, \
     quantity, description, discount, view_count, special";

const TRANSACTION_COLUMNS: &str = "id, transaction_id, username, partner_id, partner_code, amount, \
     currency, order_info, status, payment_url, created_at, updated_at";

/// 转义LIKE模式中的通配符
fn like_pattern(keywords: &str) -> String {
    let escaped = keywords
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// 商品存储
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch product")
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ANY($1)",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch products by ids")?;

        Ok(order_by_ids(products, ids))
    }

    async fn find_by_category(&self, category_id: i32) -> Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE category_id = $1 ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch products by category")
    }

    async fn find_by_keywords(&self, keywords: &str) -> Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE name ILIKE $1 OR description ILIKE $1 ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .bind(like_pattern(keywords))
        .fetch_all(&self.pool)
        .await
        .context("Failed to search products")
    }

    async fn find_by_hot(&self, key: HotKey, limit: usize) -> Result<Vec<Product>> {
        let clause = match key {
            HotKey::Latest => "ORDER BY product_date DESC, id DESC",
            HotKey::MostViewed => "ORDER BY view_count DESC, id",
            HotKey::Discount => "WHERE discount > 0 ORDER BY discount DESC, id",
            HotKey::Special => "WHERE special = TRUE ORDER BY id DESC",
        };

        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products {} LIMIT $1",
            PRODUCT_COLUMNS, clause
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to fetch hot products ({})", key.as_str()))
    }

    async fn increment_view_count(&self, id: i32) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET view_count = view_count + 1 WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to increment product view count")
    }
}

/// 分类存储
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name, name_vn FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category")
    }

    async fn find_all(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name, name_vn FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch categories")
    }
}

/// 支付合作方存储
#[derive(Clone)]
pub struct PgPartnerRepository {
    pool: PgPool,
}

impl PgPartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PartnerRepository for PgPartnerRepository {
    async fn find_by_code(&self, code: PartnerCode) -> Result<Option<Partner>> {
        let row = sqlx::query_as::<_, PartnerRow>(
            "SELECT id, code, name, token_url, merchant_id, secret_key, return_url, created_at \
             FROM partners WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch partner")?;

        row.map(PartnerRow::into_domain).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Partner>> {
        let rows = sqlx::query_as::<_, PartnerRow>(
            "SELECT id, code, name, token_url, merchant_id, secret_key, return_url, created_at \
             FROM partners ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch partners")?;

        rows.into_iter().map(PartnerRow::into_domain).collect()
    }
}

/// 交易记录存储
#[derive(Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn find_by_transaction_id_and_username(
        &self,
        transaction_id: &str,
        username: &str,
    ) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE transaction_id = $1 AND username = $2",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions ORDER BY created_at DESC",
            TRANSACTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch transactions")?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn insert_if_absent(&self, tx: &Transaction) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (transaction_id, username) DO NOTHING
            RETURNING {columns}
            "#,
            columns = TRANSACTION_COLUMNS
        ))
        .bind(tx.id)
        .bind(&tx.transaction_id)
        .bind(&tx.username)
        .bind(tx.partner_id)
        .bind(tx.partner_code.as_str())
        .bind(tx.amount)
        .bind(&tx.currency)
        .bind(&tx.order_info)
        .bind(tx.status.as_str())
        .bind(&tx.payment_url)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to create transaction")?;

        if let Some(row) = inserted {
            return Ok(InsertOutcome::Created(row.into_domain()?));
        }

        let existing = self
            .find_by_transaction_id_and_username(&tx.transaction_id, &tx.username)
            .await?
            .with_context(|| {
                format!("Transaction {} conflicted but could not be loaded", tx.transaction_id)
            })?;

        Ok(InsertOutcome::Existing(existing))
    }

    async fn attach_payment_url(&self, transaction_id: &str, username: &str, url: &str) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE transactions SET payment_url = $1, updated_at = NOW() \
             WHERE transaction_id = $2 AND username = $3",
        )
        .bind(url)
        .bind(transaction_id)
        .bind(username)
        .execute(&self.pool)
        .await
        .context("Failed to store payment url")?
        .rows_affected();

        if rows_affected == 0 {
            anyhow::bail!("Transaction {} not found", transaction_id);
        }

        Ok(())
    }
}

/// 合作方行类型，仅在本模块内使用
#[derive(Debug, sqlx::FromRow)]
struct PartnerRow {
    id: i32,
    code: String,
    name: String,
    token_url: String,
    merchant_id: String,
    secret_key: String,
    return_url: String,
    created_at: DateTime<Utc>,
}

impl PartnerRow {
    fn into_domain(self) -> Result<Partner> {
        Ok(Partner {
            id: self.id,
            code: self.code.parse()?,
            name: self.name,
            token_url: self.token_url,
            merchant_id: self.merchant_id,
            secret_key: self.secret_key,
            return_url: self.return_url,
            created_at: self.created_at,
        })
    }
}

/// 交易行类型，仅在本模块内使用
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    transaction_id: String,
    username: String,
    partner_id: i32,
    partner_code: String,
    amount: Decimal,
    currency: String,
    order_info: String,
    status: String,
    payment_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> Result<Transaction> {
        Ok(Transaction {
            id: self.id,
            transaction_id: self.transaction_id,
            username: self.username,
            partner_id: self.partner_id,
            partner_code: self.partner_code.parse()?,
            amount: self.amount,
            currency: self.currency,
            order_info: self.order_info,
            status: self.status.parse()?,
            payment_url: self.payment_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("laptop"), "%laptop%");
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
    }
}
