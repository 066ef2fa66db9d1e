// 商品目录服务
// 负责分类列表、关键字搜索、热门列表和商品详情浏览计数

use std::sync::Arc;
use anyhow::Result;
use crate::models::{Category, HotKey, Product};
use crate::repositories::{CategoryRepository, ProductRepository};

/// 热门列表默认返回数量
const HOT_LIST_LIMIT: usize = 12;

/// 商品目录服务
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self { products, categories }
    }

    /// 获取分类及其商品
    ///
    /// # Returns
    /// * 分类不存在时返回 None
    pub async fn list_by_category(&self, category_id: i32) -> Result<Option<(Category, Vec<Product>)>> {
        let category = match self.categories.find_by_id(category_id).await? {
            Some(category) => category,
            None => return Ok(None),
        };

        let products = self.products.find_by_category(category_id).await?;
        Ok(Some((category, products)))
    }

    pub async fn find_all_categories(&self) -> Result<Vec<Category>> {
        self.categories.find_all().await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Product>> {
        self.products.find_by_id(id).await
    }

    /// 按给定顺序获取商品 (用于Cookie中的ID列表)
    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Product>> {
        self.products.find_by_ids(ids).await
    }

    pub async fn find_by_keywords(&self, keywords: &str) -> Result<Vec<Product>> {
        self.products.find_by_keywords(keywords).await
    }

    pub async fn find_by_hot(&self, key: HotKey) -> Result<Vec<Product>> {
        self.products.find_by_hot(key, HOT_LIST_LIMIT).await
    }

    /// 浏览商品详情，浏览次数原子加一
    pub async fn view_product(&self, id: i32) -> Result<Option<Product>> {
        let product = self.products.increment_view_count(id).await?;
        if let Some(p) = &product {
            log::debug!("Product {} viewed, view count now {}", p.id, p.view_count);
        }
        Ok(product)
    }
}
