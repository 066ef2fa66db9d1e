// 视图模型
// 控制器选择的视图名称及其模型数据

use serde::Serialize;
use rust_decimal::Decimal;
use super::{Category, Product};

/// 视图响应: 视图名称 + 模型属性
#[derive(Debug, Serialize)]
pub struct View<T> {
    /// 视图名称，例如 "product/list"
    pub view: &'static str,
    /// 模型数据
    pub model: T,
}

impl<T> View<T> {
    pub fn new(view: &'static str, model: T) -> Self {
        Self { view, model }
    }
}

/// 商品列表视图模型
#[derive(Debug, Serialize)]
pub struct ProductListModel {
    pub list: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// 商品详情视图模型
#[derive(Debug, Serialize)]
pub struct ProductDetailModel {
    /// 当前商品
    pub prod: Product,
    /// 折后价格
    pub price: Decimal,
    /// 最近浏览的商品
    pub viewed: Vec<Product>,
    /// 收藏的商品
    pub favorites: Vec<Product>,
}
