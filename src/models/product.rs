// 商品与分类数据模型
// 定义商品目录相关的数据结构

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 商品模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Product {
    /// 商品ID
    pub id: i32,
    /// 商品名称
    pub name: String,
    /// 单价
    pub unit_price: Decimal,
    /// 图片文件名
    pub image: String,
    /// 上架日期
    pub product_date: NaiveDate,
    /// 是否可售
    pub available: bool,
    /// 所属分类ID
    pub category_id: i32,
    /// 库存数量
    pub quantity: i32,
    /// 商品描述
    pub description: String,
    /// 折扣比例 (0 ~ 1)
    pub discount: Decimal,
    /// 浏览次数
    pub view_count: i32,
    /// 是否特价商品
    pub special: bool,
}

/// 商品分类模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub name_vn: String,
}

/// 热门商品列表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotKey {
    /// 最新上架
    Latest,
    /// 浏览最多
    MostViewed,
    /// 折扣商品
    Discount,
    /// 特价商品
    Special,
}

impl HotKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotKey::Latest => "latest",
            HotKey::MostViewed => "views",
            HotKey::Discount => "discount",
            HotKey::Special => "special",
        }
    }
}

impl FromStr for HotKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(HotKey::Latest),
            "views" => Ok(HotKey::MostViewed),
            "discount" => Ok(HotKey::Discount),
            "special" => Ok(HotKey::Special),
            other => anyhow::bail!("Unknown hot list key: {}", other),
        }
    }
}

/// 关键字搜索查询参数
#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub keywords: String,
}

impl Product {
    /// 折后价格
    pub fn discounted_price(&self) -> Decimal {
        (self.unit_price * (Decimal::ONE - self.discount)).round_dp(2)
    }

    /// 是否匹配搜索关键字 (不区分大小写)
    pub fn matches_keywords(&self, keywords: &str) -> bool {
        let needle = keywords.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}
