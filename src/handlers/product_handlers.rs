// 商品API处理器
// 处理分类列表、搜索、详情、收藏、热门列表和发送给朋友等HTTP请求

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{web, HttpRequest, HttpResponse};
use crate::error::AppError;
use crate::models::{
    ApiResponse, HotKey, KeywordQuery, ProductDetailModel, ProductListModel, SendFriendQuery, View,
};
use crate::services::{detail_url, MailService};
use crate::state::AppState;
use crate::utils::IdSet;

/// 收藏列表Cookie
pub const FAVORITES_COOKIE: &str = "favorites";
/// 最近浏览Cookie
pub const VIEWED_COOKIE: &str = "viewed";

/// 从请求Cookie读取ID集合，缺失或损坏时返回空集合
fn read_id_set(req: &HttpRequest, name: &str, capacity: usize) -> IdSet {
    req.cookie(name)
        .map(|cookie| IdSet::parse(cookie.value(), capacity))
        .unwrap_or_else(|| IdSet::new(capacity))
}

/// 生成写回的ID集合Cookie
fn id_set_cookie(name: &'static str, set: &IdSet, max_age_days: i64) -> Cookie<'static> {
    Cookie::build(name, set.to_cookie_value())
        .path("/")
        .max_age(CookieDuration::days(max_age_days))
        .http_only(true)
        .finish()
}

/// 获取所有分类
///
/// GET /category/list
pub async fn list_categories(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = data.catalog.find_all_categories().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(categories)))
}

/// 按分类列出商品
///
/// GET /product/list-by-category/{cId}
///
/// 响应: 视图 product/list
pub async fn list_by_category(
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let category_id = path.into_inner();

    let (category, list) = data
        .catalog
        .list_by_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {}", category_id)))?;

    let model = ProductListModel {
        list,
        category: Some(category),
        keywords: None,
    };
    Ok(HttpResponse::Ok().json(View::new("product/list", model)))
}

/// 按关键字搜索商品
///
/// GET /product/list-by-keywords?keywords=
pub async fn list_by_keywords(
    data: web::Data<AppState>,
    query: web::Query<KeywordQuery>,
) -> Result<HttpResponse, AppError> {
    let keywords = query.into_inner().keywords;
    let list = data.catalog.find_by_keywords(&keywords).await?;

    let model = ProductListModel {
        list,
        category: None,
        keywords: Some(keywords),
    };
    Ok(HttpResponse::Ok().json(View::new("product/list", model)))
}

/// 商品详情
///
/// GET /product/detail/{id}
///
/// 浏览次数加一，并把商品加入最近浏览Cookie
pub async fn detail(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let prod = data
        .catalog
        .view_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))?;

    let web_config = &data.config.web;
    let mut viewed = read_id_set(&req, VIEWED_COOKIE, web_config.cookie_max_ids);
    viewed.insert(id);
    let favorites = read_id_set(&req, FAVORITES_COOKIE, web_config.cookie_max_ids);

    let model = ProductDetailModel {
        price: prod.discounted_price(),
        prod,
        viewed: data.catalog.find_by_ids(viewed.ids()).await?,
        favorites: data.catalog.find_by_ids(favorites.ids()).await?,
    };

    Ok(HttpResponse::Ok()
        .cookie(id_set_cookie(VIEWED_COOKIE, &viewed, web_config.cookie_max_age_days))
        .json(View::new("product/detail", model)))
}

/// 收藏商品
///
/// GET /product/favorite/{id}
///
/// 响应: 收藏列表中的ID字符串数组
pub async fn favorite(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if id <= 0 {
        return Err(AppError::BadRequest(format!("Invalid product id {}", id)));
    }

    let web_config = &data.config.web;
    let mut favorites = read_id_set(&req, FAVORITES_COOKIE, web_config.cookie_max_ids);
    if favorites.insert(id) {
        log::debug!("Product {} added to favorites", id);
    }

    Ok(HttpResponse::Ok()
        .cookie(id_set_cookie(FAVORITES_COOKIE, &favorites, web_config.cookie_max_age_days))
        .json(favorites.to_strings()))
}

/// 热门商品列表
///
/// GET /product/list-by-hot/{key}
///
/// key: latest | views | discount | special
pub async fn list_by_hot(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let key: HotKey = path
        .into_inner()
        .parse()
        .map_err(|e: anyhow::Error| AppError::BadRequest(e.to_string()))?;

    let list = data.catalog.find_by_hot(key).await?;

    let model = ProductListModel {
        list,
        category: None,
        keywords: None,
    };
    Ok(HttpResponse::Ok().json(View::new("product/list", model)))
}

/// 发送商品给朋友 (查询参数)
///
/// GET /product/send-friend?id&from&to&subject&body
pub async fn send_friend(
    data: web::Data<AppState>,
    query: web::Query<SendFriendQuery>,
) -> Result<HttpResponse, AppError> {
    send_to_friend(&data, query.into_inner()).await
}

/// 发送商品给朋友 (表单)
///
/// POST /product/send-friend
pub async fn send_friend_form(
    data: web::Data<AppState>,
    form: web::Form<SendFriendQuery>,
) -> Result<HttpResponse, AppError> {
    send_to_friend(&data, form.into_inner()).await
}

async fn send_to_friend(
    data: &AppState,
    query: SendFriendQuery,
) -> Result<HttpResponse, AppError> {
    MailService::validate_send_friend(&query).map_err(|e| AppError::Validation(e.to_string()))?;

    if data.catalog.find_by_id(query.id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product {}", query.id)));
    }

    let link = detail_url(&data.config.web.public_base_url, query.id);

    let confirmation = data.mail.send_to_friend(&query, &link).await?;
    Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(confirmation))
}
