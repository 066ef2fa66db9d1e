// 支付API处理器
// 处理支付链接生成、结账跳转和合作方查询等HTTP请求

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use crate::error::AppError;
use crate::models::{ApiResponse, PartnerCode, PaymentRequest, UrlGeneratorResponse};
use crate::state::AppState;

/// 未提供客户端IP时，从连接信息中补充
fn with_client_ip(req: &HttpRequest, mut request: PaymentRequest) -> PaymentRequest {
    if request.client_ip.is_none() {
        request.client_ip = req
            .connection_info()
            .realip_remote_addr()
            .map(|addr| addr.to_string());
    }
    request
}

/// 生成支付链接
///
/// POST /payment/generate-link
///
/// 请求体: PaymentRequest
/// 响应: UrlGeneratorResponse (合作方不存在或网关失败时 is_success = false)
pub async fn generate_link(
    req: HttpRequest,
    data: web::Data<AppState>,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = with_client_ip(&req, request.into_inner());
    let response = data.payments.generate_link(request).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// 结账: 生成支付链接后直接跳转到合作方页面
///
/// POST /payment/checkout
///
/// 请求体: 表单形式的 PaymentRequest
/// 响应: 303 跳转，失败时返回 400 和 UrlGeneratorResponse
pub async fn checkout(
    req: HttpRequest,
    data: web::Data<AppState>,
    form: web::Form<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = with_client_ip(&req, form.into_inner());

    match data.payments.generate_link(request).await? {
        UrlGeneratorResponse { is_success: true, url: Some(url), .. } => Ok(HttpResponse::SeeOther()
            .insert_header((header::LOCATION, url))
            .finish()),
        failed => Ok(HttpResponse::BadRequest().json(failed)),
    }
}

/// 获取支付合作方列表
///
/// GET /payment/partners
pub async fn list_partners(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let partners = data.payments.find_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(partners)))
}

/// 根据代码获取支付合作方
///
/// GET /payment/partners/{code}
pub async fn get_partner(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let code: PartnerCode = path
        .into_inner()
        .parse()
        .map_err(|e: anyhow::Error| AppError::BadRequest(e.to_string()))?;

    let partner = data
        .payments
        .find_by_code(code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Partner {}", code)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(partner)))
}

/// 交易查询参数
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub username: String,
}

/// 查询用户的交易记录
///
/// GET /payment/transactions/{transaction_id}?username=
pub async fn get_transaction(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<TransactionQuery>,
) -> Result<HttpResponse, AppError> {
    let transaction_id = path.into_inner();

    let transaction = data
        .payments
        .find_transaction(&transaction_id, &query.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {}", transaction_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(transaction)))
}

/// 获取全部交易记录 (需要管理密钥)
///
/// GET /payment/transactions
pub async fn list_transactions(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let transactions = data.payments.list_transactions().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(transactions)))
}
