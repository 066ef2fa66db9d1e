// 健康检查API处理器
// 提供服务健康状态和版本信息查询接口

use actix_web::{http::StatusCode, web, HttpResponse, Result as ActixResult};
use serde::Serialize;
use crate::models::ApiResponse;
use crate::state::AppState;

/// 系统健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 版本信息
    pub version: String,
    /// 存储类型 (postgres / in-memory)
    pub storage: String,
    /// 存储连接状态
    pub database: String,
    /// 当前时间戳
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// 基础健康检查
///
/// GET /health
///
/// 无需认证
/// 响应: HealthResponse
pub async fn health_check(data: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let mut health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: data.storage_backend().to_string(),
        database: "not configured".to_string(),
        timestamp: chrono::Utc::now(),
    };

    // 检查数据库连接
    if let Some(pool) = &data.db_pool {
        match sqlx::query("SELECT 1").fetch_one(pool).await {
            Ok(_) => {
                health.database = "connected".to_string();
            }
            Err(e) => {
                log::error!("Database health check failed: {}", e);
                health.database = "disconnected".to_string();
                health.status = "unhealthy".to_string();
            }
        }
    }

    let status_code = if health.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok(HttpResponse::build(status_code).json(health))
}

/// 系统版本信息
///
/// GET /version
///
/// 无需认证
pub async fn version_info(data: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let version_info = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "locale": data.config.web.locale,
        "repeat_policy": data.config.payment.repeat_policy,
    });

    Ok(HttpResponse::Ok().json(ApiResponse::success(version_info)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use std::sync::Arc;
    use crate::services::{HttpPaymentGateway, LogMailer};

    fn state() -> web::Data<AppState> {
        let gateway = HttpPaymentGateway::new(std::time::Duration::from_secs(1)).unwrap();
        web::Data::new(AppState::new_for_test(Arc::new(gateway), Arc::new(LogMailer)))
    }

    #[actix_web::test]
    async fn test_health_check_in_memory() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .route("/health", web::get().to(health_check))
        ).await;

        let req = test::TestRequest::get()
            .uri("/health")
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage"], "in-memory");
    }

    #[actix_web::test]
    async fn test_version_info() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .route("/version", web::get().to(version_info))
        ).await;

        let req = test::TestRequest::get()
            .uri("/version")
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["name"], "shopcart");
        assert_eq!(body["data"]["locale"], "vi");
        assert_eq!(body["data"]["repeat_policy"], "reissue");
    }
}
