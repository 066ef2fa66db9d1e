// API路由配置
// 定义所有HTTP接口的路由规则

use actix_web::{web, Scope};
use crate::handlers::*;
use crate::middleware::AdminKeyAuth;

/// 商品路由
pub fn product_routes() -> Scope {
    web::scope("/product")
        .route("/list-by-category/{c_id}", web::get().to(list_by_category))
        .route("/list-by-keywords", web::get().to(list_by_keywords))
        .route("/detail/{id}", web::get().to(detail))
        .route("/favorite/{id}", web::get().to(favorite))
        .route("/list-by-hot/{key}", web::get().to(list_by_hot))
        .route("/send-friend", web::get().to(send_friend))
        .route("/send-friend", web::post().to(send_friend_form))
}

/// 分类路由
pub fn category_routes() -> Scope {
    web::scope("/category")
        .route("/list", web::get().to(list_categories))
}

/// 支付路由
pub fn payment_routes() -> Scope {
    web::scope("/payment")
        .route("/generate-link", web::post().to(generate_link))
        .route("/checkout", web::post().to(checkout))
        .route("/partners", web::get().to(list_partners))
        .route("/partners/{code}", web::get().to(get_partner))
        .service(
            web::resource("/transactions")
                .wrap(AdminKeyAuth)
                .route(web::get().to(list_transactions)),
        )
        .route("/transactions/{transaction_id}", web::get().to(get_transaction))
}

/// 公共路由 (健康检查、版本信息)
pub fn public_routes() -> Scope {
    web::scope("")
        .route("/health", web::get().to(health_check))
        .route("/version", web::get().to(version_info))
}

/// 请求体、查询参数和路径参数的解析错误统一返回JSON格式的400响应
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    use crate::error::AppError;

    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;
    use crate::services::{HttpPaymentGateway, LogMailer};
    use crate::state::AppState;

    #[actix_web::test]
    async fn test_bad_path_is_json_bad_request() {
        let gateway = HttpPaymentGateway::new(std::time::Duration::from_secs(1)).unwrap();
        let state = web::Data::new(AppState::new_for_test(Arc::new(gateway), Arc::new(LogMailer)));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(extractor_config)
                .service(product_routes())
                .service(public_routes()),
        )
        .await;

        let req = test::TestRequest::get().uri("/product/detail/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 400);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
