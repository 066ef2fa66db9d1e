// CORS中间件配置
// 处理跨域请求，前端页面需要携带收藏/浏览Cookie访问接口

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderValue};
use reqwest::Url;

/// 本机开发环境的主机名
const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// 判断来源是否为本机 (主机名精确匹配，端口不限)
fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Ok(url) = Url::parse(origin) else {
        return false;
    };

    matches!(url.scheme(), "http" | "https")
        && url
            .host_str()
            .map_or(false, |host| LOCAL_HOSTS.contains(&host))
}

/// 创建CORS中间件
///
/// # Arguments
/// * `allowed_origins` - 允许的源列表，为空时只允许本机来源
///
/// # Returns
/// * 配置好的CORS中间件
pub fn create_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::LOCATION])
        .supports_credentials()
        .max_age(3600);

    if allowed_origins.is_empty() {
        cors = cors.allowed_origin_fn(|origin, _req_head| is_local_origin(origin));
    } else {
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_configured_origin_is_allowed() {
        let origins = vec!["https://shop.vn".to_string()];
        let app = test::init_service(
            App::new()
                .wrap(create_cors(&origins))
                .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, "https://shop.vn"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://shop.vn"
        );
    }

    #[actix_web::test]
    async fn test_local_origin_allowed_by_default() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(&[]))
                .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[actix_web::test]
    async fn test_lookalike_local_origin_rejected() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(&[]))
                .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for origin in ["http://localhost.evil.example", "http://127.0.0.1.evil.example:8080"] {
            let req = test::TestRequest::get()
                .uri("/health")
                .insert_header((header::ORIGIN, origin))
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
            assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
        }
    }

    #[actix_web::test]
    async fn test_is_local_origin_matches_host_exactly() {
        assert!(is_local_origin(&HeaderValue::from_static("http://localhost")));
        assert!(is_local_origin(&HeaderValue::from_static("https://127.0.0.1:8443")));
        assert!(!is_local_origin(&HeaderValue::from_static("http://localhost.evil.example")));
        assert!(!is_local_origin(&HeaderValue::from_static("http://localhostevil.example")));
        assert!(!is_local_origin(&HeaderValue::from_static("null")));
    }
}
