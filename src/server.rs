/// HTTP server factory and configuration.
/// Provides a reusable route table and server constructors for use in both
/// the main binary and tests.

use crate::config::ServerConfig;
use crate::db::DbPool;
use crate::handlers::{
    authenticate, get_presale_end, get_progress_bar, health, init_admin, json_config,
    list_wallet_addresses, register_wallet_address, set_presale_end, set_progress_bar,
    verify_token,
};
use actix_web::{middleware, web, App, HttpServer};

/// Register every endpoint under `/api`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .route("/health", web::get().to(health))
            .route("/init-admin", web::get().to(init_admin))
            .route("/authenticate", web::post().to(authenticate))
            .route("/verify-token", web::get().to(verify_token))
            .route("/presale-end", web::post().to(set_presale_end))
            .route("/presale-end", web::get().to(get_presale_end))
            .route("/progress-bar", web::post().to(set_progress_bar))
            .route("/progress-bar", web::get().to(get_progress_bar))
            .route("/wallet-address", web::post().to(register_wallet_address))
            .route("/wallet-address", web::get().to(list_wallet_addresses)),
    );
}

/// Create a configured HTTP server
///
/// Takes a database pool, the handler config and a bind address, then returns a
/// running `Server`. The pool does not dial the store until the first request
/// that needs it.
///
/// # Example
/// ```ignore
/// let pool = web::Data::new(db::create_pool("presale.db"));
/// let config = web::Data::new(ServerConfig::new(Some("admin-password"), "jwt-secret"));
/// let server = server::create_http_server(pool, config, "127.0.0.1:4000")?;
/// server.await?;
/// ```
pub fn create_http_server(
    pool: web::Data<DbPool>,
    config: web::Data<ServerConfig>,
    bind_addr: &str,
) -> std::io::Result<actix_web::dev::Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(config.clone())
            .wrap(middleware::Logger::default())
            .configure(configure_api)
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}

/// Create a test HTTP server with an in-memory database.
/// Binds to a random available port.
///
/// # Returns
/// A tuple of (server, bind_address) where bind_address can be used to make requests
pub fn create_test_http_server(
    config: ServerConfig,
) -> std::io::Result<(actix_web::dev::Server, String)> {
    let pool = web::Data::new(crate::db::create_test_pool());
    let config = web::Data::new(config);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(config.clone())
            .wrap(middleware::Logger::default())
            .configure(configure_api)
    })
    .bind("127.0.0.1:0")?;

    // Get the actual bind address (including the assigned port)
    let addr_str = server
        .addrs()
        .first()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "No bind address found"))?
        .to_string();

    Ok((server.run(), addr_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use actix_web::http::header;
    use actix_web::test;

    const SECRET: &str = "test-signing-secret";

    fn test_config() -> web::Data<ServerConfig> {
        web::Data::new(ServerConfig::new(Some("correct horse"), SECRET))
    }

    #[actix_web::test]
    async fn test_create_http_server_with_test_pool() {
        let pool = web::Data::new(crate::db::create_test_pool());
        let result = create_http_server(pool, test_config(), "127.0.0.1:0");
        assert!(result.is_ok(), "create_http_server should succeed");
    }

    #[actix_web::test]
    async fn test_create_http_server_invalid_address() {
        let pool = web::Data::new(crate::db::create_test_pool());
        let result = create_http_server(pool, test_config(), "invalid_address:99999");
        assert!(result.is_err(), "create_http_server should fail with invalid address");
    }

    #[actix_web::test]
    async fn test_create_test_http_server() {
        let (_server, addr) = create_test_http_server(ServerConfig::new(None, SECRET))
            .expect("create_test_http_server should succeed");
        assert!(addr.contains("127.0.0.1:"), "Address should contain 127.0.0.1:");
        let port_part = addr.split(':').nth(1).unwrap_or("");
        assert!(!port_part.is_empty(), "Port should be assigned");
    }

    #[actix_web::test]
    async fn test_health_endpoint() {
        let pool = web::Data::new(crate::db::create_test_pool());
        let app = test::init_service(
            App::new()
                .app_data(pool.clone())
                .app_data(test_config())
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert!(!pool.is_connected().await, "health must not dial the store");
    }

    #[actix_web::test]
    async fn test_routes_live_under_api_prefix() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(crate::db::create_test_pool()))
                .app_data(test_config())
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::get().uri("/progress-bar").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_protected_route_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(crate::db::create_test_pool()))
                .app_data(test_config())
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/progress-bar")
            .set_json(serde_json::json!({ "value": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let token = issue_token(SECRET, 3600).expect("Failed to issue token");
        let req = test::TestRequest::post()
            .uri("/api/progress-bar")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .set_json(serde_json::json!({ "value": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_malformed_body_is_json_400() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(crate::db::create_test_pool()))
                .app_data(test_config())
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/wallet-address")
            .set_json(serde_json::json!({ "address": 12345 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap_or("").starts_with("Invalid request body"));
    }
}
