//! # Repository API Server
//!
//! The main entry point for the Actix-web HTTP server. Every response that
//! carries a failure passes through the error translator before it leaves.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod extract;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;
#[cfg(test)]
mod test_support;

use config::AppConfig;
use middleware::stack_status::StackStatusGate;
use middleware::translation::ErrorTranslation;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Subscriber first, so configuration warnings are not lost
    let telemetry_config = TelemetryConfig::from_lookup(|key| std::env::var(key).ok());
    telemetry::init_telemetry(&telemetry_config);

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting repository API server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config);
    let max_payload = config.max_payload_bytes;

    HttpServer::new(move || {
        App::new()
            .wrap(
                StackStatusGate::new(state.stack_status, state.stack_status_message.clone())
                    .exempt(handlers::HEALTH_PATH),
            )
            .wrap(ErrorTranslation::new(state.translator.clone()))
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(extract::json_config(max_payload))
            .app_data(extract::form_config(max_payload))
            .app_data(extract::query_config())
            .app_data(extract::path_config())
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::route_not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::middleware::stack_status::StackStatus;
    use crate::observability::request_id::REQUEST_ID_HEADER;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }

    async fn send(config: AppConfig, req: test::TestRequest) -> (StatusCode, Option<String>, Value) {
        let state = AppState::new(&config);
        let app = test::init_service(
            App::new()
                .wrap(
                    StackStatusGate::new(state.stack_status, state.stack_status_message.clone())
                        .exempt(handlers::HEALTH_PATH),
                )
                .wrap(ErrorTranslation::new(state.translator.clone()))
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(state.clone()))
                .app_data(extract::json_config(config.max_payload_bytes))
                .app_data(extract::query_config())
                .app_data(extract::path_config())
                .configure(handlers::configure_routes)
                .default_service(web::to(handlers::route_not_found)),
        )
        .await;

        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let request_id = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body: Value = test::read_body_json(resp).await;
        (status, request_id, body)
    }

    #[actix_rt::test]
    async fn test_health() {
        let (status, request_id, body) =
            send(config(&[]), test::TestRequest::get().uri("/api/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(request_id.is_some());
        assert_eq!(body["status"], "ok");
        assert_eq!(body["stack_status"], "READ_WRITE");
    }

    #[actix_rt::test]
    async fn test_unknown_route_references_docs() {
        let cfg = config(&[("API_DOCS_URL", "https://docs.example/rest/")]);
        let (status, request_id, body) =
            send(cfg, test::TestRequest::delete().uri("/repo/v1/nowhere?x=1")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(request_id.is_some());
        assert_eq!(
            body["reason"],
            "DELETE http://localhost:8080/repo/v1/nowhere was not found. \
             Please reference API documentation at https://docs.example/rest/"
        );
    }

    #[actix_rt::test]
    async fn test_wrong_verb_is_method_not_allowed() {
        let (status, _, body) =
            send(config(&[]), test::TestRequest::post().uri("/api/health")).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body["reason"],
            "Request method 'POST' is not supported for /api/health"
        );
    }

    #[actix_rt::test]
    async fn test_health_reachable_while_down() {
        let cfg = config(&[("STACK_STATUS", "DOWN"), ("STACK_STATUS_MESSAGE", "Upgrade")]);
        assert_eq!(cfg.stack_status, StackStatus::Down);

        let (status, _, body) =
            send(cfg.clone(), test::TestRequest::get().uri("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stack_status"], "DOWN");
        assert_eq!(body["stack_status_message"], "Upgrade");

        let (status, _, body) = send(cfg, test::TestRequest::get().uri("/repo/v1/entity")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["reason"],
            "The repository is down for maintenance: Upgrade"
        );
    }
}
