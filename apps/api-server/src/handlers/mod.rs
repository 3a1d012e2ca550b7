//! HTTP handlers and route configuration.

mod fallback;
mod health;

use actix_web::web;

pub use fallback::route_not_found;

/// Path of the health endpoint, exempt from the stack status gate.
pub const HEALTH_PATH: &str = "/api/health";

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api").service(
            web::resource("/health")
                .route(web::get().to(health::health_check))
                .default_service(web::to(fallback::method_not_allowed)),
        ),
    );
}
