//! Middleware that runs the error translator at the request boundary.

use actix_web::{
    Error,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;

use super::error::{ApiError, ErrorTranslator, FrameworkError, RequestContext};

/// Rewrites every error response through [`ErrorTranslator`], using the real
/// request context and emitting the single log record for the failure.
pub struct ErrorTranslation {
    translator: ErrorTranslator,
}

impl ErrorTranslation {
    pub fn new(translator: ErrorTranslator) -> Self {
        Self { translator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorTranslation
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ErrorTranslationService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorTranslationService {
            service,
            translator: self.translator.clone(),
        }))
    }
}

pub struct ErrorTranslationService<S> {
    service: S,
    translator: ErrorTranslator,
}

impl<S, B> Service<ServiceRequest> for ErrorTranslationService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let translator = self.translator.clone();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            let translation = res.response().error().map(|error| {
                let ctx = RequestContext::from_request(res.request());
                match error.as_error::<ApiError>() {
                    Some(api_error) => translator.translate_error(api_error, &ctx),
                    None => translator.translate_error(&FrameworkError::from(error), &ctx),
                }
            });

            let Some(translation) = translation else {
                return Ok(res.map_into_left_body());
            };

            Ok(res
                .into_response(translation.into_response())
                .map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};
    use repo_core::Failure;
    use repo_core::domain::TableStatus;
    use serde_json::Value;

    use crate::middleware::error::{ACL_REDIRECT_PREFIX, ApiResult, TRY_AGAIN_LATER};

    async fn acl(path: web::Path<String>) -> ApiResult<HttpResponse> {
        let id = path.into_inner();
        if id == "syn2" {
            return Err(Failure::acl_inheritance("syn1").into());
        }
        Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
    }

    async fn contended() -> ApiResult<HttpResponse> {
        Err(Failure::TransientDataAccess("Deadlock found when trying to get lock".into()).into())
    }

    async fn table() -> ApiResult<HttpResponse> {
        Err(Failure::TableUnavailable(TableStatus::processing("syn9")).into())
    }

    async fn foreign() -> Result<HttpResponse, actix_web::Error> {
        Err(actix_web::error::ErrorImATeapot("short and stout"))
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .wrap(ErrorTranslation::new(ErrorTranslator::default()))
                .route("/repo/v1/entity/{id}/acl", web::get().to(acl))
                .route("/contended", web::get().to(contended))
                .route("/table", web::get().to(table))
                .route("/foreign", web::get().to(foreign)),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_rt::test]
    async fn test_success_passes_through() {
        let (status, body) = get("/repo/v1/entity/syn3/acl").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "syn3");
    }

    #[actix_rt::test]
    async fn test_acl_redirect_uses_request_url() {
        let (status, body) = get("/repo/v1/entity/syn2/acl").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["reason"],
            format!("{ACL_REDIRECT_PREFIX}http://localhost:8080/repo/v1/entity/syn1/acl")
        );
    }

    #[actix_rt::test]
    async fn test_transient_contention_is_generic() {
        let (status, body) = get("/contended").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, serde_json::json!({ "reason": TRY_AGAIN_LATER }));
    }

    #[actix_rt::test]
    async fn test_not_ready_returns_snapshot() {
        let (status, body) = get("/table").await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["tableId"], "syn9");
        assert_eq!(body["state"], "PROCESSING");
    }

    #[actix_rt::test]
    async fn test_foreign_error_becomes_internal() {
        let (status, body) = get("/foreign").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["reason"], "short and stout");
    }
}
