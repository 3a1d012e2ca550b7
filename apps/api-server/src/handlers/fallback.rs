//! Responses for requests that match no handler.

use actix_web::{HttpRequest, HttpResponse};
use repo_core::Failure;

use crate::middleware::error::{ApiResult, RequestContext};

/// Any path without a resource.
pub async fn route_not_found(req: HttpRequest) -> ApiResult<HttpResponse> {
    let ctx = RequestContext::from_request(&req);
    Err(Failure::route_not_found(ctx.method, ctx.url).into())
}

/// A known resource requested with a verb it does not support.
pub async fn method_not_allowed(req: HttpRequest) -> ApiResult<HttpResponse> {
    Err(Failure::MethodNotAllowed(format!(
        "Request method '{}' is not supported for {}",
        req.method(),
        req.path()
    ))
    .into())
}
