//! Stack status gate - rejects requests while the stack is read-only or down.

use actix_web::{
    Error,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
};
use repo_core::Failure;
use serde::Serialize;
use std::fmt;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use super::error::ApiError;

/// Operating mode of the whole stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    ReadWrite,
    ReadOnly,
    Down,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown stack status: {0}")]
pub struct UnknownStackStatus(String);

impl FromStr for StackStatus {
    type Err = UnknownStackStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "READ_WRITE" => Ok(Self::ReadWrite),
            "READ_ONLY" => Ok(Self::ReadOnly),
            "DOWN" => Ok(Self::Down),
            _ => Err(UnknownStackStatus(s.to_string())),
        }
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadWrite => "READ_WRITE",
            Self::ReadOnly => "READ_ONLY",
            Self::Down => "DOWN",
        };
        f.write_str(name)
    }
}

impl StackStatus {
    /// Whether a request with this method may proceed.
    pub fn permits(self, method: &Method) -> bool {
        match self {
            Self::ReadWrite => true,
            Self::ReadOnly => method.is_safe(),
            Self::Down => false,
        }
    }
}

/// Gate configuration shared by every worker.
#[derive(Debug)]
struct GateConfig {
    status: StackStatus,
    message: Option<String>,
    exempt_paths: Vec<String>,
}

impl GateConfig {
    fn rejection(&self) -> Failure {
        let base = match self.status {
            StackStatus::Down => "The repository is down for maintenance",
            _ => "The repository is in read-only mode",
        };
        let reason = match &self.message {
            Some(message) => format!("{base}: {message}"),
            None => format!("{base}."),
        };
        Failure::ServiceUnavailable(reason)
    }
}

/// Stack status middleware factory.
pub struct StackStatusGate {
    config: Arc<GateConfig>,
}

impl StackStatusGate {
    pub fn new(status: StackStatus, message: Option<String>) -> Self {
        Self {
            config: Arc::new(GateConfig {
                status,
                message,
                exempt_paths: Vec::new(),
            }),
        }
    }

    /// Let requests to `path` through whatever the status.
    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        if let Some(config) = Arc::get_mut(&mut self.config) {
            config.exempt_paths.push(path.into());
        }
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for StackStatusGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = StackStatusGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StackStatusGateService {
            service,
            config: self.config.clone(),
        }))
    }
}

pub struct StackStatusGateService<S> {
    service: S,
    config: Arc<GateConfig>,
}

impl<S, B> Service<ServiceRequest> for StackStatusGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let exempt = self.config.exempt_paths.iter().any(|p| p == req.path());

        if !exempt && !self.config.status.permits(req.method()) {
            let failure = self.config.rejection();
            let res = req.error_response(ApiError::from(failure));
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
