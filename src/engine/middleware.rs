//! Cross-cutting HTTP layers applied to every route table.
//!
//! # Responsibilities
//! - Stamp every response with the engine version header
//! - Generate and propagate `x-request-id`
//! - Enforce the request timeout
//! - Emit request spans

use axum::http::{HeaderName, HeaderValue, Request};
use axum::Router;
use std::time::Duration;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::HttpConfig;

/// Header carrying the engine version on every response.
pub const ENGINE_HEADER: HeaderName = HeaderName::from_static("x-sentinel-engine");

/// Request IDs backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Wrap a route table in the engine's middleware stack.
#[allow(deprecated)]
pub fn apply(router: Router, config: &HttpConfig) -> Router {
    router
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(SetResponseHeaderLayer::overriding(
            ENGINE_HEADER,
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}
