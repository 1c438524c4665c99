//! Identity routes and route table construction.
//!
//! A route table is built from one immutable model and never changes;
//! a reload builds a new table and swaps the listener over to it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::config::HttpConfig;
use crate::engine::middleware;
use crate::model::{Info, Model};

/// Path suffix of every identity endpoint.
pub const INFO_PATH: &str = "_info";

/// Path of the identity endpoint for `code`.
pub fn info_path(code: &str) -> String {
    format!("/{code}/{INFO_PATH}")
}

#[derive(Clone)]
struct RouteTable {
    points: Arc<Model>,
}

/// Build the complete router for `model`.
///
/// The engine identity is always served at `/{identity.code}/_info` and takes
/// precedence over a control point sharing its code.
pub fn build_router(identity: &Info, model: Model, config: &HttpConfig) -> Router {
    if model.contains(&identity.code) {
        tracing::warn!(
            code = %identity.code,
            "Control point shadowed by the engine identity route"
        );
    }

    let identity = Arc::new(identity.clone());
    let table = RouteTable {
        points: Arc::new(model),
    };

    let router = Router::new()
        .route(
            &info_path(&identity.code),
            get(move || {
                let identity = Arc::clone(&identity);
                async move { Json(identity.as_ref().clone()) }
            }),
        )
        .route(&format!("/{{code}}/{INFO_PATH}"), get(point_info))
        .with_state(table);

    middleware::apply(router, config)
}

async fn point_info(State(table): State<RouteTable>, Path(code): Path<String>) -> Response {
    match table.points.get(&code) {
        Some(point) => Json(point.info.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "control point not loaded").into_response(),
    }
}
