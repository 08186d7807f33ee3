// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::gateway::DispatchGateway;
use crate::presentation::handlers::dispatch_handler;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 构建 webhook 路由
pub fn routes(gateway: Arc<DispatchGateway>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version));

    let dispatch_routes = Router::new()
        .route("/start-task", post(dispatch_handler::start_task))
        .route("/start-task/{id}", get(dispatch_handler::get_task_status))
        .layer(Extension(gateway));

    Router::new()
        .merge(public_routes)
        .merge(dispatch_routes)
        .layer(TraceLayer::new_for_http())
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
