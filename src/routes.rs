// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::require_manager};

pub fn create_router(app_state: AppState) -> Router {
    // Tudo em /api/ops exige gerente
    let ops_routes = Router::new()
        .route("/orders", get(handlers::operations::list_orders))
        .route("/orders/{id}/status", patch(handlers::operations::set_order_status))
        .route(
            "/orders/{id}/comments",
            get(handlers::operations::list_comments).post(handlers::operations::add_comment),
        )
        .route(
            "/warehouses",
            get(handlers::inventory::list_warehouses).post(handlers::inventory::upsert_warehouse),
        )
        .route("/stocks", get(handlers::inventory::list_stocks))
        .route("/stocks/receive", post(handlers::inventory::receive_stock))
        .route("/stocks/issue", post(handlers::inventory::issue_stock))
        .route("/stocks/adjust", post(handlers::inventory::adjust_stock))
        .route("/stocks/unreserve", post(handlers::inventory::unreserve_stock))
        .route("/stocks/movements", get(handlers::inventory::list_movements))
        .route("/stocks/reconcile", get(handlers::inventory::reconcile_stock))
        .route("/production", get(handlers::production::list_production))
        .route("/production/{id}/status", patch(handlers::production::set_production_status))
        .route("/production/{id}/move-to-stock", post(handlers::production::move_to_stock))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_manager,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/ops", ops_routes)
        .with_state(app_state)
}
