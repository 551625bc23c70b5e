// src/handlers/production.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{db_utils::get_connection, error::ApiError, extract::ValidatedJson},
    config::AppState,
    middleware::i18n::Locale,
    models::production::{MoveToStockResult, ProductionTask},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductionQuery {
    /// planned | in_work | ready (valor desconhecido lista tudo)
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ops/production",
    tag = "Production",
    params(ProductionQuery),
    responses(
        (status = 200, description = "Tarefas de produção, mais recentes primeiro", body = Vec<ProductionTask>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_production(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ProductionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let tasks = app_state
        .production_service
        .list_production(&mut *conn, query.status.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(tasks)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetProductionStatusPayload {
    #[schema(example = "ready")]
    pub status: String,
}

#[utoipa::path(
    patch,
    path = "/api/ops/production/{id}/status",
    tag = "Production",
    request_body = SetProductionStatusPayload,
    params(("id" = i64, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Status alterado", body = ProductionTask),
        (status = 400, description = "Status inválido"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_production_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(task_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<SetProductionStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let task = app_state
        .production_service
        .set_status(&mut *conn, task_id, &payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(task)))
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct MoveToStockPayload {
    #[validate(length(max = 32, message = "O código deve ter no máximo 32 caracteres."))]
    #[schema(example = "MSK")]
    pub warehouse: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/ops/production/{id}/move-to-stock",
    tag = "Production",
    request_body(content = MoveToStockPayload, description = "Opcional; sem corpo usa o armazém padrão"),
    params(("id" = i64, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Produção lançada no estoque (stock nulo se já tinha sido)", body = MoveToStockResult),
        (status = 400, description = "Tarefa não está pronta"),
        (status = 404, description = "Tarefa ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_to_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(task_id): Path<i64>,
    payload: Option<ValidatedJson<MoveToStockPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let warehouse = payload.and_then(|ValidatedJson(p)| p.warehouse);

    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let result = app_state
        .production_service
        .move_to_stock(&mut *conn, task_id, warehouse.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(result)))
}
