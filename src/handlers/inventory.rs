// src/handlers/inventory.rs

use axum::{
    extract::{Query, State},
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
    models::inventory::{MovementFilter, Reconciliation, StockMovement, StockRecord, Warehouse, WarehouseStocks},
};

// ---
// Armazéns
// ---

#[utoipa::path(
    get,
    path = "/api/ops/warehouses",
    tag = "Warehouses",
    responses(
        (status = 200, description = "Armazéns cadastrados (o padrão MSK sempre aparece)", body = Vec<Warehouse>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_warehouses(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let warehouses = app_state
        .warehouse_service
        .list_warehouses(&mut *conn)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(warehouses)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWarehousePayload {
    #[validate(length(max = 32, message = "O código deve ter no máximo 32 caracteres."))]
    #[schema(example = "SPB")]
    pub code: String,
    #[validate(length(max = 120, message = "O nome deve ter no máximo 120 caracteres."))]
    pub name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/ops/warehouses",
    tag = "Warehouses",
    request_body = UpsertWarehousePayload,
    responses(
        (status = 200, description = "Armazém criado ou renomeado", body = Warehouse),
        (status = 400, description = "Código vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_warehouse(
    State(app_state): State<AppState>,
    locale: Locale,
    ValidatedJson(payload): ValidatedJson<UpsertWarehousePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let warehouse = app_state
        .warehouse_service
        .upsert_warehouse(&mut *conn, &payload.code, payload.name.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(warehouse)))
}

// ---
// Saldos
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StocksQuery {
    /// Código do armazém (padrão MSK)
    pub warehouse: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ops/stocks",
    tag = "Stocks",
    params(StocksQuery),
    responses(
        (status = 200, description = "Saldos do armazém", body = WarehouseStocks)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_stocks(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<StocksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let stocks = app_state
        .ledger_service
        .list_stocks(&mut *conn, query.warehouse.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(stocks)))
}

// Payload comum de entrada / baixa / ajuste.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockChangePayload {
    #[validate(length(max = 32, message = "O código deve ter no máximo 32 caracteres."))]
    pub warehouse: Option<String>,

    #[validate(range(min = 1, message = "O campo 'productId' deve ser positivo."))]
    #[schema(example = 42)]
    pub product_id: i64,

    /// Entrada/baixa: quantidade (> 0). Ajuste: novo valor absoluto.
    #[schema(example = 10)]
    pub qty: i32,

    #[validate(length(max = 500, message = "A observação deve ter no máximo 500 caracteres."))]
    pub note: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/ops/stocks/receive",
    tag = "Stocks",
    request_body = StockChangePayload,
    responses(
        (status = 200, description = "Entrada registrada", body = StockRecord),
        (status = 400, description = "Quantidade inválida"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    ValidatedJson(payload): ValidatedJson<StockChangePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let record = app_state
        .ledger_service
        .receive_stock(
            &mut *conn,
            payload.warehouse.as_deref(),
            payload.product_id,
            payload.qty,
            payload.note.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(record)))
}

#[utoipa::path(
    post,
    path = "/api/ops/stocks/issue",
    tag = "Stocks",
    request_body = StockChangePayload,
    responses(
        (status = 200, description = "Baixa registrada (com piso em zero)", body = StockRecord),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn issue_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    ValidatedJson(payload): ValidatedJson<StockChangePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let record = app_state
        .ledger_service
        .issue_stock(
            &mut *conn,
            payload.warehouse.as_deref(),
            payload.product_id,
            payload.qty,
            payload.note.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(record)))
}

#[utoipa::path(
    post,
    path = "/api/ops/stocks/adjust",
    tag = "Stocks",
    request_body = StockChangePayload,
    responses(
        (status = 200, description = "Saldo disponível redefinido", body = StockRecord),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    ValidatedJson(payload): ValidatedJson<StockChangePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let record = app_state
        .ledger_service
        .adjust_stock(
            &mut *conn,
            payload.warehouse.as_deref(),
            payload.product_id,
            payload.qty,
            payload.note.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(record)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreservePayload {
    #[validate(length(max = 32, message = "O código deve ter no máximo 32 caracteres."))]
    pub warehouse: Option<String>,

    #[validate(range(min = 1, message = "O campo 'productId' deve ser positivo."))]
    pub product_id: i64,

    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub qty: i32,

    pub order_id: Option<i64>,

    #[validate(length(max = 500, message = "A observação deve ter no máximo 500 caracteres."))]
    pub note: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/ops/stocks/unreserve",
    tag = "Stocks",
    request_body = UnreservePayload,
    responses(
        (status = 200, description = "Reserva liberada", body = StockRecord),
        (status = 400, description = "Reserva insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn unreserve_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    ValidatedJson(payload): ValidatedJson<UnreservePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let record = app_state
        .ledger_service
        .unreserve_stock(
            &mut *conn,
            payload.warehouse.as_deref(),
            payload.product_id,
            payload.qty,
            payload.order_id,
            payload.note.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(record)))
}

// ---
// Diário
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct MovementsQuery {
    pub warehouse: Option<String>,
    pub product_id: Option<i64>,
    pub order_id: Option<i64>,
    /// Máximo de linhas (padrão 100, teto 1000)
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/ops/stocks/movements",
    tag = "Stocks",
    params(MovementsQuery),
    responses(
        (status = 200, description = "Movimentações, mais recentes primeiro", body = Vec<StockMovement>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<MovementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = MovementFilter::new(query.warehouse.as_deref(), query.product_id, query.order_id, query.limit);

    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let movements = app_state
        .ledger_service
        .list_movements(&mut *conn, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(movements)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ReconcileQuery {
    pub warehouse: Option<String>,
    pub product_id: i64,
}

#[utoipa::path(
    get,
    path = "/api/ops/stocks/reconcile",
    tag = "Stocks",
    params(ReconcileQuery),
    responses(
        (status = 200, description = "Saldo gravado x saldo refeito a partir do diário", body = Reconciliation)
    ),
    security(("api_jwt" = []))
)]
pub async fn reconcile_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ReconcileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let report = app_state
        .ledger_service
        .reconcile(&mut *conn, query.warehouse.as_deref(), query.product_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(report)))
}
