// src/handlers/operations.rs

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
    models::{
        auth::Caller,
        operations::{Order, OrderComment, OrderFilter, OrderStatus},
    },
};

// =========================================================================
//  PEDIDOS
// =========================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct OrdersQuery {
    pub status: Option<String>,
    /// Só dígitos = ID do pedido; senão busca em nome/e-mail
    pub q: Option<String>,
    /// RFC 3339 ou AAAA-MM-DD
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ops/orders",
    tag = "Orders",
    params(OrdersQuery),
    responses(
        (status = 200, description = "Pedidos, mais recentes primeiro", body = Vec<Order>),
        (status = 400, description = "Filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = OrderFilter::parse(
        query.status.as_deref(),
        query.q.as_deref(),
        query.date_from.as_deref(),
        query.date_to.as_deref(),
    )
    .map_err(|e| e.to_api_error(&locale))?;

    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let orders = app_state
        .operation_service
        .list_orders(&mut *conn, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(orders)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetOrderStatusPayload {
    /// new | confirmed | in_work | shipped | closed
    #[schema(example = "confirmed")]
    pub status: String,
    /// Armazém usado na reserva/expedição (padrão MSK)
    #[validate(length(max = 32, message = "O código deve ter no máximo 32 caracteres."))]
    pub warehouse: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/ops/orders/{id}/status",
    tag = "Orders",
    request_body = SetOrderStatusPayload,
    params(("id" = i64, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Status alterado (reserva/expedição aplicadas)", body = Order),
        (status = 400, description = "Status ou transição inválida, reserva insuficiente"),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido ou saldo travado por outra operação")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(order_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<SetOrderStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let target = payload
        .status
        .parse::<OrderStatus>()
        .map_err(|e| e.to_api_error(&locale))?;

    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let order = app_state
        .operation_service
        .set_order_status(&mut *conn, order_id, target, payload.warehouse.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(order)))
}

// =========================================================================
//  COMENTÁRIOS
// =========================================================================

#[utoipa::path(
    get,
    path = "/api/ops/orders/{id}/comments",
    tag = "Orders",
    params(("id" = i64, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Comentários do pedido", body = Vec<OrderComment>),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_comments(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let comments = app_state
        .operation_service
        .list_comments(&mut *conn, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(comments)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddCommentPayload {
    #[validate(length(max = 2000, message = "O comentário deve ter no máximo 2000 caracteres."))]
    pub text: String,
}

#[utoipa::path(
    post,
    path = "/api/ops/orders/{id}/comments",
    tag = "Orders",
    request_body = AddCommentPayload,
    params(("id" = i64, Path, description = "ID do pedido")),
    responses(
        (status = 201, description = "Comentário adicionado", body = OrderComment),
        (status = 400, description = "Comentário vazio"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_comment(
    State(app_state): State<AppState>,
    locale: Locale,
    caller: Caller,
    Path(order_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<AddCommentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let comment = app_state
        .operation_service
        .add_comment(&mut *conn, order_id, caller.user_id, &payload.text)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(comment)))
}
