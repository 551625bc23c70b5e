// src/models/operations.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Confirmed,
    InWork,
    Shipped,
    Closed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::New,
        OrderStatus::Confirmed,
        OrderStatus::InWork,
        OrderStatus::Shipped,
        OrderStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InWork => "in_work",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Closed => "closed",
        }
    }

    /// Estados a partir dos quais se pode chegar a `self`.
    pub fn allowed_predecessors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::New => &[],
            OrderStatus::Confirmed => &[OrderStatus::New],
            OrderStatus::InWork => &[OrderStatus::Confirmed],
            OrderStatus::Shipped => &[OrderStatus::Confirmed, OrderStatus::InWork],
            // Fechar antes da expedição devolve as reservas do pedido.
            OrderStatus::Closed => &[
                OrderStatus::New,
                OrderStatus::Confirmed,
                OrderStatus::InWork,
                OrderStatus::Shipped,
            ],
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or(AppError::InvalidStatus)
    }
}

/// O que o coordenador deve fazer ao receber um pedido de mudança de status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Mesmo status: nada a fazer (não reserva nem expede de novo).
    Unchanged,
    Apply { from: OrderStatus, to: OrderStatus },
}

pub fn plan_transition(from: OrderStatus, to: OrderStatus) -> Result<TransitionPlan, AppError> {
    if from == to {
        return Ok(TransitionPlan::Unchanged);
    }
    if to.allowed_predecessors().contains(&from) {
        Ok(TransitionPlan::Apply { from, to })
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "shipment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Created,
    Shipped,
}

// --- Pedidos ---

/// Linha do pedido como gravada no JSONB. Campos extras (preço, nome...) são ignorados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default, deserialize_with = "lenient_int")]
    #[schema(example = 42)]
    pub product_id: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    #[schema(example = 3)]
    pub quantity: i32,
}

/// Os itens vêm de fora: aceita número inteiro, `2.0` ou `"2"`. Qualquer outra
/// coisa vira 0 e a linha simplesmente não é acionável.
fn lenient_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    fn whole(f: f64) -> Option<i64> {
        (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
    }

    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(whole),
        _ => None,
    };
    Ok(number.and_then(|n| T::try_from(n).ok()).unwrap_or_default())
}

impl OrderLine {
    /// Linhas com produto ou quantidade não positivos não participam de reserva/expedição.
    pub fn is_actionable(&self) -> bool {
        self.product_id > 0 && self.quantity > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    #[schema(example = "Ivan Petrov")]
    pub customer_name: String,
    pub email: String,
    pub status: OrderStatus,
    #[schema(value_type = Vec<OrderLine>)]
    pub items: Json<Vec<OrderLine>>,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Linhas acionáveis, ordenadas por produto (ordem fixa de locks entre pedidos).
    pub fn actionable_lines(&self) -> Vec<OrderLine> {
        let mut lines: Vec<OrderLine> = self.items.0.iter().copied().filter(OrderLine::is_actionable).collect();
        lines.sort_by_key(|line| line.product_id);
        lines
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: i64,
    pub order_id: i64,
    pub status: ShipmentStatus,
    pub shipped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderComment {
    pub id: i64,
    pub order_id: i64,
    pub author_user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// --- Resultado da reserva ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineReservation {
    pub product_id: i64,
    pub requested: i32,
    pub reserved: i32,
    /// Falta enviada para produção (também somada em `onOrderQty`).
    pub missing: i32,
    pub production_task_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub order_id: i64,
    pub warehouse: String,
    pub lines: Vec<LineReservation>,
    /// Produtos que não existem mais no catálogo (linha ignorada).
    pub skipped_products: Vec<i64>,
}

impl ReservationSummary {
    pub fn total_reserved(&self) -> i32 {
        self.lines.iter().map(|l| l.reserved).sum()
    }

    pub fn total_missing(&self) -> i32 {
        self.lines.iter().map(|l| l.missing).sum()
    }
}

// --- Filtros ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_id: Option<i64>,
    /// Já em minúsculas, para `LIKE` em nome/e-mail.
    pub text: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    /// Monta o filtro a partir da query string crua.
    /// `q` só com dígitos busca pelo id; qualquer outra coisa busca por nome/e-mail.
    /// Status desconhecido é ignorado (lista todos), como na produção.
    pub fn parse(
        status: Option<&str>,
        q: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Self, AppError> {
        let status = status.and_then(|s| s.parse::<OrderStatus>().ok());

        let mut filter = OrderFilter {
            status,
            date_from: parse_date_bound(date_from)?,
            date_to: parse_date_bound(date_to)?,
            ..Default::default()
        };

        if let Some(q) = q.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty()) {
            if q.chars().all(|c| c.is_ascii_digit()) {
                filter.order_id = Some(q.parse().map_err(|_| AppError::MalformedRequest(format!("invalid order id '{q}'")))?);
            } else {
                filter.text = Some(q);
            }
        }

        Ok(filter)
    }
}

/// Aceita RFC 3339 ou só a data (meia-noite UTC).
fn parse_date_bound(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| AppError::MalformedRequest(format!("invalid date '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with(items: Vec<OrderLine>) -> Order {
        Order {
            id: 1,
            customer_name: String::new(),
            email: String::new(),
            status: OrderStatus::New,
            items: Json(items),
            created_at: Utc::now(),
            shipped_at: None,
            closed_at: None,
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!(matches!("paid".parse::<OrderStatus>(), Err(AppError::InvalidStatus)));
    }

    #[test]
    fn transition_table() {
        use OrderStatus::*;
        assert!(plan_transition(New, Confirmed).is_ok());
        assert!(plan_transition(Confirmed, InWork).is_ok());
        assert!(plan_transition(InWork, Shipped).is_ok());
        assert!(plan_transition(Confirmed, Shipped).is_ok());
        assert!(plan_transition(Shipped, Closed).is_ok());
        assert!(plan_transition(New, Closed).is_ok());

        assert!(matches!(plan_transition(New, Shipped), Err(AppError::InvalidTransition { .. })));
        assert!(matches!(plan_transition(Closed, New), Err(AppError::InvalidTransition { .. })));
        assert!(matches!(plan_transition(Shipped, Confirmed), Err(AppError::InvalidTransition { .. })));
        assert!(plan_transition(Confirmed, Closed).is_ok());
        assert!(plan_transition(InWork, Closed).is_ok());
        assert!(matches!(plan_transition(Closed, Confirmed), Err(AppError::InvalidTransition { .. })));
    }

    #[test]
    fn same_status_is_a_no_op() {
        assert_eq!(
            plan_transition(OrderStatus::Confirmed, OrderStatus::Confirmed).unwrap(),
            TransitionPlan::Unchanged
        );
    }

    #[test]
    fn order_lines_ignore_extra_fields_and_bad_rows() {
        let items: Vec<OrderLine> = serde_json::from_value(serde_json::json!([
            {"productId": 9, "quantity": 1, "price": 100, "title": "Chair"},
            {"productId": 3, "quantity": 2},
            {"productId": 0, "quantity": 5},
            {"productId": 4, "quantity": -1},
            {"quantity": 2}
        ]))
        .unwrap();

        let order = order_with(items);
        let lines = order.actionable_lines();
        assert_eq!(lines.iter().map(|l| l.product_id).collect::<Vec<_>>(), vec![3, 9]);
    }

    #[test]
    fn loosely_typed_items_are_coerced() {
        let items: Vec<OrderLine> = serde_json::from_value(serde_json::json!([
            {"productId": 1, "quantity": 2.0},
            {"productId": "5", "quantity": " 4 "},
            {"productId": 6, "quantity": "lots"},
            {"productId": 7, "quantity": 1.5},
            {"productId": 8, "quantity": null},
            {"productId": 9, "quantity": 9_000_000_000u64}
        ]))
        .unwrap();

        assert_eq!(items[0], OrderLine { product_id: 1, quantity: 2 });
        assert_eq!(items[1], OrderLine { product_id: 5, quantity: 4 });
        assert!(items[2..].iter().all(|line| line.quantity == 0 && !line.is_actionable()));

        let order = order_with(items);
        assert_eq!(order.actionable_lines().len(), 2);
    }

    #[test]
    fn order_filter_parses_query() {
        let by_id = OrderFilter::parse(None, Some(" 123 "), None, None).unwrap();
        assert_eq!(by_id.order_id, Some(123));
        assert_eq!(by_id.text, None);

        let by_text = OrderFilter::parse(Some("shipped"), Some("Ivan"), Some("2024-05-01"), None).unwrap();
        assert_eq!(by_text.status, Some(OrderStatus::Shipped));
        assert_eq!(by_text.text.as_deref(), Some("ivan"));
        assert!(by_text.date_from.is_some());

        assert_eq!(OrderFilter::parse(Some("bogus"), None, None, None).unwrap().status, None);
        assert!(matches!(
            OrderFilter::parse(None, None, None, Some("yesterday")),
            Err(AppError::MalformedRequest(_))
        ));
    }
}
