// src/models/production.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::error::AppError;
use crate::models::inventory::StockRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "production_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    Planned,
    InWork,
    Ready,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Planned => "planned",
            ProductionStatus::InWork => "in_work",
            ProductionStatus::Ready => "ready",
        }
    }
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "planned" => Ok(ProductionStatus::Planned),
            "in_work" => Ok(ProductionStatus::InWork),
            "ready" => Ok(ProductionStatus::Ready),
            _ => Err(AppError::InvalidStatus),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionTask {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    /// Quantidade a produzir (> 0)
    pub qty: i32,
    pub status: ProductionStatus,
    /// Preenchido uma única vez, quando a produção entra no estoque.
    pub moved_to_stock_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Próximo passo de um move-to-stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// Já foi movida antes: devolve a tarefa sem tocar no estoque.
    AlreadyMoved,
    Move { qty: i32 },
}

impl ProductionTask {
    pub fn is_open(&self) -> bool {
        self.moved_to_stock_at.is_none()
    }

    pub fn plan_move(&self) -> Result<MovePlan, AppError> {
        if self.status != ProductionStatus::Ready {
            return Err(AppError::TaskNotReady);
        }
        if !self.is_open() {
            return Ok(MovePlan::AlreadyMoved);
        }
        Ok(MovePlan::Move { qty: self.qty })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveToStockResult {
    pub task: ProductionTask,
    /// `None` quando a tarefa já tinha sido movida.
    pub stock: Option<StockRecord>,
}

/// Filtro da listagem. Valor desconhecido lista tudo.
pub fn parse_status_filter(raw: Option<&str>) -> Option<ProductionStatus> {
    raw.and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: ProductionStatus, moved: bool) -> ProductionTask {
        let now = Utc::now();
        ProductionTask {
            id: 1,
            order_id: 10,
            product_id: 20,
            qty: 5,
            status,
            moved_to_stock_at: moved.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_ready_tasks_move() {
        let err = task(ProductionStatus::InWork, false).plan_move().unwrap_err();
        assert_eq!(err.to_string(), "Task must be ready");
        assert_eq!(
            task(ProductionStatus::Ready, false).plan_move().unwrap(),
            MovePlan::Move { qty: 5 }
        );
    }

    #[test]
    fn second_move_is_idempotent() {
        assert_eq!(
            task(ProductionStatus::Ready, true).plan_move().unwrap(),
            MovePlan::AlreadyMoved
        );
    }

    #[test]
    fn unknown_filter_lists_everything() {
        assert_eq!(parse_status_filter(Some("ready")), Some(ProductionStatus::Ready));
        assert_eq!(parse_status_filter(Some("done")), None);
        assert_eq!(parse_status_filter(None), None);
    }

    #[test]
    fn status_parsing_rejects_unknown_values() {
        assert!(matches!("finished".parse::<ProductionStatus>(), Err(AppError::InvalidStatus)));
        assert_eq!(" in_work ".parse::<ProductionStatus>().unwrap(), ProductionStatus::InWork);
    }
}
