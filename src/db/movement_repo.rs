// src/db/movement_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::inventory::{HeldReservation, MovementFilter, NewMovement, StockMovement},
};

// Diário append-only: este repositório não tem UPDATE nem DELETE.
#[derive(Clone, Default)]
pub struct MovementRepository;

impl MovementRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn append<'e, E>(&self, executor: E, movement: &NewMovement<'_>) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (warehouse, product_id, type, qty, order_id, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, warehouse, product_id, type, qty, order_id, note, created_at
            "#,
        )
        .bind(movement.warehouse)
        .bind(movement.product_id)
        .bind(movement.draft.movement_type)
        .bind(movement.draft.qty)
        .bind(movement.order_id)
        .bind(movement.note)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Histórico, mais recente primeiro.
    pub async fn list<'e, E>(&self, executor: E, filter: &MovementFilter) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, warehouse, product_id, type, qty, order_id, note, created_at
            FROM stock_movements
            WHERE ($1::varchar IS NULL OR warehouse = $1)
              AND ($2::bigint IS NULL OR product_id = $2)
              AND ($3::bigint IS NULL OR order_id = $3)
            ORDER BY id DESC
            LIMIT $4
            "#,
        )
        .bind(filter.warehouse.as_deref())
        .bind(filter.product_id)
        .bind(filter.order_id)
        .bind(filter.limit)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Diário completo de uma chave, em ordem de gravação (para replay).
    pub async fn journal_for<'e, E>(&self, executor: E, warehouse: &str, product_id: i64) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, warehouse, product_id, type, qty, order_id, note, created_at
            FROM stock_movements
            WHERE warehouse = $1 AND product_id = $2
            ORDER BY id ASC
            "#,
        )
        .bind(warehouse)
        .bind(product_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Quanto cada chave ainda segura para o pedido: reservas menos liberações e expedições.
    pub async fn held_by_order<'e, E>(&self, executor: E, order_id: i64) -> Result<Vec<HeldReservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, HeldReservation>(
            r#"
            SELECT warehouse, product_id, held AS qty
            FROM (
                SELECT warehouse, product_id,
                       SUM(CASE type
                               WHEN 'reserve' THEN qty
                               WHEN 'unreserve' THEN -qty
                               WHEN 'out' THEN -qty
                               ELSE 0
                           END)::bigint AS held
                FROM stock_movements
                WHERE order_id = $1
                GROUP BY warehouse, product_id
            ) per_key
            WHERE held > 0
            ORDER BY warehouse ASC, product_id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
