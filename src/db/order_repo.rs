// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::operations::{Order, OrderComment, OrderFilter, OrderStatus, Shipment, ShipmentStatus},
};

const ORDER_COLUMNS: &str = "id, customer_name, email, status, items, created_at, shipped_at, closed_at";
const SHIPMENT_COLUMNS: &str = "id, order_id, status, shipped_at, created_at";

#[derive(Clone, Default)]
pub struct OrderRepository;

impl OrderRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    /// Trava a linha do pedido: transições do mesmo pedido ficam em fila.
    pub async fn find_for_update<'e, E>(&self, executor: E, order_id: i64) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn exists<'e, E>(&self, executor: E, order_id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(order_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        status: OrderStatus,
        shipped_at: Option<DateTime<Utc>>,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = $2, shipped_at = $3, closed_at = $4
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(status)
            .bind(shipped_at)
            .bind(closed_at)
            .fetch_one(executor)
            .await?;
        Ok(order)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &OrderFilter) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::order_status IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR id = $2)
              AND ($3::text IS NULL OR LOWER(customer_name) LIKE '%' || $3 || '%' OR LOWER(email) LIKE '%' || $3 || '%')
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at <= $5)
            ORDER BY created_at DESC, id DESC
            "#
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(filter.status)
            .bind(filter.order_id)
            .bind(filter.text.as_deref())
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(executor)
            .await?;
        Ok(orders)
    }

    // =========================================================================
    //  EXPEDIÇÕES
    // =========================================================================

    /// Cria (se faltar) e marca como expedida, num único comando.
    pub async fn record_shipment<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        shipped_at: DateTime<Utc>,
    ) -> Result<Shipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO shipments (order_id, status, shipped_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_id) DO UPDATE
                SET status = EXCLUDED.status, shipped_at = EXCLUDED.shipped_at
            RETURNING {SHIPMENT_COLUMNS}
            "#
        );
        let shipment = sqlx::query_as::<_, Shipment>(&sql)
            .bind(order_id)
            .bind(ShipmentStatus::Shipped)
            .bind(shipped_at)
            .fetch_one(executor)
            .await?;
        Ok(shipment)
    }

    // =========================================================================
    //  COMENTÁRIOS
    // =========================================================================

    pub async fn list_comments<'e, E>(&self, executor: E, order_id: i64) -> Result<Vec<OrderComment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comments = sqlx::query_as::<_, OrderComment>(
            r#"
            SELECT id, order_id, author_user_id, text, created_at
            FROM order_comments
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(comments)
    }

    pub async fn add_comment<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        author: Uuid,
        text: &str,
    ) -> Result<OrderComment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comment = sqlx::query_as::<_, OrderComment>(
            r#"
            INSERT INTO order_comments (order_id, author_user_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, order_id, author_user_id, text, created_at
            "#,
        )
        .bind(order_id)
        .bind(author)
        .bind(text)
        .fetch_one(executor)
        .await?;
        Ok(comment)
    }
}
