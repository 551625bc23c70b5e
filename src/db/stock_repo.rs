// src/db/stock_repo.rs

use sqlx::{Executor, PgConnection, Postgres};

use crate::{common::error::AppError, models::inventory::StockRecord};

const STOCK_COLUMNS: &str = "id, warehouse, product_id, qty, reserved_qty, on_order_qty, updated_at";

#[derive(Clone, Default)]
pub struct StockRepository;

impl StockRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn product_exists<'e, E>(&self, executor: E, product_id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// Trava o saldo (FOR UPDATE) sem criar. `None` se nunca houve movimentação.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        warehouse: &str,
        product_id: i64,
    ) -> Result<Option<StockRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE warehouse = $1 AND product_id = $2 FOR UPDATE");
        let record = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(warehouse)
            .bind(product_id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    /// Cria a linha zerada se faltar e devolve travada.
    /// Toda mutação do ledger passa por aqui: é o lock por (armazém, produto).
    pub async fn lock_or_create(
        &self,
        conn: &mut PgConnection,
        warehouse: &str,
        product_id: i64,
    ) -> Result<StockRecord, AppError> {
        sqlx::query(
            r#"
            INSERT INTO stocks (warehouse, product_id)
            VALUES ($1, $2)
            ON CONFLICT (warehouse, product_id) DO NOTHING
            "#,
        )
        .bind(warehouse)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

        self.find_for_update(&mut *conn, warehouse, product_id)
            .await?
            .ok_or_else(|| {
                AppError::InternalServerError(anyhow::anyhow!(
                    "stock row {warehouse}/{product_id} missing after insert"
                ))
            })
    }

    pub async fn save<'e, E>(&self, executor: E, record: &StockRecord) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE stocks
            SET qty = $2, reserved_qty = $3, on_order_qty = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {STOCK_COLUMNS}
            "#
        );
        let saved = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(record.id)
            .bind(record.qty)
            .bind(record.reserved_qty)
            .bind(record.on_order_qty)
            .fetch_one(executor)
            .await?;
        Ok(saved)
    }

    pub async fn list_by_warehouse<'e, E>(&self, executor: E, warehouse: &str) -> Result<Vec<StockRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE warehouse = $1 ORDER BY product_id ASC");
        let records = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(warehouse)
            .fetch_all(executor)
            .await?;
        Ok(records)
    }
}
