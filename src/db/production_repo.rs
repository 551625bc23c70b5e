// src/db/production_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::production::{ProductionStatus, ProductionTask},
};

const TASK_COLUMNS: &str = "id, order_id, product_id, qty, status, moved_to_stock_at, created_at, updated_at";

#[derive(Clone, Default)]
pub struct ProductionRepository;

impl ProductionRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find<'e, E>(&self, executor: E, task_id: i64) -> Result<Option<ProductionTask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {TASK_COLUMNS} FROM production_tasks WHERE id = $1");
        let task = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(task_id)
            .fetch_optional(executor)
            .await?;
        Ok(task)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, task_id: i64) -> Result<Option<ProductionTask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {TASK_COLUMNS} FROM production_tasks WHERE id = $1 FOR UPDATE");
        let task = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(task_id)
            .fetch_optional(executor)
            .await?;
        Ok(task)
    }

    /// Tarefa aberta (ainda não movida) mais recente do par pedido+produto, travada.
    pub async fn find_open_for_update<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        product_id: i64,
    ) -> Result<Option<ProductionTask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS} FROM production_tasks
            WHERE order_id = $1 AND product_id = $2 AND moved_to_stock_at IS NULL
            ORDER BY id DESC
            LIMIT 1
            FOR UPDATE
            "#
        );
        let task = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(order_id)
            .bind(product_id)
            .fetch_optional(executor)
            .await?;
        Ok(task)
    }

    pub async fn create<'e, E>(&self, executor: E, order_id: i64, product_id: i64, qty: i32) -> Result<ProductionTask, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO production_tasks (order_id, product_id, qty, status)
            VALUES ($1, $2, $3, 'planned')
            RETURNING {TASK_COLUMNS}
            "#
        );
        let task = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(order_id)
            .bind(product_id)
            .bind(qty)
            .fetch_one(executor)
            .await?;
        Ok(task)
    }

    pub async fn add_qty<'e, E>(&self, executor: E, task_id: i64, extra: i32) -> Result<ProductionTask, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE production_tasks SET qty = qty + $2, updated_at = NOW() WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(task_id)
            .bind(extra)
            .fetch_one(executor)
            .await?;
        Ok(task)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        task_id: i64,
        status: ProductionStatus,
    ) -> Result<Option<ProductionTask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE production_tasks SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(task_id)
            .bind(status)
            .fetch_optional(executor)
            .await?;
        Ok(task)
    }

    /// Carimba `moved_to_stock_at`. O filtro `IS NULL` garante uma única vez.
    pub async fn mark_moved<'e, E>(&self, executor: E, task_id: i64) -> Result<ProductionTask, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE production_tasks
            SET moved_to_stock_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND moved_to_stock_at IS NULL
            RETURNING {TASK_COLUMNS}
            "#
        );
        let task = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(task_id)
            .fetch_one(executor)
            .await?;
        Ok(task)
    }

    pub async fn list<'e, E>(&self, executor: E, status: Option<ProductionStatus>) -> Result<Vec<ProductionTask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS} FROM production_tasks
            WHERE ($1::production_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "#
        );
        let tasks = sqlx::query_as::<_, ProductionTask>(&sql)
            .bind(status)
            .fetch_all(executor)
            .await?;
        Ok(tasks)
    }
}
