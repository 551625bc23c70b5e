// src/db/warehouse_repo.rs

use sqlx::{Executor, PgConnection, Postgres};

use crate::{common::error::AppError, models::inventory::Warehouse};

#[derive(Clone, Default)]
pub struct WarehouseRepository;

impl WarehouseRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_code<'e, E>(&self, executor: E, code: &str) -> Result<Option<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            "SELECT id, code, name, created_at FROM warehouses WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(executor)
        .await?;
        Ok(warehouse)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT id, code, name, created_at FROM warehouses ORDER BY id ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(warehouses)
    }

    /// Get-or-create. `code` já vem normalizado.
    ///
    /// O INSERT não trava linha existente, então dois pedidos no mesmo armazém
    /// não se serializam aqui; só a primeira referência cria.
    pub async fn ensure(&self, conn: &mut PgConnection, code: &str, name: &str) -> Result<Warehouse, AppError> {
        sqlx::query("INSERT INTO warehouses (code, name) VALUES ($1, $2) ON CONFLICT (code) DO NOTHING")
            .bind(code)
            .bind(name)
            .execute(&mut *conn)
            .await?;

        self.find_by_code(&mut *conn, code)
            .await?
            .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("warehouse '{code}' vanished after insert")))
    }

    /// Cria ou renomeia.
    pub async fn upsert<'e, E>(&self, executor: E, code: &str, name: Option<&str>) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (code, name)
            VALUES ($1, COALESCE($2, $1))
            ON CONFLICT (code) DO UPDATE
                SET name = COALESCE($2, warehouses.name)
            RETURNING id, code, name, created_at
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(warehouse)
    }
}
