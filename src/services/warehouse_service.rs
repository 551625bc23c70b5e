// src/services/warehouse_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};

use crate::{
    common::error::AppError,
    db::WarehouseRepository,
    models::inventory::{normalize_warehouse_code, Warehouse, DEFAULT_WAREHOUSE},
};

#[derive(Clone)]
pub struct WarehouseService {
    warehouse_repo: WarehouseRepository,
}

impl WarehouseService {
    pub fn new(warehouse_repo: WarehouseRepository) -> Self {
        Self { warehouse_repo }
    }

    /// Get-or-create dentro da transação de quem chama. Código vazio vira "MSK".
    pub async fn ensure_warehouse(&self, conn: &mut PgConnection, code: Option<&str>) -> Result<Warehouse, AppError> {
        let code = normalize_warehouse_code(code);
        self.warehouse_repo.ensure(conn, &code, &code).await
    }

    /// Lista todos; se não houver nenhum, cria o padrão antes.
    pub async fn list_warehouses<'e, E>(&self, executor: E) -> Result<Vec<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut warehouses = self.warehouse_repo.list(&mut *tx).await?;
        if warehouses.is_empty() {
            let default = self.warehouse_repo.ensure(&mut *tx, DEFAULT_WAREHOUSE, DEFAULT_WAREHOUSE).await?;
            tracing::info!(code = %default.code, "Armazém padrão criado");
            warehouses.push(default);
        }

        tx.commit().await?;
        Ok(warehouses)
    }

    pub async fn upsert_warehouse<'e, E>(&self, executor: E, code: &str, name: Option<&str>) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::WarehouseCodeRequired);
        }
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let warehouse = self
            .warehouse_repo
            .upsert(executor, &code.to_uppercase(), name)
            .await?;

        tracing::info!(code = %warehouse.code, name = %warehouse.name, "Armazém salvo");
        Ok(warehouse)
    }
}
