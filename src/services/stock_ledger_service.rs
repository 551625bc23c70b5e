// src/services/stock_ledger_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};

use crate::{
    common::error::AppError,
    db::{MovementRepository, StockRepository},
    models::inventory::{
        normalize_warehouse_code, HeldReservation, LedgerOp, MovementFilter, NewMovement, Reconciliation,
        StockBalance, StockMovement, StockRecord, WarehouseStocks,
    },
    services::warehouse_service::WarehouseService,
};

/// Saldo por (armazém, produto) + diário de movimentações.
///
/// Toda mutação segue o mesmo caminho: trava a linha, aplica o `LedgerOp`,
/// grava o saldo e anexa o movimento, tudo na transação de quem chama.
#[derive(Clone)]
pub struct StockLedgerService {
    stock_repo: StockRepository,
    movement_repo: MovementRepository,
    warehouse_service: WarehouseService,
}

impl StockLedgerService {
    pub fn new(stock_repo: StockRepository, movement_repo: MovementRepository, warehouse_service: WarehouseService) -> Self {
        Self {
            stock_repo,
            movement_repo,
            warehouse_service,
        }
    }

    pub fn warehouses(&self) -> &WarehouseService {
        &self.warehouse_service
    }

    // ---
    // Primitivas (dentro de uma transação aberta)
    // ---

    pub async fn product_exists(&self, conn: &mut PgConnection, product_id: i64) -> Result<bool, AppError> {
        self.stock_repo.product_exists(conn, product_id).await
    }

    /// Trava (criando se faltar) o saldo da chave.
    pub async fn lock(&self, conn: &mut PgConnection, warehouse: &str, product_id: i64) -> Result<StockRecord, AppError> {
        self.stock_repo.lock_or_create(conn, warehouse, product_id).await
    }

    /// Reservas em aberto do pedido, por chave, em ordem de lock.
    pub async fn held_by_order(&self, conn: &mut PgConnection, order_id: i64) -> Result<Vec<HeldReservation>, AppError> {
        self.movement_repo.held_by_order(conn, order_id).await
    }

    pub async fn apply(
        &self,
        conn: &mut PgConnection,
        warehouse: &str,
        product_id: i64,
        op: LedgerOp,
        order_id: Option<i64>,
        note: Option<&str>,
    ) -> Result<StockRecord, AppError> {
        let mut record = if op.creates_record() {
            if !self.stock_repo.product_exists(&mut *conn, product_id).await? {
                return Err(AppError::ProductNotFound);
            }
            self.stock_repo.lock_or_create(conn, warehouse, product_id).await?
        } else {
            self.stock_repo
                .find_for_update(&mut *conn, warehouse, product_id)
                .await?
                .ok_or(AppError::NotReserved)?
        };

        let draft = op.apply(&mut record)?;
        let saved = self.stock_repo.save(&mut *conn, &record).await?;

        if let Some(draft) = draft {
            self.movement_repo
                .append(
                    &mut *conn,
                    &NewMovement {
                        warehouse,
                        product_id,
                        draft,
                        order_id,
                        note,
                    },
                )
                .await?;
        }

        Ok(saved)
    }

    // ---
    // Operações manuais (uma transação cada)
    // ---

    async fn run_manual<'e, E>(
        &self,
        executor: E,
        warehouse: Option<&str>,
        product_id: i64,
        op: LedgerOp,
        order_id: Option<i64>,
        note: Option<&str>,
    ) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let wh = self.warehouse_service.ensure_warehouse(&mut *tx, warehouse).await?;
        let record = self.apply(&mut *tx, &wh.code, product_id, op, order_id, note).await?;

        tx.commit().await?;

        tracing::info!(
            warehouse = %record.warehouse,
            product_id,
            op = ?op,
            qty = record.qty,
            reserved = record.reserved_qty,
            "Saldo atualizado"
        );
        Ok(record)
    }

    pub async fn receive_stock<'e, E>(
        &self,
        executor: E,
        warehouse: Option<&str>,
        product_id: i64,
        qty: i32,
        note: Option<&str>,
    ) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.run_manual(executor, warehouse, product_id, LedgerOp::Receive(qty), None, note)
            .await
    }

    pub async fn issue_stock<'e, E>(
        &self,
        executor: E,
        warehouse: Option<&str>,
        product_id: i64,
        qty: i32,
        note: Option<&str>,
    ) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.run_manual(executor, warehouse, product_id, LedgerOp::Issue(qty), None, note)
            .await
    }

    pub async fn adjust_stock<'e, E>(
        &self,
        executor: E,
        warehouse: Option<&str>,
        product_id: i64,
        qty: i32,
        note: Option<&str>,
    ) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.run_manual(executor, warehouse, product_id, LedgerOp::Adjust(qty), None, note)
            .await
    }

    /// Libera reserva manualmente (ex.: pedido cancelado fora do fluxo).
    pub async fn unreserve_stock<'e, E>(
        &self,
        executor: E,
        warehouse: Option<&str>,
        product_id: i64,
        qty: i32,
        order_id: Option<i64>,
        note: Option<&str>,
    ) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.run_manual(executor, warehouse, product_id, LedgerOp::Unreserve(qty), order_id, note)
            .await
    }

    // ---
    // Leitura
    // ---

    /// Consultar um armazém ainda inexistente já o cadastra.
    pub async fn list_stocks<'e, E>(&self, executor: E, warehouse: Option<&str>) -> Result<WarehouseStocks, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let wh = self.warehouse_service.ensure_warehouse(&mut *tx, warehouse).await?;
        let stocks = self.stock_repo.list_by_warehouse(&mut *tx, &wh.code).await?;

        tx.commit().await?;
        Ok(WarehouseStocks { warehouse: wh.code, stocks })
    }

    pub async fn list_movements<'e, E>(&self, executor: E, filter: &MovementFilter) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.movement_repo.list(executor, filter).await
    }

    /// Refaz o saldo a partir do diário e compara com o gravado.
    pub async fn reconcile<'e, E>(&self, executor: E, warehouse: Option<&str>, product_id: i64) -> Result<Reconciliation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let warehouse = normalize_warehouse_code(warehouse);
        let mut tx = executor.begin().await?;

        // Trava a linha para ler saldo e diário no mesmo ponto.
        let recorded = self
            .stock_repo
            .find_for_update(&mut *tx, &warehouse, product_id)
            .await?
            .map(|r| r.balance())
            .unwrap_or(StockBalance::default());
        let journal = self.movement_repo.journal_for(&mut *tx, &warehouse, product_id).await?;

        tx.commit().await?;

        let report = Reconciliation::new(warehouse, product_id, recorded, &journal);
        if !report.consistent {
            tracing::warn!(
                warehouse = %report.warehouse,
                product_id,
                recorded = ?report.recorded,
                replayed = ?report.replayed,
                "Saldo diverge do diário"
            );
        }
        Ok(report)
    }
}
