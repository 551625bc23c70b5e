// src/services/production_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};

use crate::{
    common::error::AppError,
    db::{OrderRepository, ProductionRepository},
    models::{
        inventory::LedgerOp,
        operations::OrderStatus,
        production::{parse_status_filter, MovePlan, MoveToStockResult, ProductionStatus, ProductionTask},
    },
    services::stock_ledger_service::StockLedgerService,
};

pub const PRODUCTION_NOTE: &str = "production -> stock";

#[derive(Clone)]
pub struct ProductionService {
    production_repo: ProductionRepository,
    order_repo: OrderRepository,
    ledger: StockLedgerService,
}

impl ProductionService {
    pub fn new(production_repo: ProductionRepository, order_repo: OrderRepository, ledger: StockLedgerService) -> Self {
        Self {
            production_repo,
            order_repo,
            ledger,
        }
    }

    /// Soma a falta na tarefa aberta do pedido+produto, ou abre uma nova (`planned`).
    pub async fn ensure_production_task(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
        product_id: i64,
        qty: i32,
    ) -> Result<ProductionTask, AppError> {
        if qty <= 0 {
            return Err(AppError::NonPositiveQuantity);
        }

        let open = self
            .production_repo
            .find_open_for_update(&mut *conn, order_id, product_id)
            .await?;

        let task = match open {
            Some(task) => self.production_repo.add_qty(&mut *conn, task.id, qty).await?,
            None => self.production_repo.create(&mut *conn, order_id, product_id, qty).await?,
        };

        tracing::info!(task_id = task.id, order_id, product_id, qty = task.qty, "Tarefa de produção atualizada");
        Ok(task)
    }

    /// Sem restrição de ordem entre os estados.
    pub async fn set_status<'e, E>(&self, executor: E, task_id: i64, status: &str) -> Result<ProductionTask, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let status: ProductionStatus = status.parse()?;

        let task = self
            .production_repo
            .set_status(executor, task_id, status)
            .await?
            .ok_or(AppError::TaskNotFound)?;

        tracing::info!(task_id, status = %status, "Status da produção alterado");
        Ok(task)
    }

    /// Leva a produção pronta para o estoque. Repetir é inofensivo.
    ///
    /// Se o pedido de origem ainda está aberto (`confirmed` / `in_work`), a quantidade
    /// entra já reservada para ele, completando o que faltou na confirmação.
    pub async fn move_to_stock<'e, E>(
        &self,
        executor: E,
        task_id: i64,
        warehouse: Option<&str>,
    ) -> Result<MoveToStockResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Pedido antes da tarefa: mesma ordem de locks do coordenador.
        let order_id = self
            .production_repo
            .find(&mut *tx, task_id)
            .await?
            .ok_or(AppError::TaskNotFound)?
            .order_id;
        let order = self.order_repo.find_for_update(&mut *tx, order_id).await?;

        let task = self
            .production_repo
            .find_for_update(&mut *tx, task_id)
            .await?
            .ok_or(AppError::TaskNotFound)?;

        let qty = match task.plan_move()? {
            MovePlan::AlreadyMoved => {
                tx.commit().await?;
                return Ok(MoveToStockResult { task, stock: None });
            }
            MovePlan::Move { qty } => qty,
        };

        let wh = self.ledger.warehouses().ensure_warehouse(&mut *tx, warehouse).await?;
        let stock = self
            .ledger
            .apply(
                &mut *tx,
                &wh.code,
                task.product_id,
                LedgerOp::AcceptProduction(qty),
                Some(task.order_id),
                Some(PRODUCTION_NOTE),
            )
            .await?;

        let open_order = order.filter(|o| matches!(o.status, OrderStatus::Confirmed | OrderStatus::InWork));
        let stock = match open_order {
            Some(order) => {
                self.ledger
                    .apply(
                        &mut *tx,
                        &wh.code,
                        task.product_id,
                        LedgerOp::Reserve(qty),
                        Some(order.id),
                        Some(PRODUCTION_NOTE),
                    )
                    .await?
            }
            None => stock,
        };

        let task = self.production_repo.mark_moved(&mut *tx, task.id).await?;

        tx.commit().await?;

        tracing::info!(
            task_id,
            order_id = task.order_id,
            product_id = task.product_id,
            qty,
            warehouse = %wh.code,
            "Produção movida para o estoque"
        );
        Ok(MoveToStockResult { task, stock: Some(stock) })
    }

    pub async fn list_production<'e, E>(&self, executor: E, status: Option<&str>) -> Result<Vec<ProductionTask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.production_repo.list(executor, parse_status_filter(status)).await
    }
}
