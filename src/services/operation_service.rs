// src/services/operation_service.rs

use chrono::Utc;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderRepository,
    models::operations::{plan_transition, Order, OrderComment, OrderFilter, OrderStatus, TransitionPlan},
    services::{
        reservation_service::ReservationService, shipment_service::ShipmentService,
        warehouse_service::WarehouseService,
    },
};

#[derive(Clone)]
pub struct OperationService {
    order_repo: OrderRepository,
    warehouse_service: WarehouseService,
    reservation_service: ReservationService,
    shipment_service: ShipmentService,
}

impl OperationService {
    pub fn new(
        order_repo: OrderRepository,
        warehouse_service: WarehouseService,
        reservation_service: ReservationService,
        shipment_service: ShipmentService,
    ) -> Self {
        Self {
            order_repo,
            warehouse_service,
            reservation_service,
            shipment_service,
        }
    }

    // =========================================================================
    //  MÁQUINA DE ESTADOS
    // =========================================================================

    /// Muda o status do pedido e dispara reserva / expedição conforme o destino.
    ///
    /// Tudo numa transação só, com a linha do pedido travada: se qualquer passo
    /// falhar o pedido continua no status anterior e nenhum saldo muda.
    pub async fn set_order_status<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        target: OrderStatus,
        warehouse: Option<&str>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .order_repo
            .find_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        let from = match plan_transition(order.status, target)? {
            TransitionPlan::Unchanged => {
                tracing::debug!(order_id, status = %target, "Status já aplicado; nada a fazer");
                tx.commit().await?;
                return Ok(order);
            }
            TransitionPlan::Apply { from, .. } => from,
        };

        let mut shipped_at = order.shipped_at;
        let mut closed_at = order.closed_at;

        match target {
            OrderStatus::Confirmed => {
                let wh = self.warehouse_service.ensure_warehouse(&mut *tx, warehouse).await?;
                self.reservation_service
                    .reserve_for_order(&mut *tx, &order, &wh.code)
                    .await?;
            }
            OrderStatus::Shipped => {
                let wh = self.warehouse_service.ensure_warehouse(&mut *tx, warehouse).await?;
                self.shipment_service.ship_order(&mut *tx, &order, &wh.code).await?;
                let now = Utc::now();
                shipped_at = Some(now);
                self.shipment_service.record_shipment(&mut *tx, order.id, now).await?;
            }
            OrderStatus::Closed => {
                if matches!(from, OrderStatus::Confirmed | OrderStatus::InWork) {
                    self.reservation_service.release_for_order(&mut *tx, order.id).await?;
                }
                closed_at = Some(Utc::now());
            }
            OrderStatus::New | OrderStatus::InWork => {}
        }

        let updated = self
            .order_repo
            .update_status(&mut *tx, order_id, target, shipped_at, closed_at)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id, from = %from, to = %target, "Status do pedido alterado");
        Ok(updated)
    }

    // =========================================================================
    //  MESA DE PEDIDOS
    // =========================================================================

    pub async fn list_orders<'e, E>(&self, executor: E, filter: &OrderFilter) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.order_repo.list(executor, filter).await
    }

    pub async fn list_comments(&self, conn: &mut PgConnection, order_id: i64) -> Result<Vec<OrderComment>, AppError> {
        if !self.order_repo.exists(&mut *conn, order_id).await? {
            return Err(AppError::OrderNotFound);
        }
        self.order_repo.list_comments(conn, order_id).await
    }

    pub async fn add_comment<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        author: Uuid,
        text: &str,
    ) -> Result<OrderComment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::EmptyComment);
        }

        let mut tx = executor.begin().await?;

        if !self.order_repo.exists(&mut *tx, order_id).await? {
            return Err(AppError::OrderNotFound);
        }
        let comment = self.order_repo.add_comment(&mut *tx, order_id, author, text).await?;

        tx.commit().await?;

        tracing::info!(order_id, comment_id = comment.id, author = %author, "Comentário adicionado");
        Ok(comment)
    }
}
