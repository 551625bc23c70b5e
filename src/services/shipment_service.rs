// src/services/shipment_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::{
    common::error::AppError,
    db::OrderRepository,
    models::{
        inventory::{LedgerOp, StockRecord},
        operations::{Order, Shipment},
    },
    services::stock_ledger_service::StockLedgerService,
};

#[derive(Clone)]
pub struct ShipmentService {
    order_repo: OrderRepository,
    ledger: StockLedgerService,
}

impl ShipmentService {
    pub fn new(order_repo: OrderRepository, ledger: StockLedgerService) -> Self {
        Self { order_repo, ledger }
    }

    /// Consome a reserva de todas as linhas. Qualquer linha sem reserva suficiente
    /// aborta; como roda na transação do coordenador, nenhuma linha fica baixada.
    pub async fn ship_order(
        &self,
        conn: &mut PgConnection,
        order: &Order,
        warehouse: &str,
    ) -> Result<Vec<StockRecord>, AppError> {
        let mut shipped = Vec::new();

        for line in order.actionable_lines() {
            let record = self
                .ledger
                .apply(
                    &mut *conn,
                    warehouse,
                    line.product_id,
                    LedgerOp::Ship(line.quantity),
                    Some(order.id),
                    None,
                )
                .await
                .inspect_err(|e| {
                    tracing::warn!(order_id = order.id, product_id = line.product_id, error = %e, "Expedição recusada");
                })?;
            shipped.push(record);
        }

        Ok(shipped)
    }

    pub async fn record_shipment(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
        shipped_at: DateTime<Utc>,
    ) -> Result<Shipment, AppError> {
        let shipment = self.order_repo.record_shipment(conn, order_id, shipped_at).await?;
        tracing::info!(order_id, shipment_id = shipment.id, "Expedição registrada");
        Ok(shipment)
    }
}
