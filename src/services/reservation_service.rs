// src/services/reservation_service.rs

use sqlx::PgConnection;

use crate::{
    common::error::AppError,
    models::{
        inventory::{LedgerOp, ReservationPlan, StockRecord},
        operations::{LineReservation, Order, ReservationSummary},
    },
    services::{production_service::ProductionService, stock_ledger_service::StockLedgerService},
};

#[derive(Clone)]
pub struct ReservationService {
    ledger: StockLedgerService,
    production: ProductionService,
}

pub const RELEASE_NOTE: &str = "order closed";

impl ReservationService {
    pub fn new(ledger: StockLedgerService, production: ProductionService) -> Self {
        Self { ledger, production }
    }

    /// Reserva o que houver em estoque para cada linha e manda a falta para produção.
    ///
    /// Roda na transação do coordenador. Linhas vão em ordem crescente de produto,
    /// então dois pedidos disputando os mesmos itens travam na mesma ordem.
    pub async fn reserve_for_order(
        &self,
        conn: &mut PgConnection,
        order: &Order,
        warehouse: &str,
    ) -> Result<ReservationSummary, AppError> {
        let mut summary = ReservationSummary {
            order_id: order.id,
            warehouse: warehouse.to_string(),
            ..Default::default()
        };

        for line in order.actionable_lines() {
            if !self.ledger.product_exists(&mut *conn, line.product_id).await? {
                tracing::warn!(
                    order_id = order.id,
                    product_id = line.product_id,
                    "Linha do pedido aponta para produto inexistente; ignorada"
                );
                summary.skipped_products.push(line.product_id);
                continue;
            }

            let stock = self.ledger.lock(&mut *conn, warehouse, line.product_id).await?;
            let plan = ReservationPlan::new(stock.qty, line.quantity);

            if plan.can_reserve > 0 {
                self.ledger
                    .apply(
                        &mut *conn,
                        warehouse,
                        line.product_id,
                        LedgerOp::Reserve(plan.can_reserve),
                        Some(order.id),
                        None,
                    )
                    .await?;
            }

            let mut production_task_id = None;
            if plan.missing > 0 {
                self.ledger
                    .apply(
                        &mut *conn,
                        warehouse,
                        line.product_id,
                        LedgerOp::Backorder(plan.missing),
                        Some(order.id),
                        None,
                    )
                    .await?;
                let task = self
                    .production
                    .ensure_production_task(&mut *conn, order.id, line.product_id, plan.missing)
                    .await?;
                production_task_id = Some(task.id);
            }

            summary.lines.push(LineReservation {
                product_id: line.product_id,
                requested: plan.requested,
                reserved: plan.can_reserve,
                missing: plan.missing,
                production_task_id,
            });
        }

        tracing::info!(
            order_id = order.id,
            warehouse,
            reserved = summary.total_reserved(),
            missing = summary.total_missing(),
            skipped = summary.skipped_products.len(),
            "Reserva do pedido concluída"
        );
        Ok(summary)
    }

    /// Devolve ao disponível tudo o que o pedido ainda segura (pedido fechado sem expedir).
    ///
    /// O quanto segurar vem do diário do pedido; nunca libera mais do que a chave tem reservado.
    pub async fn release_for_order(&self, conn: &mut PgConnection, order_id: i64) -> Result<Vec<StockRecord>, AppError> {
        let mut released = Vec::new();

        for held in self.ledger.held_by_order(&mut *conn, order_id).await? {
            let stock = self.ledger.lock(&mut *conn, &held.warehouse, held.product_id).await?;
            let qty = held.qty.min(i64::from(stock.reserved_qty));
            if qty <= 0 {
                continue;
            }
            let qty = i32::try_from(qty).map_err(|_| AppError::QuantityOverflow)?;

            let record = self
                .ledger
                .apply(
                    &mut *conn,
                    &held.warehouse,
                    held.product_id,
                    LedgerOp::Unreserve(qty),
                    Some(order_id),
                    Some(RELEASE_NOTE),
                )
                .await?;
            released.push(record);
        }

        tracing::info!(order_id, keys = released.len(), "Reservas do pedido liberadas");
        Ok(released)
    }
}
