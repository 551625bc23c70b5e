// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Orders ---
        handlers::operations::list_orders,
        handlers::operations::set_order_status,
        handlers::operations::list_comments,
        handlers::operations::add_comment,

        // --- Warehouses ---
        handlers::inventory::list_warehouses,
        handlers::inventory::upsert_warehouse,

        // --- Stocks ---
        handlers::inventory::list_stocks,
        handlers::inventory::receive_stock,
        handlers::inventory::issue_stock,
        handlers::inventory::adjust_stock,
        handlers::inventory::unreserve_stock,
        handlers::inventory::list_movements,
        handlers::inventory::reconcile_stock,

        // --- Production ---
        handlers::production::list_production,
        handlers::production::set_production_status,
        handlers::production::move_to_stock,
    ),
    components(
        schemas(
            // --- Operations ---
            models::operations::OrderStatus,
            models::operations::OrderLine,
            models::operations::Order,
            models::operations::ShipmentStatus,
            models::operations::Shipment,
            models::operations::OrderComment,
            models::operations::LineReservation,
            models::operations::ReservationSummary,

            // --- Inventory ---
            models::inventory::Warehouse,
            models::inventory::StockRecord,
            models::inventory::MovementType,
            models::inventory::StockMovement,
            models::inventory::StockBalance,
            models::inventory::Reconciliation,
            models::inventory::WarehouseStocks,

            // --- Production ---
            models::production::ProductionStatus,
            models::production::ProductionTask,
            models::production::MoveToStockResult,

            // --- Payloads ---
            handlers::operations::SetOrderStatusPayload,
            handlers::operations::AddCommentPayload,
            handlers::inventory::UpsertWarehousePayload,
            handlers::inventory::StockChangePayload,
            handlers::inventory::UnreservePayload,
            handlers::production::SetProductionStatusPayload,
            handlers::production::MoveToStockPayload,
        )
    ),
    tags(
        (name = "Orders", description = "Pedidos: status, reserva, expedição e comentários"),
        (name = "Warehouses", description = "Cadastro de armazéns"),
        (name = "Stocks", description = "Saldos, movimentações e reconciliação"),
        (name = "Production", description = "Backlog de produção (faltas de estoque)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_ops_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/ops/orders",
            "/api/ops/orders/{id}/status",
            "/api/ops/stocks/reconcile",
            "/api/ops/production/{id}/move-to-stock",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {expected}");
        }
    }
}
