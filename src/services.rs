pub mod operation_service;
pub mod production_service;
pub mod reservation_service;
pub mod shipment_service;
pub mod stock_ledger_service;
pub mod warehouse_service;
