pub mod warehouse_repo;
pub use warehouse_repo::WarehouseRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod movement_repo;
pub use movement_repo::MovementRepository;
pub mod production_repo;
pub use production_repo::ProductionRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
