pub mod inventory;
pub mod operations;
pub mod production;
