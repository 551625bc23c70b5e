// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{MovementRepository, OrderRepository, ProductionRepository, StockRepository, WarehouseRepository},
    services::{
        operation_service::OperationService, production_service::ProductionService,
        reservation_service::ReservationService, shipment_service::ShipmentService,
        stock_ledger_service::StockLedgerService, warehouse_service::WarehouseService,
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// `lock_timeout` aplicado em cada conexão (ms)
    pub lock_timeout_ms: u64,
}

impl Config {
    /// Lê do ambiente (o `.env` é carregado antes, se existir).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000".parse::<SocketAddr>()?)?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(env_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            lock_timeout_ms: env_or("LOCK_TIMEOUT_MS", 5000)?,
        })
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(self.db_acquire_timeout)
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("valor inválido para {key}: '{raw}'")),
        _ => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub warehouse_service: WarehouseService,
    pub ledger_service: StockLedgerService,
    pub production_service: ProductionService,
    pub operation_service: OperationService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = config
            .pool_options()
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    /// Monta o grafo de dependências sobre uma pool já criada.
    pub fn with_pool(db_pool: PgPool, config: Config) -> Self {
        let warehouse_service = WarehouseService::new(WarehouseRepository::new());
        let ledger_service = StockLedgerService::new(
            StockRepository::new(),
            MovementRepository::new(),
            warehouse_service.clone(),
        );
        let order_repo = OrderRepository::new();
        let production_service = ProductionService::new(
            ProductionRepository::new(),
            order_repo.clone(),
            ledger_service.clone(),
        );
        let operation_service = OperationService::new(
            order_repo.clone(),
            warehouse_service.clone(),
            ReservationService::new(ledger_service.clone(), production_service.clone()),
            ShipmentService::new(order_repo, ledger_service.clone()),
        );

        Self {
            db_pool,
            config,
            warehouse_service,
            ledger_service,
            production_service,
            operation_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default() {
        assert_eq!(env_or::<u32>("OPS_TEST_SURELY_UNSET_KEY", 7).unwrap(), 7);
    }
}
