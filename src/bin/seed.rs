// src/bin/seed.rs

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use ops_backend::{
    db::{MovementRepository, StockRepository, WarehouseRepository},
    models::inventory::DEFAULT_WAREHOUSE,
    services::{stock_ledger_service::StockLedgerService, warehouse_service::WarehouseService},
};

/// Passo de seed explícito: o servidor nunca cria dados sozinho na subida.
#[derive(Parser, Debug)]
#[command(about = "Seed warehouses and demo stock for the ops backend", long_about = None)]
struct Options {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Warehouse codes to ensure (repeatable)
    #[arg(long = "warehouse", value_name = "CODE", default_value = DEFAULT_WAREHOUSE)]
    warehouses: Vec<String>,

    /// Number of demo products to create (0 = none)
    #[arg(long, default_value_t = 0)]
    demo_products: u32,

    /// Initial quantity received for each demo product, in the first warehouse
    #[arg(long, default_value_t = 10)]
    initial_qty: i32,

    /// Also create one `new` order covering every demo product
    #[arg(long)]
    with_order: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .with_target(false)
        .compact()
        .init();

    let opts = Options::parse();

    let pool = PgPool::connect(&opts.database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;
    sqlx::migrate!().run(&pool).await.context("Falha ao rodar as migrações")?;

    let warehouse_service = WarehouseService::new(WarehouseRepository::new());
    let ledger = StockLedgerService::new(StockRepository::new(), MovementRepository::new(), warehouse_service.clone());

    let mut first_code = None;
    for code in &opts.warehouses {
        let mut conn = pool.acquire().await?;
        let wh = warehouse_service.ensure_warehouse(&mut *conn, Some(code.as_str())).await?;
        println!("warehouse {} ready (id {})", wh.code, wh.id);
        first_code.get_or_insert(wh.code);
    }
    let target = first_code.unwrap_or_else(|| DEFAULT_WAREHOUSE.to_string());

    let product_ids = seed_products(&pool, opts.demo_products).await?;
    for product_id in &product_ids {
        // Pelo ledger, para o diário reconciliar com o saldo.
        if opts.initial_qty > 0 {
            let record = ledger
                .receive_stock(&pool, Some(target.as_str()), *product_id, opts.initial_qty, Some("seed"))
                .await?;
            println!("product {product_id}: qty {} in {}", record.qty, record.warehouse);
        }
    }

    if opts.with_order && !product_ids.is_empty() {
        let order_id = seed_order(&pool, &product_ids).await?;
        println!("order {order_id} created with {} lines", product_ids.len());
    }

    Ok(())
}

async fn seed_products(pool: &PgPool, count: u32) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(count as usize);
    for n in 1..=count {
        let id: i64 = sqlx::query_scalar("INSERT INTO products (name) VALUES ($1) RETURNING id")
            .bind(format!("Demo product {n}"))
            .fetch_one(pool)
            .await?;
        ids.push(id);
    }
    Ok(ids)
}

async fn seed_order(pool: &PgPool, product_ids: &[i64]) -> Result<i64> {
    let items: Vec<serde_json::Value> = product_ids
        .iter()
        .map(|id| serde_json::json!({ "productId": id, "quantity": 2 }))
        .collect();

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (customer_name, email, items) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("Demo customer")
    .bind("demo@example.com")
    .bind(sqlx::types::Json(items))
    .fetch_one(pool)
    .await?;
    Ok(id)
}
