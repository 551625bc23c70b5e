// src/common/db_utils.rs

use crate::common::error::AppError;
use crate::config::AppState;

/// Adquire uma conexão da pool já com `lock_timeout` aplicado.
///
/// Nenhuma operação fica presa esperando um lock: estourou o tempo, o Postgres
/// devolve 55P03 e isso vira `AppError::Conflict` (409).
pub(crate) async fn get_connection(
    app_state: &AppState,
) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    // Nível de sessão: vale para todas as transações abertas nesta conexão.
    sqlx::query("SELECT set_config('lock_timeout', $1, false)")
        .bind(format!("{}ms", app_state.config.lock_timeout_ms))
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}
