// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::{self, Locale};
use crate::models::operations::OrderStatus;

// SQLSTATEs que significam "outra transação chegou primeiro".
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    // --- NotFound ---
    #[error("Order not found")]
    OrderNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Task not found")]
    TaskNotFound,

    // --- BadRequest ---
    #[error("Invalid status")]
    InvalidStatus,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Not reserved")]
    NotReserved,

    #[error("Not enough reserved stock to ship")]
    NotEnoughReservedToShip,

    #[error("Not enough stock to reserve")]
    NotEnoughStock,

    #[error("Not enough reserved stock")]
    NotEnoughReserved,

    #[error("Task must be ready")]
    TaskNotReady,

    #[error("Warehouse code required")]
    WarehouseCodeRequired,

    #[error("Quantity must be positive")]
    NonPositiveQuantity,

    #[error("Quantity exceeds the supported range")]
    QuantityOverflow,

    #[error("Empty comment")]
    EmptyComment,

    // --- Gate de autorização ---
    #[error("Invalid or missing token")]
    InvalidToken,

    #[error("Manager role required")]
    Forbidden,

    // Lock timeout, deadlock ou falha de serialização. Não há retry automático.
    #[error("Concurrent update: {0}")]
    Conflict(String),

    #[error("Database error")]
    DatabaseError(sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            let contended = db_err.code().is_some_and(|code| {
                matches!(
                    code.as_ref(),
                    SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE
                )
            });
            if contended {
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        AppError::DatabaseError(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::OrderNotFound | AppError::ProductNotFound | AppError::TaskNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::ValidationError(_)
            | AppError::MalformedRequest(_)
            | AppError::InvalidStatus
            | AppError::InvalidTransition { .. }
            | AppError::NotReserved
            | AppError::NotEnoughReservedToShip
            | AppError::NotEnoughStock
            | AppError::NotEnoughReserved
            | AppError::TaskNotReady
            | AppError::WarehouseCodeRequired
            | AppError::NonPositiveQuantity
            | AppError::QuantityOverflow
            | AppError::EmptyComment => StatusCode::BAD_REQUEST,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Código estável usado pelo frontend e pelo catálogo de traduções.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AppError::OrderNotFound => "ORDER_NOT_FOUND",
            AppError::ProductNotFound => "PRODUCT_NOT_FOUND",
            AppError::TaskNotFound => "TASK_NOT_FOUND",
            AppError::InvalidStatus => "INVALID_STATUS",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::NotReserved => "NOT_RESERVED",
            AppError::NotEnoughReservedToShip => "NOT_ENOUGH_RESERVED_TO_SHIP",
            AppError::NotEnoughStock => "NOT_ENOUGH_STOCK",
            AppError::NotEnoughReserved => "NOT_ENOUGH_RESERVED",
            AppError::TaskNotReady => "TASK_NOT_READY",
            AppError::WarehouseCodeRequired => "WAREHOUSE_CODE_REQUIRED",
            AppError::NonPositiveQuantity => "NON_POSITIVE_QUANTITY",
            AppError::QuantityOverflow => "QUANTITY_OVERFLOW",
            AppError::EmptyComment => "EMPTY_COMMENT",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe vai para o log, nunca para o cliente.
            tracing::error!(error = ?self, "Erro interno do servidor");
        }

        let message = match self {
            // Mensagens com dados dinâmicos não passam pelo catálogo.
            AppError::InvalidTransition { .. } | AppError::MalformedRequest(_) => self.to_string(),
            _ => i18n::translate(self.code(), locale)
                .map(str::to_string)
                .unwrap_or_else(|| self.to_string()),
        };

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .map(Value::String)
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError {
            status,
            code: self.code(),
            error: message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

/// Resposta de erro já resolvida (status + corpo traduzido).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "code": self.code, "details": details }),
            None => json!({ "error": self.error, "code": self.code }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_taxonomy() {
        assert_eq!(AppError::OrderNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::TaskNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotEnoughReservedToShip.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::TaskNotReady.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn messages_follow_accept_language() {
        let en = AppError::TaskNotReady.to_api_error(&Locale("en".into()));
        assert_eq!(en.error, "Task must be ready");

        let pt = AppError::TaskNotReady.to_api_error(&Locale("pt".into()));
        assert_eq!(pt.error, "A tarefa precisa estar pronta");

        // Idioma sem catálogo cai no inglês.
        let de = AppError::NotReserved.to_api_error(&Locale("de".into()));
        assert_eq!(de.error, "Not reserved");
    }

    #[test]
    fn transition_error_names_both_states() {
        let err = AppError::InvalidTransition {
            from: OrderStatus::New,
            to: OrderStatus::Shipped,
        };
        assert_eq!(err.to_string(), "Invalid status transition: new -> shipped");
    }
}
