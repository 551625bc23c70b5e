// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const DEFAULT_LANG: &str = "en";

// Extrator de idioma (Accept-Language)
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "pt-BR" -> "pt"
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Ok(Locale(lang))
    }
}

/// Catálogo de mensagens por código de erro. `None` = usa a mensagem padrão (inglês).
pub fn translate(code: &str, locale: &Locale) -> Option<&'static str> {
    match locale.0.as_str() {
        "pt" => translate_pt(code),
        _ => None,
    }
}

fn translate_pt(code: &str) -> Option<&'static str> {
    let message = match code {
        "VALIDATION_ERROR" => "Um ou mais campos são inválidos.",
        "ORDER_NOT_FOUND" => "Pedido não encontrado",
        "PRODUCT_NOT_FOUND" => "Produto não encontrado",
        "TASK_NOT_FOUND" => "Tarefa de produção não encontrada",
        "INVALID_STATUS" => "Status inválido",
        "NOT_RESERVED" => "Estoque não reservado",
        "NOT_ENOUGH_RESERVED_TO_SHIP" => "Estoque reservado insuficiente para expedir",
        "NOT_ENOUGH_STOCK" => "Estoque insuficiente para reservar",
        "NOT_ENOUGH_RESERVED" => "Estoque reservado insuficiente",
        "TASK_NOT_READY" => "A tarefa precisa estar pronta",
        "WAREHOUSE_CODE_REQUIRED" => "O código do armazém é obrigatório",
        "NON_POSITIVE_QUANTITY" => "A quantidade deve ser positiva",
        "QUANTITY_OVERFLOW" => "Quantidade fora do intervalo suportado",
        "EMPTY_COMMENT" => "Comentário vazio",
        "INVALID_TOKEN" => "Token de autenticação inválido ou ausente.",
        "FORBIDDEN" => "Você precisa do papel de gerente para realizar esta ação.",
        "CONFLICT" => "Outra operação está alterando este registro. Tente novamente.",
        "DATABASE_ERROR" | "INTERNAL_ERROR" => "Ocorreu um erro inesperado.",
        _ => return None,
    };
    Some(message)
}
