// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{Caller, Claims},
};

/// Valida o bearer JWT (HS256) e devolve as claims.
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejeitado");
            AppError::InvalidToken
        })
}

// Gate das rotas de operação: sem token válido = 401, papel diferente de gerente = 403.
pub async fn require_manager(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

    let claims = decode_claims(bearer.token(), &app_state.config.jwt_secret)
        .map_err(|e| e.to_api_error(&locale))?;

    if !claims.is_manager() {
        tracing::warn!(user_id = %claims.sub, role = %claims.role, "Acesso negado às operações");
        return Err(AppError::Forbidden.to_api_error(&locale));
    }

    // Insere o chamador nos "extensions" da requisição
    request.extensions_mut().insert(Caller { user_id: claims.sub });
    Ok(next.run(request).await)
}

// Extrator para obter o gerente autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn token(role: &str, secret: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: role.to_string(),
            exp: (now + exp_offset) as usize,
            iat: now as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_valid_manager_token() {
        let claims = decode_claims(&token("manager", "s3cret", 600), "s3cret").unwrap();
        assert!(claims.is_manager());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        assert!(matches!(
            decode_claims(&token("manager", "other", 600), "s3cret"),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            decode_claims(&token("manager", "s3cret", -3600), "s3cret"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn customer_role_is_not_manager() {
        let claims = decode_claims(&token("customer", "s3cret", 600), "s3cret").unwrap();
        assert!(!claims.is_manager());
    }
}
