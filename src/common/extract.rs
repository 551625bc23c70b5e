// src/common/extract.rs

use axum::{
    extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request},
    http::header,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::common::error::{ApiError, AppError};
use crate::middleware::i18n::Locale;

/// `Json<T>` + `validate()`. Corpo malformado ou inválido vira 400 no formato padrão
/// de erro, antes de qualquer acesso ao banco.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let locale = match Locale::from_request_parts(&mut parts, state).await {
            Ok(locale) => locale,
            Err(never) => match never {},
        };
        let req = Request::from_parts(parts, body);

        let Json(payload) = <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedRequest(rejection.body_text()).to_api_error(&locale))?;

        payload
            .validate()
            .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

        Ok(ValidatedJson(payload))
    }
}

/// `Option<ValidatedJson<T>>`: sem `Content-Type` não há corpo, e o extrator devolve `None`.
/// Com corpo, vale tudo o que vale para `ValidatedJson`.
impl<S, T> OptionalFromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        if !req.headers().contains_key(header::CONTENT_TYPE) {
            return Ok(None);
        }
        <Self as FromRequest<S>>::from_request(req, state).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Target {
        #[validate(length(max = 3))]
        code: Option<String>,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn missing_body_is_none() {
        let extracted = Option::<ValidatedJson<Target>>::from_request(request(None, ""), &()).await;
        assert!(matches!(extracted, Ok(None)));
    }

    #[tokio::test]
    async fn present_body_is_still_validated() {
        let ok = Option::<ValidatedJson<Target>>::from_request(request(Some("application/json"), r#"{"code":"SPB"}"#), &())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ok.0.code.as_deref(), Some("SPB"));

        let too_long =
            Option::<ValidatedJson<Target>>::from_request(request(Some("application/json"), r#"{"code":"SPBX"}"#), &()).await;
        assert_eq!(too_long.unwrap_err().code, "VALIDATION_ERROR");
    }
}
