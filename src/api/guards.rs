use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;

/// Course-provider credential taken verbatim from the `Authorization` header and forwarded
/// as-is on provider calls.
pub(crate) struct ProviderToken(pub(crate) String);

#[async_trait]
impl<S> FromRequestParts<S> for ProviderToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized("Missing course provider token"))?;

        Ok(ProviderToken(token.to_string()))
    }
}
