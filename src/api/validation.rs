use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::api::errors::ApiError;

/// Unwraps a JSON body and runs its `validator` rules; both failures are 400s.
pub(crate) fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(payload)
}

/// Like [`validated`] for endpoints whose body may be omitted: an empty body yields
/// `T::default()`, anything else must be valid JSON.
pub(crate) fn validated_or_default<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: Validate + Default + DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let payload: T = serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("Failed to parse the request body as JSON: {err}")))?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(payload)
}
