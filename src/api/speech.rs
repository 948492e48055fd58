use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::validation::validated;
use crate::core::state::AppState;
use crate::schemas::speech::SpeechRequest;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", post(synthesize))
}

async fn synthesize(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = validated(payload)?;

    let speech = state
        .speech()
        .ok_or_else(|| ApiError::ServiceUnavailable("Speech synthesis is not configured".to_string()))?;
    let audio = speech.synthesize(&payload.text).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}
