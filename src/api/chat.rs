use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::validation::validated;
use crate::core::state::AppState;
use crate::schemas::chat::{ExchangeResponse, InteractionResponse, MessageCreate, MessageResponse};
use crate::services::tutoring;

const RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:interaction_id", get(get_interaction))
        .route("/:interaction_id/messages", get(list_messages).post(post_message))
}

async fn get_interaction(
    State(state): State<AppState>,
    Path(interaction_id): Path<String>,
) -> Result<Json<InteractionResponse>, ApiError> {
    let view = tutoring::get_interaction(&state, &interaction_id).await?;
    Ok(Json(view.into()))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(interaction_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let messages = tutoring::list_messages(&state, &interaction_id).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

async fn post_message(
    State(state): State<AppState>,
    Path(interaction_id): Path<String>,
    payload: Result<Json<MessageCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ExchangeResponse>), ApiError> {
    let payload = validated(payload)?;

    let allowed = state
        .redis()
        .rate_limit(
            &format!("chat:{interaction_id}"),
            state.settings().tutoring().rate_limit_per_minute,
            RATE_LIMIT_WINDOW_SECONDS,
        )
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Chat rate limit check failed; allowing request");
            true
        });
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many messages, slow down"));
    }

    let exchange =
        tutoring::continue_conversation(&state, &interaction_id, &payload.message).await?;
    Ok((StatusCode::CREATED, Json(exchange.into())))
}

#[cfg(test)]
mod tests;
