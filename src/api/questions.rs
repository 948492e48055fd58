use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::ProviderToken;
use crate::api::validation::{validated, validated_or_default};
use crate::core::state::AppState;
use crate::schemas::chat::{InteractionCreate, InteractionResponse};
use crate::schemas::question::{QuestionImportRequest, QuestionResponse};
use crate::services::{assessments, tutoring};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/import", post(import_questions))
        .route("/:question_id", get(get_question))
        .route("/:question_id/complete", post(mark_complete))
        .route("/:question_id/chat", post(create_interaction))
}

async fn import_questions(
    State(state): State<AppState>,
    ProviderToken(token): ProviderToken,
    payload: Result<Json<QuestionImportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<QuestionResponse>>), ApiError> {
    let payload = validated(payload)?;

    let questions = assessments::import_questions(&state, payload.into(), &token).await?;
    Ok((StatusCode::CREATED, Json(questions.into_iter().map(QuestionResponse::from).collect())))
}

async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = tutoring::get_question(&state, &question_id).await?;
    Ok(Json(question.into()))
}

async fn mark_complete(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = tutoring::mark_complete(&state, &question_id).await?;
    Ok(Json(question.into()))
}

/// The body is optional; an empty request opens the chat without an activity name.
async fn create_interaction(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<InteractionResponse>), ApiError> {
    let payload: InteractionCreate = validated_or_default(&body)?;

    let created =
        tutoring::create_interaction(&state, &question_id, payload.activity_name).await?;
    let status = if created.is_new() { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(created.into_inner().into())))
}
