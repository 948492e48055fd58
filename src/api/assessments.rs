use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::ProviderToken;
use crate::api::validation::validated;
use crate::core::state::AppState;
use crate::schemas::assessment::{AssessmentCreate, AssessmentResponse, AssessmentUpdate};
use crate::schemas::question::QuestionResponse;
use crate::services::{assessments, evaluation};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assessment))
        .route("/:assessment_id", get(get_assessment).patch(update_assessment))
        .route("/:assessment_id/practice-questions", get(practice_questions))
        .route("/:assessment_id/report", get(report))
}

async fn create_assessment(
    State(state): State<AppState>,
    ProviderToken(token): ProviderToken,
    payload: Result<Json<AssessmentCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<AssessmentResponse>), ApiError> {
    let payload = validated(payload)?;

    let created = assessments::create_assessment(&state, payload.into(), &token).await?;
    let status = if created.is_new() { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(created.into_inner().into())))
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let assessment = assessments::get_assessment(&state, &assessment_id).await?;
    Ok(Json(assessment.into()))
}

async fn update_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
    payload: Result<Json<AssessmentUpdate>, JsonRejection>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let payload = validated(payload)?;

    let assessment =
        assessments::update_assessment(&state, &assessment_id, payload.into()).await?;
    Ok(Json(assessment.into()))
}

async fn practice_questions(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let questions = assessments::select_practice_questions(&state, &assessment_id).await?;
    Ok(Json(questions.into_iter().map(QuestionResponse::from).collect()))
}

async fn report(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
) -> Result<Json<evaluation::AssessmentReport>, ApiError> {
    let report = evaluation::generate_report(&state, &assessment_id).await?;
    Ok(Json(report))
}
