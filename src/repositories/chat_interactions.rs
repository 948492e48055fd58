use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ChatInteraction;

pub(crate) const COLUMNS: &str =
    "id, user_id, course_id, activity_id, activity_name, question_id, created_at";

pub(crate) struct CreateChatInteraction<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) activity_id: Option<&'a str>,
    pub(crate) activity_name: Option<&'a str>,
    pub(crate) question_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateChatInteraction<'_>,
) -> Result<ChatInteraction, sqlx::Error> {
    sqlx::query_as::<_, ChatInteraction>(&format!(
        "INSERT INTO chat_interactions (
            id, user_id, course_id, activity_id, activity_name, question_id, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.activity_id)
    .bind(params.activity_name)
    .bind(params.question_id)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ChatInteraction>, sqlx::Error> {
    sqlx::query_as::<_, ChatInteraction>(&format!(
        "SELECT {COLUMNS} FROM chat_interactions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<Option<ChatInteraction>, sqlx::Error> {
    sqlx::query_as::<_, ChatInteraction>(&format!(
        "SELECT {COLUMNS} FROM chat_interactions WHERE question_id = $1"
    ))
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

/// Interactions whose question belongs to the assessment.
pub(crate) async fn list_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Vec<ChatInteraction>, sqlx::Error> {
    sqlx::query_as::<_, ChatInteraction>(
        "SELECT ci.id, ci.user_id, ci.course_id, ci.activity_id, ci.activity_name,
                ci.question_id, ci.created_at
         FROM chat_interactions ci
         JOIN user_questions uq ON uq.id = ci.question_id
         WHERE uq.assessment_id = $1
         ORDER BY uq.created_at, uq.id",
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await
}
