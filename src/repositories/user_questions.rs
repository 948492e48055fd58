use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::UserQuestion;
use crate::db::types::{QuestionComplexity, QuestionType};

pub(crate) const COLUMNS: &str = "\
    id, user_id, course_id, activity_id, assessment_id, question_text, question_complexity, \
    question_duration, question_type, correct_answer, user_answer, is_correct, \
    is_study_complete, external_question_id, external_question_image, created_at, updated_at";

pub(crate) struct CreateUserQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) activity_id: &'a str,
    pub(crate) assessment_id: Option<&'a str>,
    pub(crate) question_text: &'a str,
    pub(crate) question_complexity: Option<QuestionComplexity>,
    pub(crate) question_duration: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) correct_answer: &'a str,
    pub(crate) user_answer: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) is_study_complete: bool,
    pub(crate) external_question_id: &'a str,
    pub(crate) external_question_image: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUserQuestion<'_>,
) -> Result<UserQuestion, sqlx::Error> {
    sqlx::query_as::<_, UserQuestion>(&format!(
        "INSERT INTO user_questions (
            id, user_id, course_id, activity_id, assessment_id, question_text,
            question_complexity, question_duration, question_type, correct_answer,
            user_answer, is_correct, is_study_complete, external_question_id,
            external_question_image, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.activity_id)
    .bind(params.assessment_id)
    .bind(params.question_text)
    .bind(params.question_complexity)
    .bind(params.question_duration)
    .bind(params.question_type)
    .bind(params.correct_answer)
    .bind(params.user_answer)
    .bind(params.is_correct)
    .bind(params.is_study_complete)
    .bind(params.external_question_id)
    .bind(params.external_question_image)
    .bind(params.now)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<UserQuestion>, sqlx::Error> {
    sqlx::query_as::<_, UserQuestion>(&format!("SELECT {COLUMNS} FROM user_questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Questions linked to an assessment, optionally filtered by study state.
pub(crate) async fn list_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
    study_complete: Option<bool>,
) -> Result<Vec<UserQuestion>, sqlx::Error> {
    sqlx::query_as::<_, UserQuestion>(&format!(
        "SELECT {COLUMNS}
         FROM user_questions
         WHERE assessment_id = $1
           AND ($2::boolean IS NULL OR is_study_complete = $2)
         ORDER BY created_at, id"
    ))
    .bind(assessment_id)
    .bind(study_complete)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_for_scope(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
    activity_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM user_questions
            WHERE user_id = $1 AND course_id = $2 AND activity_id = $3
         )",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(activity_id)
    .fetch_one(pool)
    .await
}

/// Links the user's orphaned questions for the course (and activity, when given) to the
/// assessment. Returns the number of rows relinked.
pub(crate) async fn link_unassigned(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
    user_id: &str,
    course_id: &str,
    activity_id: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_questions
         SET assessment_id = $1,
             updated_at = $2
         WHERE user_id = $3
           AND course_id = $4
           AND ($5::text IS NULL OR activity_id = $5)
           AND assessment_id IS NULL",
    )
    .bind(assessment_id)
    .bind(now)
    .bind(user_id)
    .bind(course_id)
    .bind(activity_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn mark_study_complete(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<UserQuestion>, sqlx::Error> {
    sqlx::query_as::<_, UserQuestion>(&format!(
        "UPDATE user_questions
         SET is_study_complete = TRUE,
             updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}
