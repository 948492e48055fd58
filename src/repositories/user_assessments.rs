use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::UserAssessment;

pub(crate) const COLUMNS: &str = "\
    id, user_id, course_id, activity_id, question_count_to_practice, total_questions, \
    total_questions_answered_correctly, total_questions_answered_wrong, created_at, updated_at";

pub(crate) struct CreateUserAssessment<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) activity_id: Option<&'a str>,
    pub(crate) question_count_to_practice: Option<i32>,
    pub(crate) total_questions: i32,
    pub(crate) total_questions_answered_correctly: i32,
    pub(crate) total_questions_answered_wrong: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUserAssessment<'_>,
) -> Result<UserAssessment, sqlx::Error> {
    sqlx::query_as::<_, UserAssessment>(&format!(
        "INSERT INTO user_assessments (
            id, user_id, course_id, activity_id, question_count_to_practice, total_questions,
            total_questions_answered_correctly, total_questions_answered_wrong,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.activity_id)
    .bind(params.question_count_to_practice)
    .bind(params.total_questions)
    .bind(params.total_questions_answered_correctly)
    .bind(params.total_questions_answered_wrong)
    .bind(params.now)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<UserAssessment>, sqlx::Error> {
    sqlx::query_as::<_, UserAssessment>(&format!(
        "SELECT {COLUMNS} FROM user_assessments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Looks up the assessment for a (user, course, activity) scope. A missing activity only
/// matches assessments that have none either.
pub(crate) async fn find_by_scope(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
    activity_id: Option<&str>,
) -> Result<Option<UserAssessment>, sqlx::Error> {
    sqlx::query_as::<_, UserAssessment>(&format!(
        "SELECT {COLUMNS}
         FROM user_assessments
         WHERE user_id = $1
           AND course_id = $2
           AND activity_id IS NOT DISTINCT FROM $3"
    ))
    .bind(user_id)
    .bind(course_id)
    .bind(activity_id)
    .fetch_optional(pool)
    .await
}

/// Allow-listed partial update; `None` leaves the column untouched.
pub(crate) struct UpdateUserAssessment {
    pub(crate) question_count_to_practice: Option<i32>,
    pub(crate) activity_id: Option<String>,
    pub(crate) total_questions: Option<i32>,
    pub(crate) total_questions_answered_correctly: Option<i32>,
    pub(crate) total_questions_answered_wrong: Option<i32>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateUserAssessment,
) -> Result<Option<UserAssessment>, sqlx::Error> {
    sqlx::query_as::<_, UserAssessment>(&format!(
        "UPDATE user_assessments SET
            question_count_to_practice = COALESCE($1, question_count_to_practice),
            activity_id = COALESCE($2, activity_id),
            total_questions = COALESCE($3, total_questions),
            total_questions_answered_correctly = COALESCE($4, total_questions_answered_correctly),
            total_questions_answered_wrong = COALESCE($5, total_questions_answered_wrong),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}"
    ))
    .bind(params.question_count_to_practice)
    .bind(params.activity_id)
    .bind(params.total_questions)
    .bind(params.total_questions_answered_correctly)
    .bind(params.total_questions_answered_wrong)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}
