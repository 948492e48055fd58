use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgConnection;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::is_unique_violation;
use crate::db::models::{UserAssessment, UserQuestion};
use crate::repositories;
use crate::services::errors::WorkflowError;
use crate::services::question_extraction;
use crate::services::question_refinement::{self, RefinedQuestion};

/// Result of an idempotent create: either the row that already existed or a fresh one.
#[derive(Debug)]
pub(crate) enum Created<T> {
    Existing(T),
    New(T),
}

impl<T> Created<T> {
    pub(crate) fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }

    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Existing(value) | Self::New(value) => value,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NewAssessment {
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: Option<String>,
    pub(crate) question_count_to_practice: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AssessmentPatch {
    pub(crate) question_count_to_practice: Option<i32>,
    pub(crate) activity_id: Option<String>,
    pub(crate) total_questions: Option<i32>,
    pub(crate) total_questions_answered_correctly: Option<i32>,
    pub(crate) total_questions_answered_wrong: Option<i32>,
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionImport {
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: String,
}

pub(crate) async fn create_assessment(
    state: &AppState,
    input: NewAssessment,
    token: &str,
) -> Result<Created<UserAssessment>, WorkflowError> {
    if let Some(existing) = repositories::user_assessments::find_by_scope(
        state.db(),
        &input.user_id,
        &input.course_id,
        input.activity_id.as_deref(),
    )
    .await?
    {
        tracing::info!(assessment_id = %existing.id, "Assessment already exists for scope");
        return Ok(Created::Existing(existing));
    }

    let extracted = question_extraction::extract(
        state.course_provider(),
        &input.course_id,
        input.activity_id.as_deref(),
        token,
    )
    .await?;
    let refined = question_refinement::refine(state.language_model(), extracted).await?;

    let total = count(refined.len())?;
    let correct = count(refined.iter().filter(|item| item.question.is_correct).count())?;

    let now = primitive_now_utc();
    let assessment_id = Uuid::new_v4().to_string();
    let mut tx = state.db().begin().await?;

    let inserted = repositories::user_assessments::create(
        &mut *tx,
        repositories::user_assessments::CreateUserAssessment {
            id: &assessment_id,
            user_id: &input.user_id,
            course_id: &input.course_id,
            activity_id: input.activity_id.as_deref(),
            question_count_to_practice: input.question_count_to_practice,
            total_questions: total,
            total_questions_answered_correctly: correct,
            total_questions_answered_wrong: total - correct,
            now,
        },
    )
    .await;
    let assessment = match inserted {
        Ok(assessment) => assessment,
        Err(err) if is_unique_violation(&err) => {
            tx.rollback().await?;
            let existing = repositories::user_assessments::find_by_scope(
                state.db(),
                &input.user_id,
                &input.course_id,
                input.activity_id.as_deref(),
            )
            .await?
            .ok_or_else(|| {
                WorkflowError::Conflict(
                    "Assessment already exists for this course activity".to_string(),
                )
            })?;
            tracing::info!(assessment_id = %existing.id, "Concurrent create lost the race");
            return Ok(Created::Existing(existing));
        }
        Err(err) => return Err(err.into()),
    };

    persist_questions(&mut tx, &refined, Some(&assessment.id), now).await?;
    tx.commit().await?;

    tracing::info!(
        assessment_id = %assessment.id,
        total_questions = total,
        answered_correctly = correct,
        "Assessment created"
    );

    Ok(Created::New(assessment))
}

pub(crate) async fn get_assessment(
    state: &AppState,
    assessment_id: &str,
) -> Result<UserAssessment, WorkflowError> {
    repositories::user_assessments::find_by_id(state.db(), assessment_id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("Assessment not found"))
}

/// Applies the patch and links the user's orphaned questions for the same course/activity.
pub(crate) async fn update_assessment(
    state: &AppState,
    assessment_id: &str,
    patch: AssessmentPatch,
) -> Result<UserAssessment, WorkflowError> {
    let now = primitive_now_utc();
    let mut tx = state.db().begin().await?;

    let assessment = repositories::user_assessments::update(
        &mut *tx,
        assessment_id,
        repositories::user_assessments::UpdateUserAssessment {
            question_count_to_practice: patch.question_count_to_practice,
            activity_id: patch.activity_id,
            total_questions: patch.total_questions,
            total_questions_answered_correctly: patch.total_questions_answered_correctly,
            total_questions_answered_wrong: patch.total_questions_answered_wrong,
            updated_at: now,
        },
    )
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            WorkflowError::Conflict("Assessment already exists for this course activity".to_string())
        } else {
            WorkflowError::Database(err)
        }
    })?
    .ok_or_else(|| WorkflowError::not_found("Assessment not found"))?;

    let linked = repositories::user_questions::link_unassigned(
        &mut *tx,
        &assessment.id,
        &assessment.user_id,
        &assessment.course_id,
        assessment.activity_id.as_deref(),
        now,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(assessment_id = %assessment.id, linked_questions = linked, "Assessment updated");
    Ok(assessment)
}

/// Incomplete questions of the assessment, sampled without replacement.
pub(crate) async fn select_practice_questions(
    state: &AppState,
    assessment_id: &str,
) -> Result<Vec<UserQuestion>, WorkflowError> {
    let assessment = get_assessment(state, assessment_id).await?;
    let pool =
        repositories::user_questions::list_by_assessment(state.db(), &assessment.id, Some(false))
            .await?;
    let available = pool.len();

    let selected =
        sample_practice(pool, assessment.question_count_to_practice, &mut rand::thread_rng())?;

    tracing::debug!(
        assessment_id = %assessment.id,
        available,
        selected = selected.len(),
        "Selected practice questions"
    );
    Ok(selected)
}

/// Shuffles `pool` and keeps `count` items; `None` keeps all of them.
pub(crate) fn sample_practice<T, R: Rng + ?Sized>(
    mut pool: Vec<T>,
    count: Option<i32>,
    rng: &mut R,
) -> Result<Vec<T>, WorkflowError> {
    pool.shuffle(rng);

    let Some(count) = count else {
        return Ok(pool);
    };

    let wanted = usize::try_from(count).map_err(|_| {
        WorkflowError::invalid(format!("Practice question count must not be negative: {count}"))
    })?;
    if wanted > pool.len() {
        return Err(WorkflowError::invalid(format!(
            "Requested {wanted} practice questions but only {} are available",
            pool.len()
        )));
    }

    pool.truncate(wanted);
    Ok(pool)
}

/// Stores freshly extracted questions without an assessment link.
pub(crate) async fn import_questions(
    state: &AppState,
    input: QuestionImport,
    token: &str,
) -> Result<Vec<UserQuestion>, WorkflowError> {
    let exists = repositories::user_questions::exists_for_scope(
        state.db(),
        &input.user_id,
        &input.course_id,
        &input.activity_id,
    )
    .await?;
    if exists {
        return Err(WorkflowError::Conflict(
            "Questions already imported for this course activity".to_string(),
        ));
    }

    let extracted = question_extraction::extract(
        state.course_provider(),
        &input.course_id,
        Some(&input.activity_id),
        token,
    )
    .await?;
    let refined = question_refinement::refine(state.language_model(), extracted).await?;

    let mut tx = state.db().begin().await?;
    let stored = persist_questions(&mut tx, &refined, None, primitive_now_utc()).await?;
    tx.commit().await?;

    tracing::info!(
        course_id = %input.course_id,
        activity_id = %input.activity_id,
        questions = stored.len(),
        "Questions imported"
    );
    Ok(stored)
}

async fn persist_questions(
    conn: &mut PgConnection,
    refined: &[RefinedQuestion],
    assessment_id: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<Vec<UserQuestion>, WorkflowError> {
    let mut stored = Vec::with_capacity(refined.len());

    for item in refined {
        let question = &item.question;
        let id = Uuid::new_v4().to_string();
        let row = repositories::user_questions::create(
            &mut *conn,
            repositories::user_questions::CreateUserQuestion {
                id: &id,
                user_id: &question.user_id,
                course_id: &question.course_id,
                activity_id: &question.activity_id,
                assessment_id,
                question_text: &question.question_text,
                question_complexity: Some(item.complexity),
                question_duration: question.question_duration,
                question_type: question.question_type,
                correct_answer: &question.correct_answer,
                user_answer: &question.user_answer,
                is_correct: question.is_correct,
                is_study_complete: question.is_correct,
                external_question_id: &question.external_question_id,
                external_question_image: question.external_question_image.as_deref(),
                now,
            },
        )
        .await?;
        stored.push(row);
    }

    Ok(stored)
}

fn count(value: usize) -> Result<i32, WorkflowError> {
    i32::try_from(value).map_err(|_| WorkflowError::invalid("Too many questions in batch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn sample_picks_distinct_items_from_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample_practice((0..5).collect::<Vec<_>>(), Some(3), &mut rng).unwrap();

        assert_eq!(picked.len(), 3);
        let unique = picked.iter().copied().collect::<HashSet<_>>();
        assert_eq!(unique.len(), 3);
        assert!(picked.iter().all(|value| (0..5).contains(value)));
    }

    #[test]
    fn unset_count_returns_whole_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut picked = sample_practice(vec!['a', 'b', 'c'], None, &mut rng).unwrap();
        picked.sort_unstable();
        assert_eq!(picked, vec!['a', 'b', 'c']);
    }

    #[test]
    fn count_above_pool_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = sample_practice(vec![1, 2], Some(3), &mut rng).unwrap_err();
        assert!(matches!(err, WorkflowError::Invalid(_)));
    }

    #[test]
    fn zero_count_returns_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_practice(vec![1, 2], Some(0), &mut rng).unwrap().is_empty());
    }

    #[test]
    fn created_reports_novelty() {
        assert!(Created::New(1).is_new());
        assert!(!Created::Existing(1).is_new());
        assert_eq!(Created::Existing(5).into_inner(), 5);
    }
}
