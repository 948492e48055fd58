use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::UserAssessment;
use crate::services::assessments::{AssessmentPatch, NewAssessment};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentCreate {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub(crate) user_id: String,
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[serde(default)]
    pub(crate) activity_id: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "question_count_to_practice must be non-negative"))]
    pub(crate) question_count_to_practice: Option<i32>,
}

impl From<AssessmentCreate> for NewAssessment {
    fn from(payload: AssessmentCreate) -> Self {
        Self {
            user_id: payload.user_id,
            course_id: payload.course_id,
            activity_id: payload.activity_id.filter(|value| !value.is_empty()),
            question_count_to_practice: payload.question_count_to_practice,
        }
    }
}

/// Only these fields may be patched; anything else is rejected.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub(crate) struct AssessmentUpdate {
    #[validate(range(min = 0, message = "question_count_to_practice must be non-negative"))]
    pub(crate) question_count_to_practice: Option<i32>,
    #[validate(length(min = 1, message = "activity_id must not be empty"))]
    pub(crate) activity_id: Option<String>,
    #[validate(range(min = 0, message = "total_questions must be non-negative"))]
    pub(crate) total_questions: Option<i32>,
    #[validate(range(min = 0, message = "total_questions_answered_correctly must be non-negative"))]
    pub(crate) total_questions_answered_correctly: Option<i32>,
    #[validate(range(min = 0, message = "total_questions_answered_wrong must be non-negative"))]
    pub(crate) total_questions_answered_wrong: Option<i32>,
}

impl From<AssessmentUpdate> for AssessmentPatch {
    fn from(payload: AssessmentUpdate) -> Self {
        Self {
            question_count_to_practice: payload.question_count_to_practice,
            activity_id: payload.activity_id,
            total_questions: payload.total_questions,
            total_questions_answered_correctly: payload.total_questions_answered_correctly,
            total_questions_answered_wrong: payload.total_questions_answered_wrong,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: Option<String>,
    pub(crate) question_count_to_practice: Option<i32>,
    pub(crate) total_questions: i32,
    pub(crate) total_questions_answered_correctly: i32,
    pub(crate) total_questions_answered_wrong: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<UserAssessment> for AssessmentResponse {
    fn from(assessment: UserAssessment) -> Self {
        Self {
            id: assessment.id,
            user_id: assessment.user_id,
            course_id: assessment.course_id,
            activity_id: assessment.activity_id,
            question_count_to_practice: assessment.question_count_to_practice,
            total_questions: assessment.total_questions,
            total_questions_answered_correctly: assessment.total_questions_answered_correctly,
            total_questions_answered_wrong: assessment.total_questions_answered_wrong,
            created_at: format_primitive(assessment.created_at),
            updated_at: format_primitive(assessment.updated_at),
        }
    }
}
