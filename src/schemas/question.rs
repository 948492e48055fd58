use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::UserQuestion;
use crate::db::types::{QuestionComplexity, QuestionType};
use crate::services::assessments::QuestionImport;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionImportRequest {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub(crate) user_id: String,
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[validate(length(min = 1, message = "activity_id must not be empty"))]
    pub(crate) activity_id: String,
}

impl From<QuestionImportRequest> for QuestionImport {
    fn from(payload: QuestionImportRequest) -> Self {
        Self {
            user_id: payload.user_id,
            course_id: payload.course_id,
            activity_id: payload.activity_id,
        }
    }
}

/// Question as shown to the student. The correct answer is not exposed.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: String,
    pub(crate) assessment_id: Option<String>,
    pub(crate) question_text: String,
    pub(crate) question_complexity: Option<QuestionComplexity>,
    pub(crate) question_duration: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) user_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) is_study_complete: bool,
    pub(crate) external_question_id: String,
    pub(crate) external_question_image: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<UserQuestion> for QuestionResponse {
    fn from(question: UserQuestion) -> Self {
        Self {
            id: question.id,
            user_id: question.user_id,
            course_id: question.course_id,
            activity_id: question.activity_id,
            assessment_id: question.assessment_id,
            question_text: question.question_text,
            question_complexity: question.question_complexity,
            question_duration: question.question_duration,
            question_type: question.question_type,
            user_answer: question.user_answer,
            is_correct: question.is_correct,
            is_study_complete: question.is_study_complete,
            external_question_id: question.external_question_id,
            external_question_image: question.external_question_image,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}
