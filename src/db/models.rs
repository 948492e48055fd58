use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{MessageRole, QuestionComplexity, QuestionType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UserQuestion {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: String,
    pub(crate) assessment_id: Option<String>,
    pub(crate) question_text: String,
    pub(crate) question_complexity: Option<QuestionComplexity>,
    pub(crate) question_duration: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) correct_answer: String,
    pub(crate) user_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) is_study_complete: bool,
    pub(crate) external_question_id: String,
    pub(crate) external_question_image: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UserAssessment {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: Option<String>,
    pub(crate) question_count_to_practice: Option<i32>,
    pub(crate) total_questions: i32,
    pub(crate) total_questions_answered_correctly: i32,
    pub(crate) total_questions_answered_wrong: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ChatInteraction {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: Option<String>,
    pub(crate) activity_name: Option<String>,
    pub(crate) question_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ChatMessage {
    pub(crate) id: String,
    pub(crate) chat_interaction_id: String,
    pub(crate) message: String,
    pub(crate) message_role: MessageRole,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) seq: i64,
}
