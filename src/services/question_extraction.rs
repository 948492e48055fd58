use serde::Deserialize;
use serde_json::Value;

use crate::core::time::{elapsed_seconds, parse_rfc3339_utc};
use crate::db::types::QuestionType;
use crate::services::course_provider::CourseProvider;
use crate::services::errors::WorkflowError;

/// One provider question as answered by the student, before refinement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractedQuestion {
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: String,
    pub(crate) question_text: String,
    pub(crate) question_duration: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) correct_answer: String,
    pub(crate) user_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) external_question_id: String,
    pub(crate) external_question_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassSection {
    user_id: String,
    course_id: String,
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    questions: Vec<ProviderQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderQuestion {
    #[serde(rename = "_id")]
    id: String,
    text_recognition: TextRecognition,
    created: String,
    ended: String,
    answer_type: String,
    #[serde(default)]
    results: Vec<AnswerEntry>,
    #[serde(default)]
    user_questions: Vec<UserAnswer>,
    #[serde(rename = "ImageURL", default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextRecognition {
    #[serde(default)]
    extracted_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerEntry {
    answer: Value,
}

#[derive(Debug, Deserialize)]
struct UserAnswer {
    answer: Value,
    correct: bool,
}

/// Fetches the course's class sections and flattens the chosen activity's questions.
pub(crate) async fn extract(
    provider: &dyn CourseProvider,
    course_id: &str,
    activity_id: Option<&str>,
    token: &str,
) -> Result<Vec<ExtractedQuestion>, WorkflowError> {
    let payload = provider.fetch_class_sections(course_id, token).await?;
    let questions = parse_class_sections(payload, activity_id)?;

    tracing::info!(
        course_id = %course_id,
        activity_id = activity_id.unwrap_or("-"),
        questions = questions.len(),
        "Extracted questions from course provider"
    );

    Ok(questions)
}

/// Picks, per class section, the activity with `activity_id` (or the first activity when none
/// matches) and maps each of its questions.
pub(crate) fn parse_class_sections(
    payload: Value,
    activity_id: Option<&str>,
) -> Result<Vec<ExtractedQuestion>, WorkflowError> {
    let sections: Vec<ClassSection> = serde_json::from_value(payload)
        .map_err(|err| WorkflowError::invalid(format!("Malformed course provider payload: {err}")))?;

    let mut extracted = Vec::new();
    for section in sections {
        let activity = activity_id
            .and_then(|wanted| section.activities.iter().find(|activity| activity.id == wanted))
            .or_else(|| section.activities.first())
            .ok_or_else(|| WorkflowError::invalid("Class section has no activities"))?;

        for question in &activity.questions {
            extracted.push(map_question(&section, activity, question)?);
        }
    }

    Ok(extracted)
}

fn map_question(
    section: &ClassSection,
    activity: &Activity,
    question: &ProviderQuestion,
) -> Result<ExtractedQuestion, WorkflowError> {
    let created = parse_timestamp(&question.id, "created", &question.created)?;
    let ended = parse_timestamp(&question.id, "ended", &question.ended)?;

    let question_type = QuestionType::from_provider(&question.answer_type).ok_or_else(|| {
        WorkflowError::invalid(format!(
            "Question {} has unsupported answerType {:?}",
            question.id, question.answer_type
        ))
    })?;

    let correct_answer = question
        .results
        .first()
        .map(|entry| answer_text(&entry.answer))
        .ok_or_else(|| missing_field(&question.id, "results"))?;

    let user_answer =
        question.user_questions.first().ok_or_else(|| missing_field(&question.id, "userQuestions"))?;

    Ok(ExtractedQuestion {
        user_id: section.user_id.clone(),
        course_id: section.course_id.clone(),
        activity_id: activity.id.clone(),
        question_text: question.text_recognition.extracted_text.join(" "),
        question_duration: elapsed_seconds(created, ended),
        question_type,
        correct_answer,
        user_answer: answer_text(&user_answer.answer),
        is_correct: user_answer.correct,
        external_question_id: question.id.clone(),
        external_question_image: question.image_url.clone(),
    })
}

fn parse_timestamp(
    question_id: &str,
    field: &str,
    value: &str,
) -> Result<time::OffsetDateTime, WorkflowError> {
    parse_rfc3339_utc(value).map_err(|err| {
        WorkflowError::invalid(format!("Question {question_id} has invalid {field} timestamp: {err}"))
    })
}

fn missing_field(question_id: &str, field: &str) -> WorkflowError {
    WorkflowError::invalid(format!("Question {question_id} is missing {field}[0]"))
}

/// Answers are usually strings; lists and numbers are kept in their JSON form.
fn answer_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
