use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::core::state::AppState;
use crate::repositories;
use crate::services::errors::WorkflowError;
use crate::services::language_model::{
    complete_structured, CompletionRequest, OutputSchema, PromptMessage,
};
use crate::services::prompts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub(crate) struct SubScores {
    #[validate(range(min = 1, max = 5))]
    pub(crate) understanding: i64,
    #[validate(range(min = 1, max = 5))]
    pub(crate) approach: i64,
    #[validate(range(min = 1, max = 5))]
    pub(crate) knowledge_application: i64,
    #[validate(range(min = 1, max = 5))]
    pub(crate) learning_progress: i64,
    #[validate(range(min = 1, max = 5))]
    pub(crate) final_accuracy: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct QuestionEvaluation {
    #[validate(nested)]
    pub(crate) scores: SubScores,
    pub(crate) feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct FinalReport {
    #[validate(nested)]
    pub(crate) scores: SubScores,
    pub(crate) narrative: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EvaluatedQuestion {
    pub(crate) question_id: String,
    pub(crate) interaction_id: String,
    pub(crate) evaluation: QuestionEvaluation,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AssessmentReport {
    pub(crate) assessment_id: String,
    pub(crate) questions: Vec<EvaluatedQuestion>,
    pub(crate) report: FinalReport,
}

fn scores_schema() -> Value {
    let score = json!({"type": "integer", "minimum": 1, "maximum": 5});
    json!({
        "type": "object",
        "properties": {
            "understanding": score,
            "approach": score,
            "knowledge_application": score,
            "learning_progress": score,
            "final_accuracy": score
        },
        "required": [
            "understanding", "approach", "knowledge_application", "learning_progress",
            "final_accuracy"
        ],
        "additionalProperties": false
    })
}

fn evaluation_schema(name: &'static str, text_field: &str) -> OutputSchema {
    OutputSchema {
        name,
        schema: json!({
            "type": "object",
            "properties": {
                "scores": scores_schema(),
                text_field: {"type": "string"}
            },
            "required": ["scores", text_field],
            "additionalProperties": false
        }),
    }
}

/// Scores every tutored question of the assessment, then asks for one aggregate report.
pub(crate) async fn generate_report(
    state: &AppState,
    assessment_id: &str,
) -> Result<AssessmentReport, WorkflowError> {
    let assessment = repositories::user_assessments::find_by_id(state.db(), assessment_id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("Assessment not found"))?;

    let questions =
        repositories::user_questions::list_by_assessment(state.db(), &assessment.id, None).await?;
    let mut interactions: HashMap<String, String> =
        repositories::chat_interactions::list_by_assessment(state.db(), &assessment.id)
            .await?
            .into_iter()
            .map(|interaction| (interaction.question_id, interaction.id))
            .collect();

    if interactions.is_empty() {
        return Err(WorkflowError::not_found("No tutoring sessions to evaluate for this assessment"));
    }

    let mut evaluated = Vec::with_capacity(interactions.len());
    for question in &questions {
        let Some(interaction_id) = interactions.remove(&question.id) else {
            continue;
        };

        let transcript =
            repositories::chat_messages::list_for_interaction(state.db(), &interaction_id).await?;
        let evaluation: QuestionEvaluation = complete_structured(
            state.language_model(),
            CompletionRequest {
                purpose: "evaluation",
                messages: vec![
                    PromptMessage::system(prompts::EVALUATOR_SYSTEM_PROMPT),
                    PromptMessage::user(prompts::question_evaluation_prompt(question, &transcript)),
                ],
                output: Some(evaluation_schema("question_evaluation", "feedback")),
            },
        )
        .await?;
        check_scores(&evaluation)?;

        evaluated.push(EvaluatedQuestion {
            question_id: question.id.clone(),
            interaction_id,
            evaluation,
        });
    }

    let evaluations_json = serde_json::to_string_pretty(&evaluated)
        .map_err(|err| WorkflowError::invalid(format!("Failed to encode evaluations: {err}")))?;
    let report: FinalReport = complete_structured(
        state.language_model(),
        CompletionRequest {
            purpose: "report",
            messages: vec![
                PromptMessage::system(prompts::REPORT_SYSTEM_PROMPT),
                PromptMessage::user(prompts::final_report_prompt(&evaluations_json)),
            ],
            output: Some(evaluation_schema("final_report", "narrative")),
        },
    )
    .await?;
    check_scores(&report)?;

    tracing::info!(
        assessment_id = %assessment.id,
        evaluated_questions = evaluated.len(),
        "Assessment report generated"
    );

    Ok(AssessmentReport { assessment_id: assessment.id, questions: evaluated, report })
}

fn check_scores(value: &impl Validate) -> Result<(), WorkflowError> {
    value
        .validate()
        .map_err(|err| WorkflowError::invalid(format!("Language model returned invalid scores: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(value: i64) -> SubScores {
        SubScores {
            understanding: value,
            approach: 3,
            knowledge_application: 3,
            learning_progress: 3,
            final_accuracy: 3,
        }
    }

    #[test]
    fn scores_within_range_pass() {
        let evaluation = QuestionEvaluation { scores: scores(5), feedback: "good".to_string() };
        assert!(check_scores(&evaluation).is_ok());
    }

    #[test]
    fn out_of_range_scores_are_invalid() {
        let low = QuestionEvaluation { scores: scores(0), feedback: String::new() };
        assert!(matches!(check_scores(&low), Err(WorkflowError::Invalid(_))));

        let high = FinalReport { scores: scores(6), narrative: String::new() };
        assert!(matches!(check_scores(&high), Err(WorkflowError::Invalid(_))));
    }

    #[test]
    fn schema_requires_text_field() {
        let schema = evaluation_schema("final_report", "narrative").schema;
        assert_eq!(schema["required"], json!(["scores", "narrative"]));
        assert_eq!(schema["properties"]["scores"]["properties"]["approach"]["maximum"], 5);
    }
}
