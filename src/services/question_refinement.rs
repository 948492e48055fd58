use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::types::QuestionComplexity;
use crate::services::errors::WorkflowError;
use crate::services::language_model::{
    complete_structured, CompletionRequest, LanguageModel, OutputSchema, PromptMessage,
};
use crate::services::prompts;
use crate::services::question_extraction::ExtractedQuestion;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RefinedQuestion {
    pub(crate) question: ExtractedQuestion,
    pub(crate) complexity: QuestionComplexity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefinementItem<'a> {
    id: String,
    question_text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefinementResponse {
    pub(crate) questions: Vec<RefinedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefinedItem {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) question_complexity: QuestionComplexity,
}

fn output_schema() -> OutputSchema {
    OutputSchema {
        name: "question_refinement",
        schema: json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "questionText": {"type": "string"},
                            "questionComplexity": {"type": "string", "enum": ["EASY", "MEDIUM", "HARD"]}
                        },
                        "required": ["id", "questionText", "questionComplexity"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["questions"],
            "additionalProperties": false
        }),
    }
}

/// Cleans up question text and assigns a complexity in one model call.
pub(crate) async fn refine(
    model: &dyn LanguageModel,
    questions: Vec<ExtractedQuestion>,
) -> Result<Vec<RefinedQuestion>, WorkflowError> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let items = questions
        .iter()
        .enumerate()
        .map(|(index, question)| RefinementItem {
            id: index.to_string(),
            question_text: &question.question_text,
        })
        .collect::<Vec<_>>();
    let items_json = serde_json::to_string(&items)
        .map_err(|err| WorkflowError::invalid(format!("Failed to encode questions: {err}")))?;

    let response: RefinementResponse = complete_structured(
        model,
        CompletionRequest {
            purpose: "refinement",
            messages: vec![
                PromptMessage::system(prompts::REFINEMENT_SYSTEM_PROMPT),
                PromptMessage::user(prompts::refinement_user_prompt(&items_json)),
            ],
            output: Some(output_schema()),
        },
    )
    .await?;

    merge(questions, response)
}

/// Joins model output back onto the batch by echoed id. Any misalignment fails the whole batch.
pub(crate) fn merge(
    questions: Vec<ExtractedQuestion>,
    response: RefinementResponse,
) -> Result<Vec<RefinedQuestion>, WorkflowError> {
    if response.questions.len() != questions.len() {
        return Err(WorkflowError::invalid(format!(
            "Refinement returned {} questions for a batch of {}",
            response.questions.len(),
            questions.len()
        )));
    }

    let mut by_index: HashMap<usize, RefinedItem> = HashMap::with_capacity(questions.len());
    for item in response.questions {
        let index = item
            .id
            .parse::<usize>()
            .ok()
            .filter(|index| *index < questions.len())
            .ok_or_else(|| {
                WorkflowError::invalid(format!("Refinement returned unknown id {:?}", item.id))
            })?;

        if by_index.contains_key(&index) {
            return Err(WorkflowError::invalid(format!(
                "Refinement returned duplicate id {:?}",
                item.id
            )));
        }
        by_index.insert(index, item);
    }

    questions
        .into_iter()
        .enumerate()
        .map(|(index, mut question)| {
            let item = by_index.remove(&index).ok_or_else(|| {
                WorkflowError::invalid(format!("Refinement omitted id {index}"))
            })?;
            question.question_text = item.question_text;
            Ok(RefinedQuestion { question, complexity: item.question_complexity })
        })
        .collect()
}
