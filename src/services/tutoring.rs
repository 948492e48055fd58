use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::is_unique_violation;
use crate::db::models::{ChatInteraction, ChatMessage, UserQuestion};
use crate::db::types::MessageRole;
use crate::repositories;
use crate::services::assessments::Created;
use crate::services::errors::WorkflowError;
use crate::services::language_model::{CompletionRequest, PromptMessage};
use crate::services::prompts;

/// Derived from the transcript; nothing is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum ChatState {
    Uninitialized,
    Active,
}

impl ChatState {
    pub(crate) fn of(transcript: &[ChatMessage]) -> Self {
        if transcript.is_empty() {
            Self::Uninitialized
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InteractionView {
    pub(crate) interaction: ChatInteraction,
    pub(crate) messages: Vec<ChatMessage>,
}

impl InteractionView {
    pub(crate) fn state(&self) -> ChatState {
        ChatState::of(&self.messages)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Exchange {
    pub(crate) user: ChatMessage,
    pub(crate) assistant: ChatMessage,
}

pub(crate) async fn get_question(
    state: &AppState,
    question_id: &str,
) -> Result<UserQuestion, WorkflowError> {
    repositories::user_questions::find_by_id(state.db(), question_id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("Question not found"))
}

pub(crate) async fn mark_complete(
    state: &AppState,
    question_id: &str,
) -> Result<UserQuestion, WorkflowError> {
    let question =
        repositories::user_questions::mark_study_complete(state.db(), question_id, primitive_now_utc())
            .await?
            .ok_or_else(|| WorkflowError::not_found("Question not found"))?;

    tracing::info!(question_id = %question.id, "Question marked study-complete");
    Ok(question)
}

/// Opens the tutoring conversation for a question, or returns the one it already has.
///
/// An interaction whose opening turns were never answered is completed here, so a retry
/// after a failed model call picks up where the first attempt stopped.
pub(crate) async fn create_interaction(
    state: &AppState,
    question_id: &str,
    activity_name: Option<String>,
) -> Result<Created<InteractionView>, WorkflowError> {
    let question = get_question(state, question_id).await?;

    if let Some(existing) =
        repositories::chat_interactions::find_by_question(state.db(), &question.id).await?
    {
        let view = open_existing(state, existing, &question).await?;
        return Ok(Created::Existing(view));
    }

    if question.is_study_complete {
        return Err(WorkflowError::Conflict("Question is already study-complete".to_string()));
    }

    let interaction_id = Uuid::new_v4().to_string();
    let mut tx = state.db().begin().await?;
    let inserted = repositories::chat_interactions::create(
        &mut *tx,
        repositories::chat_interactions::CreateChatInteraction {
            id: &interaction_id,
            user_id: &question.user_id,
            course_id: &question.course_id,
            activity_id: Some(&question.activity_id),
            activity_name: activity_name.as_deref(),
            question_id: &question.id,
            now: primitive_now_utc(),
        },
    )
    .await;
    let interaction = match inserted {
        Ok(interaction) => interaction,
        Err(err) if is_unique_violation(&err) => {
            tx.rollback().await?;
            let existing =
                repositories::chat_interactions::find_by_question(state.db(), &question.id)
                    .await?
                    .ok_or_else(|| {
                        WorkflowError::Conflict(
                            "Question already has a chat interaction".to_string(),
                        )
                    })?;
            let view = open_existing(state, existing, &question).await?;
            return Ok(Created::Existing(view));
        }
        Err(err) => return Err(err.into()),
    };
    insert_seed_turns(&mut tx, &interaction.id, &question).await?;
    tx.commit().await?;

    tracing::info!(
        interaction_id = %interaction.id,
        question_id = %question.id,
        "Chat interaction created"
    );

    let view = reply_to_opening(state, interaction).await?;
    Ok(Created::New(view))
}

/// Seeds an empty transcript and answers the opening turns if the tutor has not spoken yet.
async fn open_existing(
    state: &AppState,
    interaction: ChatInteraction,
    question: &UserQuestion,
) -> Result<InteractionView, WorkflowError> {
    let messages =
        repositories::chat_messages::list_for_interaction(state.db(), &interaction.id).await?;
    if messages.iter().any(|message| message.message_role == MessageRole::Assistant) {
        return Ok(InteractionView { interaction, messages });
    }

    if messages.is_empty() {
        tracing::info!(interaction_id = %interaction.id, "Seeding empty interaction");
        let mut tx = state.db().begin().await?;
        insert_seed_turns(&mut tx, &interaction.id, question).await?;
        tx.commit().await?;
    } else {
        tracing::info!(interaction_id = %interaction.id, "Answering unanswered opening turns");
    }

    reply_to_opening(state, interaction).await
}

pub(crate) async fn get_interaction(
    state: &AppState,
    interaction_id: &str,
) -> Result<InteractionView, WorkflowError> {
    let interaction = find_interaction(state, interaction_id).await?;
    let messages =
        repositories::chat_messages::list_for_interaction(state.db(), &interaction.id).await?;
    Ok(InteractionView { interaction, messages })
}

pub(crate) async fn list_messages(
    state: &AppState,
    interaction_id: &str,
) -> Result<Vec<ChatMessage>, WorkflowError> {
    Ok(get_interaction(state, interaction_id).await?.messages)
}

/// Stores the student's message, replays the transcript through the context builder and
/// stores the tutor's reply.
pub(crate) async fn continue_conversation(
    state: &AppState,
    interaction_id: &str,
    message: &str,
) -> Result<Exchange, WorkflowError> {
    let interaction = find_interaction(state, interaction_id).await?;

    let user = store_message(state, &interaction.id, MessageRole::User, message).await?;
    let transcript =
        repositories::chat_messages::list_for_interaction(state.db(), &interaction.id).await?;
    let context = state.context_builder().build(&transcript);

    let reply = state
        .language_model()
        .complete(CompletionRequest { purpose: "tutoring", messages: context, output: None })
        .await?;
    let assistant = store_message(state, &interaction.id, MessageRole::Assistant, &reply).await?;

    tracing::info!(
        interaction_id = %interaction.id,
        transcript_len = transcript.len() + 1,
        "Tutor replied"
    );

    Ok(Exchange { user, assistant })
}

async fn find_interaction(
    state: &AppState,
    interaction_id: &str,
) -> Result<ChatInteraction, WorkflowError> {
    repositories::chat_interactions::find_by_id(state.db(), interaction_id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("Chat interaction not found"))
}

async fn insert_seed_turns(
    conn: &mut PgConnection,
    interaction_id: &str,
    question: &UserQuestion,
) -> Result<(), sqlx::Error> {
    let opening = prompts::tutor_opening_prompt(question);
    for (role, text) in [
        (MessageRole::System, prompts::TUTOR_SYSTEM_PROMPT),
        (MessageRole::User, opening.as_str()),
    ] {
        let id = Uuid::new_v4().to_string();
        repositories::chat_messages::create(
            &mut *conn,
            repositories::chat_messages::CreateChatMessage {
                id: &id,
                chat_interaction_id: interaction_id,
                message: text,
                message_role: role,
                created_at: primitive_now_utc(),
            },
        )
        .await?;
    }
    Ok(())
}

/// Answers the two seed turns and returns the full transcript.
async fn reply_to_opening(
    state: &AppState,
    interaction: ChatInteraction,
) -> Result<InteractionView, WorkflowError> {
    let seed = repositories::chat_messages::list_for_interaction(state.db(), &interaction.id).await?;
    let context = seed
        .iter()
        .map(|message| PromptMessage { role: message.message_role, content: message.message.clone() })
        .collect();

    let reply = state
        .language_model()
        .complete(CompletionRequest { purpose: "tutoring", messages: context, output: None })
        .await?;
    store_message(state, &interaction.id, MessageRole::Assistant, &reply).await?;

    let messages =
        repositories::chat_messages::list_for_interaction(state.db(), &interaction.id).await?;
    Ok(InteractionView { interaction, messages })
}

async fn store_message(
    state: &AppState,
    interaction_id: &str,
    role: MessageRole,
    text: &str,
) -> Result<ChatMessage, WorkflowError> {
    let id = Uuid::new_v4().to_string();
    let message = repositories::chat_messages::create(
        state.db(),
        repositories::chat_messages::CreateChatMessage {
            id: &id,
            chat_interaction_id: interaction_id,
            message: text,
            message_role: role,
            created_at: primitive_now_utc(),
        },
    )
    .await?;
    Ok(message)
}
