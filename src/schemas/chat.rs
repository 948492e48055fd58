use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::ChatMessage;
use crate::db::types::MessageRole;
use crate::services::tutoring::{ChatState, Exchange, InteractionView};

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct InteractionCreate {
    #[serde(default)]
    #[validate(length(max = 255, message = "activity_name must be at most 255 characters"))]
    pub(crate) activity_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MessageCreate {
    #[validate(length(min = 1, max = 8000, message = "message must contain 1..8000 characters"))]
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) id: String,
    pub(crate) chat_interaction_id: String,
    pub(crate) message: String,
    pub(crate) message_role: MessageRole,
    pub(crate) created_at: String,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            chat_interaction_id: message.chat_interaction_id,
            message: message.message,
            message_role: message.message_role,
            created_at: format_primitive(message.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct InteractionResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) activity_id: Option<String>,
    pub(crate) activity_name: Option<String>,
    pub(crate) question_id: String,
    pub(crate) state: ChatState,
    pub(crate) created_at: String,
    pub(crate) messages: Vec<MessageResponse>,
}

impl From<InteractionView> for InteractionResponse {
    fn from(view: InteractionView) -> Self {
        let state = view.state();
        let interaction = view.interaction;
        Self {
            id: interaction.id,
            user_id: interaction.user_id,
            course_id: interaction.course_id,
            activity_id: interaction.activity_id,
            activity_name: interaction.activity_name,
            question_id: interaction.question_id,
            state,
            created_at: format_primitive(interaction.created_at),
            messages: view.messages.into_iter().map(MessageResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExchangeResponse {
    pub(crate) user: MessageResponse,
    pub(crate) assistant: MessageResponse,
}

impl From<Exchange> for ExchangeResponse {
    fn from(exchange: Exchange) -> Self {
        Self { user: exchange.user.into(), assistant: exchange.assistant.into() }
    }
}
