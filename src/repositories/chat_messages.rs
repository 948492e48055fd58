use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ChatMessage;
use crate::db::types::MessageRole;

pub(crate) const COLUMNS: &str = "id, chat_interaction_id, message, message_role, created_at, seq";

pub(crate) struct CreateChatMessage<'a> {
    pub(crate) id: &'a str,
    pub(crate) chat_interaction_id: &'a str,
    pub(crate) message: &'a str,
    pub(crate) message_role: MessageRole,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateChatMessage<'_>,
) -> Result<ChatMessage, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "INSERT INTO chat_messages (id, chat_interaction_id, message, message_role, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.chat_interaction_id)
    .bind(params.message)
    .bind(params.message_role)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Full transcript, oldest first. `seq` breaks ties between equal timestamps.
pub(crate) async fn list_for_interaction(
    pool: &PgPool,
    chat_interaction_id: &str,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {COLUMNS}
         FROM chat_messages
         WHERE chat_interaction_id = $1
         ORDER BY created_at, seq"
    ))
    .bind(chat_interaction_id)
    .fetch_all(pool)
    .await
}
