pub(crate) mod chat_interactions;
pub(crate) mod chat_messages;
pub(crate) mod health;
pub(crate) mod user_assessments;
pub(crate) mod user_questions;
