use std::sync::Arc;

use crate::core::config::Settings;
use crate::db::models::ChatMessage;
use crate::db::types::MessageRole;
use crate::services::language_model::PromptMessage;

/// Turns a stored transcript (oldest first) into the messages sent to the model.
pub(crate) trait ContextBuilder: Send + Sync {
    fn build(&self, transcript: &[ChatMessage]) -> Vec<PromptMessage>;
}

/// Replays the whole transcript.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FullHistory;

impl ContextBuilder for FullHistory {
    fn build(&self, transcript: &[ChatMessage]) -> Vec<PromptMessage> {
        transcript.iter().map(to_prompt).collect()
    }
}

/// Keeps every system turn plus the last `window` non-system turns.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecentWindow {
    window: usize,
}

impl RecentWindow {
    pub(crate) fn new(window: usize) -> Self {
        Self { window }
    }
}

impl ContextBuilder for RecentWindow {
    fn build(&self, transcript: &[ChatMessage]) -> Vec<PromptMessage> {
        let conversational =
            transcript.iter().filter(|message| message.message_role != MessageRole::System).count();
        let mut skip = conversational.saturating_sub(self.window);

        transcript
            .iter()
            .filter(|message| {
                if message.message_role == MessageRole::System {
                    return true;
                }
                if skip > 0 {
                    skip -= 1;
                    return false;
                }
                true
            })
            .map(to_prompt)
            .collect()
    }
}

pub(crate) fn from_settings(settings: &Settings) -> Arc<dyn ContextBuilder> {
    match settings.tutoring().context_window {
        0 => Arc::new(FullHistory),
        window => Arc::new(RecentWindow::new(window)),
    }
}

fn to_prompt(message: &ChatMessage) -> PromptMessage {
    PromptMessage { role: message.message_role, content: message.message.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn transcript() -> Vec<ChatMessage> {
        let roles = [
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
        ];
        roles
            .iter()
            .enumerate()
            .map(|(index, role)| ChatMessage {
                id: format!("m-{index}"),
                chat_interaction_id: "ci".to_string(),
                message: format!("turn {index}"),
                message_role: *role,
                created_at: primitive_now_utc(),
                seq: index as i64,
            })
            .collect()
    }

    #[test]
    fn full_history_keeps_everything_in_order() {
        let context = FullHistory.build(&transcript());
        assert_eq!(context.len(), 6);
        assert_eq!(context[0].role, MessageRole::System);
        assert_eq!(context[5].content, "turn 5");
    }

    #[test]
    fn recent_window_keeps_system_and_tail() {
        let context = RecentWindow::new(2).build(&transcript());
        let contents = context.iter().map(|m| m.content.as_str()).collect::<Vec<_>>();
        assert_eq!(contents, vec!["turn 0", "turn 4", "turn 5"]);
    }

    #[test]
    fn window_larger_than_transcript_keeps_all() {
        assert_eq!(RecentWindow::new(50).build(&transcript()).len(), 6);
    }
}
