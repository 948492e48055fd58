use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "questioncomplexity", rename_all = "lowercase")]
pub(crate) enum QuestionComplexity {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    MultipleChoice,
    MultipleAnswer,
    ShortAnswer,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "messagerole", rename_all = "lowercase")]
pub(crate) enum MessageRole {
    System,
    User,
    Assistant,
}

impl QuestionComplexity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

impl QuestionType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "MULTIPLE_CHOICE",
            Self::MultipleAnswer => "MULTIPLE_ANSWER",
            Self::ShortAnswer => "SHORT_ANSWER",
            Self::Numeric => "NUMERIC",
        }
    }

    /// Maps the provider's `answerType` label. Unknown labels yield `None`.
    pub(crate) fn from_provider(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "MULTIPLE_CHOICE" | "SINGLE" | "SINGLE_CHOICE" => Some(Self::MultipleChoice),
            "MULTIPLE_ANSWER" | "MULTIPLE" => Some(Self::MultipleAnswer),
            "SHORT_ANSWER" | "SHORT" | "TEXT" => Some(Self::ShortAnswer),
            "NUMERIC" | "NUMBER" => Some(Self::Numeric),
            _ => None,
        }
    }
}

impl MessageRole {
    /// Role name in the chat-completions wire format.
    pub(crate) fn as_wire(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}
