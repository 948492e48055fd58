use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SpeechRequest {
    #[validate(length(min = 1, max = 5000, message = "text must contain 1..5000 characters"))]
    pub(crate) text: String,
}
