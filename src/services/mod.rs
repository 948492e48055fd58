pub(crate) mod assessments;
pub(crate) mod chat_context;
pub(crate) mod course_provider;
pub(crate) mod errors;
pub(crate) mod evaluation;
pub(crate) mod language_model;
pub(crate) mod prompts;
pub(crate) mod question_extraction;
pub(crate) mod question_refinement;
pub(crate) mod speech;
pub(crate) mod tutoring;
