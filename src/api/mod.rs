pub(crate) mod assessments;
pub(crate) mod chat;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod questions;
pub(crate) mod router;
pub(crate) mod speech;
pub(crate) mod validation;
