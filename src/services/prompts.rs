use std::fmt::Write as _;

use crate::db::models::{ChatMessage, UserQuestion};
use crate::db::types::MessageRole;

pub(crate) const REFINEMENT_SYSTEM_PROMPT: &str = "You are an AI assistant specialized in \
educational content analysis. Your task is to refine and evaluate questions. For each question: \
1) Clean up the text by removing redundant characters, extra whitespace, and fixing obvious \
grammatical issues while preserving the core meaning. 2) If the question includes multiple choice \
options, retain them and format them clearly as part of the question text. 3) Assess the \
complexity of the question and categorize it as EASY, MEDIUM, or HARD based on cognitive demand, \
subject matter depth, and required problem-solving skills. Every question carries an `id`; return \
each refined question with the same `id`, exactly once. Provide your output in the specified \
schema format.";

pub(crate) const TUTOR_SYSTEM_PROMPT: &str = "You are a patient, encouraging tutor helping a \
student revisit a quiz question they recently answered. Guide the student towards understanding \
with hints, leading questions and short explanations. Never reveal the correct answer, not even \
when asked directly or when the student claims to already know it; let the student arrive at it. \
Stay on the topic of this question and its underlying concepts and politely steer the \
conversation back when the student drifts. Keep replies concise.";

pub(crate) const EVALUATOR_SYSTEM_PROMPT: &str = "You are an experienced educator evaluating a \
tutoring session between a tutor and a student working through one quiz question. Judge only the \
student. Score each dimension with an integer from 1 (poor) to 5 (excellent): understanding of \
the question, problem-solving approach, application of knowledge, learning progress during the \
session, and accuracy of the final answer. Then write short, constructive feedback addressed to \
the student.";

pub(crate) const REPORT_SYSTEM_PROMPT: &str = "You are an experienced educator writing a final \
performance report for a student who completed tutoring sessions over several quiz questions. \
You receive one evaluation per question. Summarise overall performance with the same five \
integer scores from 1 to 5 (understanding, approach, knowledge application, learning progress, \
final accuracy) and a narrative highlighting strengths, recurring weaknesses and concrete next \
steps.";

pub(crate) fn refinement_user_prompt(items_json: &str) -> String {
    format!(
        "Clean up and improve the structure of the following questions while retaining their \
         core logic. Remove redundant characters, extra whitespace, fix any obvious grammatical \
         issues. If the question text includes multiple option texts, retain and format them as \
         part of the question text. Then, evaluate the complexity of each question and categorize \
         it as EASY, MEDIUM, or HARD.\n\nOriginal questions:\n{items_json}\n\nRespond with a list \
         of cleaned questions and respective complexities as per the provided schema."
    )
}

/// Opening student turn that frames the tutoring session. Leaves the correct answer out.
pub(crate) fn tutor_opening_prompt(question: &UserQuestion) -> String {
    let complexity = question.question_complexity.map(|value| value.as_str()).unwrap_or("UNKNOWN");
    let outcome = if question.is_correct { "correct" } else { "incorrect" };

    format!(
        "I want to go over a quiz question.\n\
         Question type: {}\n\
         Complexity: {complexity}\n\
         Time spent: {} seconds\n\
         Question: {}\n\
         My answer: {} (marked {outcome})\n\n\
         Help me understand this question without telling me the answer.",
        question.question_type.as_str(),
        question.question_duration,
        question.question_text,
        question.user_answer,
    )
}

/// Evaluation request for one question: its framing plus the replayed conversation.
pub(crate) fn question_evaluation_prompt(question: &UserQuestion, transcript: &[ChatMessage]) -> String {
    let mut prompt = format!(
        "Question ({}, {}): {}\nCorrect answer: {}\nStudent's original answer: {}\n\nTranscript:\n",
        question.question_type.as_str(),
        question.question_complexity.map(|value| value.as_str()).unwrap_or("UNKNOWN"),
        question.question_text,
        question.correct_answer,
        question.user_answer,
    );

    for message in transcript {
        let speaker = match message.message_role {
            MessageRole::System => continue,
            MessageRole::User => "STUDENT",
            MessageRole::Assistant => "TUTOR",
        };
        let _ = writeln!(prompt, "{speaker}: {}", message.message);
    }

    prompt
}

pub(crate) fn final_report_prompt(evaluations_json: &str) -> String {
    format!(
        "Per-question evaluations:\n{evaluations_json}\n\nWrite the final report as per the \
         provided schema."
    )
}
