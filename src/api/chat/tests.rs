use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::ChatInteraction;
use crate::db::types::MessageRole;
use crate::repositories;
use crate::services::tutoring;
use crate::test_support;

async fn insert_interaction(ctx: &test_support::TestContext, question_id: &str) -> ChatInteraction {
    repositories::chat_interactions::create(
        ctx.state.db(),
        repositories::chat_interactions::CreateChatInteraction {
            id: &Uuid::new_v4().to_string(),
            user_id: "user-1",
            course_id: "course-1",
            activity_id: Some("act-1"),
            activity_name: None,
            question_id,
            now: primitive_now_utc(),
        },
    )
    .await
    .expect("insert interaction")
}

async fn insert_message(
    ctx: &test_support::TestContext,
    interaction_id: &str,
    role: MessageRole,
    text: &str,
) {
    repositories::chat_messages::create(
        ctx.state.db(),
        repositories::chat_messages::CreateChatMessage {
            id: &Uuid::new_v4().to_string(),
            chat_interaction_id: interaction_id,
            message: text,
            message_role: role,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert message");
}

#[tokio::test]
async fn creating_interaction_seeds_and_answers_once() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;
    ctx.language_model.push_reply("What do you already know about plants?");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/chat", question.id),
            None,
            Some(json!({"activity_name": "Week 3 quiz"})),
        ))
        .await
        .expect("create interaction");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["state"], "ACTIVE");
    assert_eq!(created["activity_name"], "Week 3 quiz");
    let roles = created["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .map(|message| message["message_role"].as_str().expect("role").to_string())
        .collect::<Vec<_>>();
    assert_eq!(roles, vec!["SYSTEM", "USER", "ASSISTANT"]);
    assert_eq!(created["messages"][2]["message"], "What do you already know about plants?");

    let requests = ctx.language_model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 2);
    assert!(requests[0].messages[1].content.contains("Which gas do plants absorb?"));
    assert!(!requests[0].messages[1].content.contains("CO2"));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/chat", question.id),
            None,
            None,
        ))
        .await
        .expect("create interaction again");

    assert_eq!(response.status(), StatusCode::OK);
    let again = test_support::read_json(response).await;
    assert_eq!(again["id"], created["id"]);
    assert_eq!(again["messages"].as_array().expect("messages").len(), 3);
    assert_eq!(ctx.language_model.requests().len(), 1);
}

#[tokio::test]
async fn existing_empty_interaction_is_initialized() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;
    let interaction = insert_interaction(&ctx, &question.id).await;
    ctx.language_model.push_reply("Let's start.");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/chat", question.id),
            None,
            None,
        ))
        .await
        .expect("create interaction");

    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["id"], interaction.id.as_str());
    assert_eq!(body["messages"].as_array().expect("messages").len(), 3);
}

#[tokio::test]
async fn study_complete_question_cannot_open_chat() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", true).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/chat", question.id),
            None,
            None,
        ))
        .await
        .expect("create interaction");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/questions/missing/chat",
            None,
            None,
        ))
        .await
        .expect("create interaction for missing question");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posting_message_appends_user_and_assistant_turns() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;
    let interaction = insert_interaction(&ctx, &question.id).await;
    insert_message(&ctx, &interaction.id, MessageRole::System, "You are a tutor.").await;
    insert_message(&ctx, &interaction.id, MessageRole::User, "Help me with this question.").await;
    ctx.language_model.push_reply("Which gas do animals exhale?");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/chat/{}/messages", interaction.id),
            None,
            Some(json!({"message": "Is it oxygen?"})),
        ))
        .await
        .expect("post message");

    let status = response.status();
    let exchange = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {exchange}");
    assert_eq!(exchange["user"]["message"], "Is it oxygen?");
    assert_eq!(exchange["assistant"]["message_role"], "ASSISTANT");

    let requests = ctx.language_model.requests();
    assert_eq!(requests[0].messages.len(), 3);
    assert_eq!(requests[0].messages[2].content, "Is it oxygen?");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/chat/{}/messages", interaction.id),
            None,
            None,
        ))
        .await
        .expect("list messages");

    assert_eq!(response.status(), StatusCode::OK);
    let messages = test_support::read_json(response).await;
    let messages = messages.as_array().expect("messages");
    assert_eq!(messages.len(), 4);
    let timestamps =
        messages.iter().map(|m| m["created_at"].as_str().expect("ts").to_string()).collect::<Vec<_>>();
    assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(messages[2]["message"], "Is it oxygen?");
    assert_eq!(messages[3]["message"], "Which gas do animals exhale?");
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;
    let interaction = insert_interaction(&ctx, &question.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/chat/{}/messages", interaction.id),
            None,
            Some(json!({"message": ""})),
        ))
        .await
        .expect("post message");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.language_model.requests().is_empty());
}

#[tokio::test]
async fn unknown_interaction_is_not_found() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/chat/missing/messages", None, None))
        .await
        .expect("list messages");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/chat/missing/messages",
            None,
            Some(json!({"message": "hello"})),
        ))
        .await
        .expect("post message");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mark_complete_sets_study_flag() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/complete", question.id),
            None,
            None,
        ))
        .await
        .expect("mark complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["is_study_complete"], true);
    assert!(body.get("correct_answer").is_none());

    let stored = repositories::user_questions::find_by_id(ctx.state.db(), &question.id)
        .await
        .expect("find question")
        .expect("question exists");
    assert!(stored.is_study_complete);
}

#[tokio::test]
async fn retry_after_failed_opening_reply_completes_transcript() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/chat", question.id),
            None,
            None,
        ))
        .await
        .expect("create interaction");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    ctx.language_model.push_reply("Let's begin with what a plant needs.");
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/chat", question.id),
            None,
            None,
        ))
        .await
        .expect("retry interaction");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    let roles = body["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .map(|message| message["message_role"].as_str().expect("role").to_string())
        .collect::<Vec<_>>();
    assert_eq!(roles, vec!["SYSTEM", "USER", "ASSISTANT"]);

    let requests = ctx.language_model.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages.len(), 2);
}

#[tokio::test]
async fn concurrent_creates_share_one_interaction() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;
    ctx.language_model.push_reply("First opening.");
    ctx.language_model.push_reply("Second opening.");

    let (first, second) = tokio::join!(
        tutoring::create_interaction(&ctx.state, &question.id, None),
        tutoring::create_interaction(&ctx.state, &question.id, None),
    );
    let first = first.expect("first create").into_inner();
    let second = second.expect("second create").into_inner();

    assert_eq!(first.interaction.id, second.interaction.id);
    assert!(first.messages.iter().any(|message| message.message_role == MessageRole::Assistant));
    assert!(second.messages.iter().any(|message| message.message_role == MessageRole::Assistant));
}

#[tokio::test]
async fn malformed_interaction_body_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let question = test_support::insert_question(ctx.state.db(), None, "act-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/questions/{}/chat", question.id),
            None,
            Some(json!({"activity_name": 42})),
        ))
        .await
        .expect("create interaction");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.language_model.requests().is_empty());
    assert!(repositories::chat_interactions::find_by_question(ctx.state.db(), &question.id)
        .await
        .expect("find interaction")
        .is_none());
}
