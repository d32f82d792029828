//! Integration tests for the Gemini-backed gateway
//!
//! Exercises the wire format and error mapping against a mock server

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use aura_core::{AuraError, ChatMessage, Gateway, GeminiClient, GeminiGateway};

const CHAT_PATH: &str = "/models/chat-test:generateContent";
const IMAGE_PATH: &str = "/models/image-test:predict";

fn gateway(server: &MockServer) -> GeminiGateway {
    GeminiGateway::new(GeminiClient::new(&server.uri(), "test-key"), "chat-test", "image-test")
}

/// Wrap model output the way generateContent returns it
fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

async fn mount_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(text)))
        .mount(server)
        .await;
}

async fn last_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests.last().unwrap().body).unwrap()
}

fn plan_json(opportunities: usize) -> String {
    let opportunity = json!({
        "title": "子ども食堂の手伝い",
        "description": "週末の調理補助",
        "requiredSkills": ["料理"],
        "impactStatement": "子どもの居場所が増える",
        "actionType": "find_organizations",
        "actionParams": { "query": "子ども食堂" }
    });
    let step = json!({ "title": "調べる", "description": "活動を知る" });
    json!({
        "planTitle": "食で地域をつなぐ",
        "summary": "料理の力で子どもたちを支えます。",
        "suggestedOpportunities": vec![opportunity; opportunities],
        "firstSteps": vec![step; 3],
        "moodboardPrompt": "volunteers cooking together"
    })
    .to_string()
}

#[tokio::test]
async fn test_next_chat_step_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json", "temperature": 0.8 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
            r#"{"question":"誰のために？","options":["子どもたち","地域の人々","まだ決めていない"],"isFinal":false}"#,
        )))
        .mount(&server)
        .await;

    let transcript = vec![
        ChatMessage::user("私の情報です。"),
        ChatMessage::agent("どんなことに興味がありますか？"),
        ChatMessage::user("教育"),
    ];
    let step = gateway(&server).next_chat_step(&transcript).await.unwrap();
    assert_eq!(step.question, "誰のために？");
    assert!(!step.is_final);

    let body = last_body(&server).await;
    let roles: Vec<&str> = body["contents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["user", "model", "user"]);
    assert_eq!(body["contents"][2]["parts"][0]["text"], "教育");
    assert!(body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Aura"));
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
}

#[tokio::test]
async fn test_chat_step_with_two_options_is_rejected() {
    let server = MockServer::start().await;
    mount_text(&server, r#"{"question":"どうしますか？","options":["はい","いいえ"],"isFinal":false}"#).await;

    let result = gateway(&server).next_chat_step(&[ChatMessage::user("hi")]).await;
    assert_eq!(result, Err(AuraError::ChatStep));
}

#[tokio::test]
async fn test_server_error_maps_to_chat_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let result = gateway(&server).next_chat_step(&[ChatMessage::user("hi")]).await;
    assert_eq!(result, Err(AuraError::ChatStep));
}

#[tokio::test]
async fn test_plan_uses_flattened_transcript() {
    let server = MockServer::start().await;
    mount_text(&server, &plan_json(2)).await;

    let transcript = vec![ChatMessage::user("料理が得意です"), ChatMessage::agent("素敵ですね")];
    let draft = gateway(&server).generate_contribution_plan(&transcript).await.unwrap();
    assert_eq!(draft.plan_title, "食で地域をつなぐ");
    assert_eq!(draft.first_steps.len(), 3);

    let body = last_body(&server).await;
    assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("user: 料理が得意です\naura: 素敵ですね"));
}

#[tokio::test]
async fn test_plan_with_one_opportunity_is_rejected() {
    let server = MockServer::start().await;
    mount_text(&server, &plan_json(1)).await;

    let result = gateway(&server).generate_contribution_plan(&[ChatMessage::user("hi")]).await;
    assert_eq!(result, Err(AuraError::PlanGeneration));
}

#[tokio::test]
async fn test_images_become_data_uris() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .and(body_partial_json(json!({
            "parameters": { "sampleCount": 4, "aspectRatio": "1:1", "outputOptions": { "mimeType": "image/jpeg" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                { "bytesBase64Encoded": "AAA", "mimeType": "image/jpeg" },
                { "bytesBase64Encoded": "BBB" },
                { "bytesBase64Encoded": "CCC" },
                { "bytesBase64Encoded": "DDD" }
            ]
        })))
        .mount(&server)
        .await;

    let images = gateway(&server).generate_images_for_plan("people planting trees").await.unwrap();
    assert_eq!(images.len(), 4);
    assert_eq!(images[0], "data:image/jpeg;base64,AAA");
    assert_eq!(images[3], "data:image/jpeg;base64,DDD");

    let body = last_body(&server).await;
    assert!(body["instances"][0]["prompt"]
        .as_str()
        .unwrap()
        .ends_with("Theme: people planting trees"));
}

#[tokio::test]
async fn test_short_image_set_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{ "bytesBase64Encoded": "AAA" }]
        })))
        .mount(&server)
        .await;

    let result = gateway(&server).generate_images_for_plan("x").await;
    assert_eq!(result, Err(AuraError::ImageGeneration));
}

#[tokio::test]
async fn test_lookups_are_truncated() {
    let server = MockServer::start().await;
    let org = json!({ "name": "まちの会", "description": "清掃活動", "url": "https://example.org" });
    mount_text(&server, &json!(vec![org; 5]).to_string()).await;

    let orgs = gateway(&server).find_organizations("清掃").await.unwrap();
    assert_eq!(orgs.len(), 3);

    let body = last_body(&server).await;
    assert!(body.get("systemInstruction").is_none());
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
}

#[tokio::test]
async fn test_events_are_truncated_to_three() {
    let server = MockServer::start().await;
    let event = json!({ "name": "海岸清掃", "date": "2024-06-01", "url": "https://example.org/e" });
    mount_text(&server, &json!(vec![event; 5]).to_string()).await;

    let events = gateway(&server).find_events("清掃").await.unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].name, "海岸清掃");
}

#[tokio::test]
async fn test_topic_keywords_are_truncated_to_five() {
    let server = MockServer::start().await;
    let keywords: Vec<String> = (1..=7).map(|i| format!("キーワード{i}")).collect();
    mount_text(&server, &json!({ "summary": "専門スキルを活かす活動です。", "keywords": keywords }).to_string()).await;

    let summary = gateway(&server).learn_more_about_topic("プロボノ").await.unwrap();
    assert_eq!(summary.summary, "専門スキルを活かす活動です。");
    assert_eq!(summary.keywords, keywords[..5].to_vec());
}

#[tokio::test]
async fn test_project_steps_are_truncated_to_five() {
    let server = MockServer::start().await;
    let steps: Vec<String> = (1..=7).map(|i| format!("ステップ{i}")).collect();
    mount_text(&server, &json!({ "title": "絵本の読み聞かせ会", "steps": steps }).to_string()).await;

    let plan = gateway(&server).draft_project_plan("読み聞かせ").await.unwrap();
    assert_eq!(plan.title, "絵本の読み聞かせ会");
    assert_eq!(plan.steps, steps[..5].to_vec());
}

#[tokio::test]
async fn test_contact_email_is_free_text() {
    let server = MockServer::start().await;
    mount_text(&server, "件名：参加のお問い合わせ\n\nはじめまして。").await;

    let text = gateway(&server)
        .generate_contact_email("私の情報です。", "まちづくりNPO")
        .await
        .unwrap();
    assert!(text.starts_with("件名："));

    let body = last_body(&server).await;
    assert_eq!(body["generationConfig"]["temperature"], 0.7);
    assert!(body["generationConfig"].get("responseSchema").is_none());
}

#[tokio::test]
async fn test_malformed_lookup_maps_to_its_error() {
    let server = MockServer::start().await;
    mount_text(&server, "not json at all").await;

    let gateway = gateway(&server);
    assert_eq!(gateway.find_events("清掃").await, Err(AuraError::EventLookup));
    assert_eq!(gateway.learn_more_about_topic("プロボノ").await, Err(AuraError::TopicLookup));
    assert_eq!(gateway.draft_project_plan("読み聞かせ").await, Err(AuraError::ProjectPlan));
}
