use crate::app_router;
use crate::config::{PosthookConfig, RelevanceMode};
use crate::services::cache::{POST_DETAIL_PATH, POSTS_LISTING_PATH};
use crate::services::webhook::compute_signature;
use crate::tests::integration_post_cache::{seeded_source, test_config, test_state};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

const SECRET: &str = "hook-secret";

fn webhook_request(body: &str, signature: Option<&str>, event: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhook/github")
        .header("content-type", "application/json")
        .header("x-github-event", event);

    if let Some(signature) = signature {
        builder = builder.header("x-hub-signature-256", signature);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(config: PosthookConfig, request: Request<Body>) -> (StatusCode, serde_json::Value, Vec<String>) {
    let (state, platform) = test_state(seeded_source(), config);

    let response = app_router(state).oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap(), platform.invalidated())
}

// a signed push touching a post revalidates and reports the commit count
#[tokio::test]
async fn test_signed_push_revalidates() {
    let body = r#"{"commits":[{"added":[],"modified":["posts/a.md"],"removed":[]}]}"#;
    let signature = compute_signature(SECRET, body.as_bytes()).unwrap();

    let (status, json, invalidated) =
        send(test_config(), webhook_request(body, Some(&signature), "push")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["revalidated"], true);
    assert_eq!(json["commits"], 1);
    assert!(json["timestamp"].is_string());
    assert_eq!(invalidated, vec![POSTS_LISTING_PATH, POST_DETAIL_PATH]);
}

// with the default relevance mode even an empty push invalidates
#[tokio::test]
async fn test_empty_push_still_revalidates_by_default() {
    let body = r#"{"commits":[]}"#;
    let signature = compute_signature(SECRET, body.as_bytes()).unwrap();

    let (status, json, invalidated) =
        send(test_config(), webhook_request(body, Some(&signature), "push")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["revalidated"], true);
    assert_eq!(json["commits"], 0);
    assert_eq!(invalidated.len(), 2);
}

#[tokio::test]
async fn test_content_mode_ignores_unrelated_push() {
    let mut config = test_config();
    config.relevance = RelevanceMode::ContentChanges;
    let body = r#"{"commits":[{"modified":["README.md"]},{"added":["src/app.ts"]}]}"#;
    let signature = compute_signature(SECRET, body.as_bytes()).unwrap();

    let (status, json, invalidated) =
        send(config, webhook_request(body, Some(&signature), "push")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Webhook received but no blog changes detected");
    assert!(json.get("revalidated").is_none());
    assert!(invalidated.is_empty());
}

#[tokio::test]
async fn test_content_mode_accepts_removed_post() {
    let mut config = test_config();
    config.relevance = RelevanceMode::ContentChanges;
    let body = r#"{"commits":[{"modified":["README.md"]},{"removed":["posts/old.md"]}]}"#;
    let signature = compute_signature(SECRET, body.as_bytes()).unwrap();

    let (status, json, _) = send(config, webhook_request(body, Some(&signature), "push")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["commits"], 2);
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let body = r#"{"commits":[{"modified":["posts/a.md"]}]}"#;
    let wrong = compute_signature("not-the-secret", body.as_bytes()).unwrap();

    let (status, json, invalidated) =
        send(test_config(), webhook_request(body, Some(&wrong), "push")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid signature");
    assert!(invalidated.is_empty());
}

// the signature is over the exact bytes, so a re-ordered body doesn't verify
#[tokio::test]
async fn test_signature_for_other_body_rejected() {
    let signed = r#"{"commits":[],"action":"x"}"#;
    let sent = r#"{"action":"x","commits":[]}"#;
    let signature = compute_signature(SECRET, signed.as_bytes()).unwrap();

    let (status, _, _) = send(test_config(), webhook_request(sent, Some(&signature), "push")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// without the header the check is skipped unless the strict policy is on
#[tokio::test]
async fn test_missing_signature_policy() {
    let body = r#"{"commits":[{"modified":["posts/a.md"]}]}"#;

    let (status, _, invalidated) = send(test_config(), webhook_request(body, None, "push")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invalidated.len(), 2);

    let mut strict = test_config();
    strict.require_signature = true;
    let (status, json, invalidated) = send(strict, webhook_request(body, None, "push")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid signature");
    assert!(invalidated.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_fails() {
    let body = r#"{"commits": [ oops"#;
    let signature = compute_signature(SECRET, body.as_bytes()).unwrap();

    let (status, json, invalidated) =
        send(test_config(), webhook_request(body, Some(&signature), "push")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Webhook processing failed");
    assert!(invalidated.is_empty());
}

#[tokio::test]
async fn test_ping_answers_without_invalidating() {
    let body = r#"{"zen":"Keep it logically awesome.","hook_id":1}"#;
    let signature = compute_signature(SECRET, body.as_bytes()).unwrap();

    let (status, json, invalidated) =
        send(test_config(), webhook_request(body, Some(&signature), "ping")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "pong");
    assert!(invalidated.is_empty());
}

#[tokio::test]
async fn test_invalidation_failure_is_500() {
    let body = r#"{"commits":[{"modified":["posts/a.md"]}]}"#;
    let signature = compute_signature(SECRET, body.as_bytes()).unwrap();
    let (state, platform) = test_state(seeded_source(), test_config());
    platform.fail.store(true, Ordering::SeqCst);

    let response = app_router(state)
        .oneshot(webhook_request(body, Some(&signature), "push"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// a disabled webhook isn't routed at all
#[tokio::test]
async fn test_disabled_webhook_not_mounted() {
    let mut config = test_config();
    config.webhook_enabled = false;
    config.webhook_secret = None;
    let (state, _) = test_state(seeded_source(), config);

    let response = app_router(state)
        .oneshot(webhook_request("{}", None, "push"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
