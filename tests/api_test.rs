//! Article API integration tests
//!
//! Drives the full router (identity middleware, gate, handlers, static
//! fallback) against the in-memory store and shared-secret tokens:
//! - Reading articles with a per-requester `canUpvote`
//! - One upvote per user, including under concurrent requests
//! - Comments in insertion order, attributed by email
//! - Auth failures, timeouts, and unknown paths

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use lectern::{
    auth::{Identity, IdentityVerifier, JwtVerifier, AUTH_TOKEN_HEADER},
    create_router,
    db::{ArticleDoc, ArticleStore, Comment, MemoryArticleStore},
    AppState, LecternError,
};

const SECRET: &str = "integration-test-secret-at-least-32-chars";

fn verifier() -> JwtVerifier {
    JwtVerifier::new(SECRET.to_string(), 3600).unwrap()
}

fn token(uid: &str, email: &str) -> String {
    verifier().generate_token(uid, email).unwrap()
}

fn seeded_articles() -> Vec<ArticleDoc> {
    let mut learn_react = ArticleDoc::new("learn-react");
    learn_react.upvotes = 1;
    learn_react.upvote_ids.push("u1".into());
    learn_react.comments.push(Comment {
        posted_by: "amy@example.com".into(),
        content: "Nice intro".into(),
    });

    vec![learn_react, ArticleDoc::new("learn-node")]
}

fn app_with(articles: Arc<dyn ArticleStore>) -> Router {
    create_router(Arc::new(AppState::new(articles, Arc::new(verifier()))))
}

fn app() -> Router {
    app_with(Arc::new(MemoryArticleStore::with_articles(seeded_articles())))
}

fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTH_TOKEN_HEADER, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn comment_request(uri: &str, token: Option<&str>, content: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTH_TOKEN_HEADER, token);
    }
    builder
        .body(Body::from(serde_json::json!({ "content": content }).to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

// =============================================================================
// GET /api/article/:name
// =============================================================================

#[tokio::test]
async fn test_get_article_for_new_voter() {
    let app = app();
    let u2 = token("u2", "bob@example.com");

    let (status, json) = send_json(&app, request("GET", "/api/article/learn-react", Some(&u2))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "learn-react");
    assert_eq!(json["upvotes"], 1);
    assert_eq!(json["upvoteIds"], serde_json::json!(["u1"]));
    assert_eq!(json["comments"][0]["postedBy"], "amy@example.com");
    assert_eq!(json["canUpvote"], true);
}

#[tokio::test]
async fn test_get_article_for_existing_voter() {
    let app = app();
    let u1 = token("u1", "amy@example.com");

    let (status, json) = send_json(&app, request("GET", "/api/article/learn-react", Some(&u1))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["canUpvote"], false);
}

#[tokio::test]
async fn test_get_article_anonymous_cannot_upvote() {
    let app = app();

    let (status, json) = send_json(&app, request("GET", "/api/article/learn-node", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upvotes"], 0);
    assert_eq!(json["canUpvote"], false);
}

#[tokio::test]
async fn test_get_missing_article() {
    let app = app();

    let (status, body) = send(&app, request("GET", "/api/article/nope", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "No Article Found");
}

// =============================================================================
// PUT /api/article/:name/upvote
// =============================================================================

#[tokio::test]
async fn test_upvote_records_once() {
    let app = app();
    let u2 = token("u2", "bob@example.com");

    let (status, json) = send_json(&app, request("PUT", "/api/article/learn-react/upvote", Some(&u2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upvotes"], 2);
    assert_eq!(json["upvoteIds"], serde_json::json!(["u1", "u2"]));
    assert!(json.get("canUpvote").is_none());

    // A second vote from the same user changes nothing
    let (status, json) = send_json(&app, request("PUT", "/api/article/learn-react/upvote", Some(&u2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upvotes"], 2);
    assert_eq!(json["upvoteIds"], serde_json::json!(["u1", "u2"]));

    // The voter can no longer upvote; someone who has not voted still can
    let (status, json) = send_json(&app, request("GET", "/api/article/learn-react", Some(&u2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["canUpvote"], false);

    let u3 = token("u3", "cat@example.com");
    let (_, json) = send_json(&app, request("GET", "/api/article/learn-react", Some(&u3))).await;
    assert_eq!(json["canUpvote"], true);
}

#[tokio::test]
async fn test_upvote_missing_article() {
    let app = app();
    let u2 = token("u2", "bob@example.com");

    let (status, body) = send(&app, request("PUT", "/api/article/nope/upvote", Some(&u2))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "nope article doesn't exist ☹");
}

#[tokio::test]
async fn test_concurrent_upvotes_from_distinct_users() {
    let store = Arc::new(MemoryArticleStore::with_articles(seeded_articles()));
    let app = app_with(store.clone());

    let mut handles = Vec::new();
    for i in 0..20 {
        let app = app.clone();
        let token = token(&format!("voter-{i}"), &format!("voter-{i}@example.com"));
        handles.push(tokio::spawn(async move {
            send(&app, request("PUT", "/api/article/learn-node/upvote", Some(&token))).await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let article = store.find_by_name("learn-node").await.unwrap().unwrap();
    assert_eq!(article.upvotes, 20);
    assert_eq!(article.upvote_ids.len(), 20);
}

#[tokio::test]
async fn test_concurrent_upvotes_from_same_user() {
    let store = Arc::new(MemoryArticleStore::with_articles(seeded_articles()));
    let app = app_with(store.clone());
    let u2 = token("u2", "bob@example.com");

    let mut handles = Vec::new();
    for _ in 0..10 {
        let app = app.clone();
        let u2 = u2.clone();
        handles.push(tokio::spawn(async move {
            send(&app, request("PUT", "/api/article/learn-node/upvote", Some(&u2))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let article = store.find_by_name("learn-node").await.unwrap().unwrap();
    assert_eq!(article.upvotes, 1);
    assert_eq!(article.upvote_ids, vec!["u2".to_string()]);
}

// =============================================================================
// POST /api/article/:name/comment
// =============================================================================

#[tokio::test]
async fn test_comments_keep_order_and_author() {
    let app = app();
    let bob = token("u2", "bob@example.com");
    let cat = token("u3", "cat@example.com");

    send(&app, comment_request("/api/article/learn-react/comment", Some(&bob), "First")).await;
    let (status, json) =
        send_json(&app, comment_request("/api/article/learn-react/comment", Some(&cat), "Second")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["comments"],
        serde_json::json!([
            { "postedBy": "amy@example.com", "content": "Nice intro" },
            { "postedBy": "bob@example.com", "content": "First" },
            { "postedBy": "cat@example.com", "content": "Second" },
        ])
    );
}

#[tokio::test]
async fn test_comment_on_missing_article() {
    let store = Arc::new(MemoryArticleStore::with_articles(seeded_articles()));
    let app = app_with(store.clone());
    let bob = token("u2", "bob@example.com");

    let (status, body) = send(&app, comment_request("/api/article/missing-article/comment", Some(&bob), "Hello")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "missing-article article doesn't exist ☹");
    // No document is created as a side effect
    assert!(store.find_by_name("missing-article").await.unwrap().is_none());
    assert_eq!(store.len().await, 2);
}

// =============================================================================
// Identity failures
// =============================================================================

#[tokio::test]
async fn test_mutations_require_identity() {
    let app = app();

    let (status, body) = send(&app, request("PUT", "/api/article/learn-react/upvote", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "\"Not Allowed\"");

    let (status, body) = send(&app, comment_request("/api/article/learn-react/comment", None, "Hi")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "\"Not Allowed\"");
}

#[tokio::test]
async fn test_invalid_token_is_bad_request() {
    let app = app();

    for (method, uri) in [
        ("GET", "/api/article/learn-react"),
        ("PUT", "/api/article/learn-react/upvote"),
    ] {
        let (status, body) = send(&app, request(method, uri, Some("not-a-token"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let app = app();
    let other = JwtVerifier::new("a-completely-different-secret-of-32-chars".into(), 3600)
        .unwrap()
        .generate_token("u2", "bob@example.com")
        .unwrap();

    let (status, _) = send(&app, request("GET", "/api/article/learn-react", Some(&other))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Timeouts
// =============================================================================

/// Store whose every call takes longer than any sane request timeout
struct SlowStore;

#[async_trait]
impl ArticleStore for SlowStore {
    async fn find_by_name(&self, _name: &str) -> lectern::Result<Option<ArticleDoc>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn record_upvote(&self, _name: &str, _uid: &str) -> lectern::Result<bool> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(false)
    }

    async fn append_comment(&self, _name: &str, _comment: Comment) -> lectern::Result<bool> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(false)
    }
}

/// Verifier that never answers in time
struct SlowVerifier;

#[async_trait]
impl IdentityVerifier for SlowVerifier {
    async fn verify(&self, _token: &str) -> lectern::Result<Identity> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(LecternError::Verifier("unreachable".into()))
    }
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let state = AppState::new(Arc::new(SlowStore), Arc::new(verifier()))
        .with_request_timeout(Duration::from_millis(50));
    let app = create_router(Arc::new(state));

    let (status, _) = send(&app, request("GET", "/api/article/learn-react", None)).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_slow_verifier_times_out() {
    let state = AppState::new(
        Arc::new(MemoryArticleStore::with_articles(seeded_articles())),
        Arc::new(SlowVerifier),
    )
    .with_request_timeout(Duration::from_millis(50));
    let app = create_router(Arc::new(state));

    let (status, _) = send(&app, request("GET", "/api/article/learn-react", Some("any-token"))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

// =============================================================================
// Routing outside the article API
// =============================================================================

#[tokio::test]
async fn test_unknown_api_path_is_not_found() {
    let app = app();

    let (status, body) = send(&app, request("GET", "/api/articles", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Cannot /api/articles");
}

#[tokio::test]
async fn test_front_end_files_and_fallback() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>blog</html>").unwrap();
    std::fs::create_dir(dir.path().join("static")).unwrap();
    std::fs::write(dir.path().join("static").join("app.js"), "console.log('hi')").unwrap();

    let state = AppState::new(
        Arc::new(MemoryArticleStore::with_articles(seeded_articles())),
        Arc::new(verifier()),
    )
    .with_static_dir(dir.path());
    let app = create_router(Arc::new(state));

    let (status, body) = send(&app, request("GET", "/static/app.js", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "console.log('hi')");

    // Client-side routes get the app shell
    let (status, body) = send(&app, request("GET", "/articles/learn-react", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<html>blog</html>");

    let (status, body) = send(&app, request("GET", "/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<html>blog</html>");
}
