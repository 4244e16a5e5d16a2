//! Article endpoints
//!
//! - `GET  /api/article/:name`          read, with a per-requester `canUpvote`
//! - `PUT  /api/article/:name/upvote`   one vote per user, ever
//! - `POST /api/article/:name/comment`  append `{postedBy, content}`
//!
//! Each handler is a straight sequence of store calls: load, decide, mutate,
//! re-read. The mutating routes answer a missing article with 200 and a text
//! message rather than 404; the front end renders that text as-is.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::Requester;
use crate::db::{ArticleDoc, Comment};
use crate::server::AppState;
use crate::types::{LecternError, Result};

const STORE: &str = "article store";

/// Article as returned to clients: the stored document plus `canUpvote`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub name: String,
    pub upvotes: i64,
    pub upvote_ids: Vec<String>,
    pub comments: Vec<Comment>,
    /// Only present on the read route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_upvote: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<ArticleDoc> for ArticleResponse {
    fn from(article: ArticleDoc) -> Self {
        Self {
            id: article.id.map(id_to_json),
            name: article.name,
            upvotes: article.upvotes,
            upvote_ids: article.upvote_ids,
            comments: article.comments,
            can_upvote: None,
            extra: document_to_json(article.extra),
        }
    }
}

/// ObjectIds go out as plain hex strings, everything else as relaxed extended JSON
fn id_to_json(id: Bson) -> Value {
    match id {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}

fn document_to_json(document: Document) -> Map<String, Value> {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Body of a comment request
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// The 200 answer the mutating routes give for an unknown article
pub fn missing_article_message(name: &str) -> String {
    format!("{} article doesn't exist ☹", name)
}

fn missing_article(name: &str) -> Response {
    (StatusCode::OK, missing_article_message(name)).into_response()
}

/// GET /api/article/:name
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    requester: Requester,
) -> Result<Json<ArticleResponse>> {
    let article = state
        .bounded(STORE, state.articles.find_by_name(&name))
        .await?
        .ok_or_else(|| LecternError::NotFound(name.clone()))?;

    let can_upvote = article.can_upvote(requester.uid());

    Ok(Json(ArticleResponse {
        can_upvote: Some(can_upvote),
        ..ArticleResponse::from(article)
    }))
}

/// PUT /api/article/:name/upvote
pub async fn upvote_article(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    requester: Requester,
) -> Result<Response> {
    let Some(article) = state
        .bounded(STORE, state.articles.find_by_name(&name))
        .await?
    else {
        return Ok(missing_article(&name));
    };

    if let Some(uid) = requester.uid() {
        if article.can_upvote(Some(uid)) {
            let recorded = state
                .bounded(STORE, state.articles.record_upvote(&name, uid))
                .await?;

            if recorded {
                info!(article = %name, %uid, "Recorded upvote");
            } else {
                debug!(article = %name, %uid, "Concurrent upvote already recorded");
            }
        }
    }

    reread(&state, &name).await
}

/// POST /api/article/:name/comment
pub async fn comment_on_article(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    requester: Requester,
    Json(body): Json<CommentRequest>,
) -> Result<Response> {
    let posted_by = requester
        .identity()
        .map(|identity| identity.email.clone())
        .unwrap_or_default();

    let comment = Comment {
        posted_by,
        content: body.content,
    };

    if state
        .bounded(STORE, state.articles.append_comment(&name, comment))
        .await?
    {
        info!(article = %name, "Added comment");
    }

    reread(&state, &name).await
}

/// Load the article after a mutation and return it in full
async fn reread(state: &AppState, name: &str) -> Result<Response> {
    let article = state
        .bounded(STORE, state.articles.find_by_name(name))
        .await?;

    Ok(match article {
        Some(article) => Json(ArticleResponse::from(article)).into_response(),
        None => missing_article(name),
    })
}
