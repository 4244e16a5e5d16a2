//! HTTP routes for Lectern

pub mod articles;

use axum::{extract::OriginalUri, http::StatusCode, response::IntoResponse};

pub use articles::{comment_on_article, get_article, upvote_article, ArticleResponse};

/// Unknown `/api` paths never fall through to the front end
pub async fn api_not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, format!("Cannot {}", uri.path()))
}
