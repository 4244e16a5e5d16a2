//! In-process article store for dev mode and tests
//!
//! Every mutation runs under the map's write lock, which gives the same
//! single-operation guarantees the MongoDB store gets from update operators.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

use crate::db::schemas::{ArticleDoc, Comment};
use crate::db::ArticleStore;
use crate::types::Result;

/// Article store held in memory, keyed by article name
#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    articles: RwLock<HashMap<String, ArticleDoc>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with articles. Later duplicates of a name win.
    pub fn with_articles(articles: impl IntoIterator<Item = ArticleDoc>) -> Self {
        let articles = articles
            .into_iter()
            .map(|article| (article.name.clone(), article))
            .collect();

        Self {
            articles: RwLock::new(articles),
        }
    }

    /// Load a JSON array of articles
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let articles: Vec<ArticleDoc> = serde_json::from_str(&content)?;
        info!("Seeded {} article(s) from {}", articles.len(), path.display());
        Ok(Self::with_articles(articles))
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.articles.read().await.is_empty()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<ArticleDoc>> {
        Ok(self.articles.read().await.get(name).cloned())
    }

    async fn record_upvote(&self, name: &str, uid: &str) -> Result<bool> {
        let mut articles = self.articles.write().await;

        match articles.get_mut(name) {
            Some(article) if !article.upvote_ids.iter().any(|id| id == uid) => {
                article.upvotes += 1;
                article.upvote_ids.push(uid.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_comment(&self, name: &str, comment: Comment) -> Result<bool> {
        let mut articles = self.articles.write().await;

        match articles.get_mut(name) {
            Some(article) => {
                article.comments.push(comment);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
