//! MongoDB client and article collection

use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::{
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::db::schemas::{ArticleDoc, Comment};
use crate::db::ArticleStore;
use crate::types::{LecternError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping the database
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", redact_uri(uri));

        // Bound server selection so an unreachable MongoDB fails fast
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| LecternError::Database(format!("Invalid MongoDB URI: {}", e)))?;
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);
        options.connect_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::with_options(options)
            .map_err(|e| LecternError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| LecternError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Open the article collection and apply its indexes
    pub async fn articles(&self, collection: &str) -> Result<MongoArticleStore> {
        let inner = self
            .client
            .database(&self.db_name)
            .collection::<ArticleDoc>(collection);
        let store = MongoArticleStore { inner };

        // The collection is shared with other writers; missing indexes only cost speed
        if let Err(e) = store.apply_indexes().await {
            warn!("Could not apply article indexes: {}", e);
        }

        Ok(store)
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Article store backed by a MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoArticleStore {
    inner: Collection<ArticleDoc>,
}

impl MongoArticleStore {
    async fn apply_indexes(&self) -> Result<()> {
        let indices: Vec<IndexModel> = ArticleDoc::into_indices()
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        if indices.is_empty() {
            return Ok(());
        }

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| LecternError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MongoArticleStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<ArticleDoc>> {
        self.inner
            .find_one(doc! { "name": name })
            .await
            .map_err(|e| LecternError::Database(format!("Find failed: {}", e)))
    }

    async fn record_upvote(&self, name: &str, uid: &str) -> Result<bool> {
        let result = self
            .inner
            .update_one(upvote_filter(name, uid), upvote_update(uid))
            .await
            .map_err(|e| LecternError::Database(format!("Upvote failed: {}", e)))?;

        debug!(
            article = %name,
            matched = result.matched_count,
            modified = result.modified_count,
            "Upvote applied"
        );
        Ok(result.modified_count == 1)
    }

    async fn append_comment(&self, name: &str, comment: Comment) -> Result<bool> {
        // Plain update_one never upserts: commenting on a missing article writes nothing
        let result = self
            .inner
            .update_one(comment_filter(name), comment_update(&comment))
            .await
            .map_err(|e| LecternError::Database(format!("Comment failed: {}", e)))?;

        Ok(result.modified_count == 1)
    }
}

/// Matches the article only while `uid` has not voted, so the check and the
/// write are one operation
fn upvote_filter(name: &str, uid: &str) -> Document {
    doc! { "name": name, "upvoteIds": { "$ne": uid } }
}

fn upvote_update(uid: &str) -> Document {
    doc! {
        "$inc": { "upvotes": 1 },
        "$push": { "upvoteIds": uid },
    }
}

fn comment_filter(name: &str) -> Document {
    doc! { "name": name }
}

fn comment_update(comment: &Comment) -> Document {
    doc! {
        "$push": {
            "comments": {
                "postedBy": comment.posted_by.as_str(),
                "content": comment.content.as_str(),
            }
        }
    }
}

/// Strip credentials from a connection string before logging it
fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &uri[..scheme_end], &uri[at..])
        }
        _ => uri.to_string(),
    }
}
