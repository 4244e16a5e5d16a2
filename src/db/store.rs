//! Article store abstraction
//!
//! Handlers only talk to this trait. Both mutations must be applied by the
//! backend as single indivisible operations; no handler ever reads, modifies
//! and writes back a document.

use async_trait::async_trait;

use crate::db::schemas::{ArticleDoc, Comment};
use crate::types::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Look up an article by exact name
    async fn find_by_name(&self, name: &str) -> Result<Option<ArticleDoc>>;

    /// Atomically increment `upvotes` and add `uid` to `upvoteIds`.
    ///
    /// A no-op when the article is missing or `uid` already voted, so two
    /// racing calls for the same user record one vote. Returns whether a vote
    /// was recorded.
    async fn record_upvote(&self, name: &str, uid: &str) -> Result<bool>;

    /// Atomically append a comment. A no-op when the article is missing;
    /// returns whether a document was modified.
    async fn append_comment(&self, name: &str, comment: Comment) -> Result<bool>;
}
