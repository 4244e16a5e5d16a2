//! Article document schema
//!
//! Articles are created out of band; Lectern only reads them and mutates
//! `upvotes`, `upvoteIds` and `comments`.

use bson::{doc, Bson, Document};
use mongodb::options::IndexOptions;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for articles
pub const ARTICLE_COLLECTION: &str = "articles";

/// A comment left on an article
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Email of the poster
    pub posted_by: String,
    pub content: String,
}

/// Article document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDoc {
    /// MongoDB document ID, usually an ObjectId but not necessarily
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,

    /// Unique article key (URL slug)
    pub name: String,

    /// Always equal to the number of entries in `upvote_ids`
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub upvotes: i64,

    /// Users who have upvoted, no duplicates
    #[serde(default)]
    pub upvote_ids: Vec<String>,

    /// Append-only, insertion order
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Any other stored fields, returned to clients untouched
    #[serde(flatten)]
    pub extra: Document,
}

/// Accept any numeric BSON counter; the mongo shell writes Doubles
fn deserialize_counter<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Bson::deserialize(deserializer)? {
        Bson::Int32(n) => Ok(i64::from(n)),
        Bson::Int64(n) => Ok(n),
        Bson::Double(f) if f.is_finite() => Ok(f as i64),
        Bson::Null => Ok(0),
        other => Err(D::Error::custom(format!("invalid upvote counter {}", other))),
    }
}

impl ArticleDoc {
    /// Create an article with no votes or comments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether `uid` may upvote this article.
    ///
    /// Anonymous requesters (`None` or an empty uid) never may.
    pub fn can_upvote(&self, uid: Option<&str>) -> bool {
        match uid {
            Some(uid) if !uid.is_empty() => !self.upvote_ids.iter().any(|id| id == uid),
            _ => false,
        }
    }
}

impl IntoIndexes for ArticleDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Point lookups by name on every request. Not unique: the
            // collection is owned elsewhere and may predate us.
            (
                doc! { "name": 1 },
                Some(
                    IndexOptions::builder()
                        .name("name_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
