//! Database schemas for Lectern

mod article;

pub use article::{ArticleDoc, Comment, ARTICLE_COLLECTION};
