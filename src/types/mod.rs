//! Shared types for Lectern

mod error;

pub use error::{LecternError, Result, NOT_ALLOWED, NO_ARTICLE_FOUND};
