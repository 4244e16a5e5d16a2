//! Lectern - article backend for a single-page blog
//!
//! Lectern serves the built front end and a small article API:
//! reading an article, upvoting it once per user, and commenting on it.
//! Callers identify themselves with an `authtoken` header holding a
//! Firebase ID token; reads work anonymously, mutations do not.
//!
//! ## Request pipeline
//!
//! ```text
//! request ─┬─ /api/* ── resolve_identity ─┬─ GET  article ───────────────┐
//!          │                              └─ require_identity ─ PUT/POST ┴─ ArticleStore
//!          └─ anything else ── static file or index.html
//! ```
//!
//! The store and verifier are traits injected through [`AppState`], so the
//! same router runs against MongoDB and Firebase in production and against
//! in-memory fakes in dev mode and tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{create_router, run, AppState};
pub use types::{LecternError, Result};
