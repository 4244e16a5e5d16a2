//! HTTP server for Lectern

pub mod http;

pub use http::{create_router, run, AppState, DEFAULT_REQUEST_TIMEOUT};
