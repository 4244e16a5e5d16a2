//! Identity middleware for the article API
//!
//! `resolve_identity` runs on every `/api` request and never turns away an
//! anonymous caller. `require_identity` is layered only on mutating routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::Requester;
use crate::server::AppState;
use crate::types::LecternError;

/// Header carrying the identity token (not a bearer scheme)
pub const AUTH_TOKEN_HEADER: &str = "authtoken";

/// Attach a `Requester` to the request.
///
/// - no header (or an empty one): anonymous
/// - a token the provider rejects: 400 with an empty body
/// - provider unreachable or too slow: 5xx
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request.headers().get(AUTH_TOKEN_HEADER) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(token) => Some(token.trim().to_string()).filter(|t| !t.is_empty()),
            Err(_) => {
                return LecternError::InvalidToken("Token is not valid ASCII".into())
                    .into_response()
            }
        },
    };

    let requester = match token {
        None => Requester::Anonymous,
        Some(token) => {
            match state
                .bounded("identity provider", state.verifier.verify(&token))
                .await
            {
                Ok(identity) => {
                    debug!(uid = %identity.uid, "Identified requester");
                    Requester::Identified(identity)
                }
                Err(e) => return e.into_response(),
            }
        }
    };

    request.extensions_mut().insert(requester);
    next.run(request).await
}

/// Reject anonymous requests with 401 `"Not Allowed"`
pub async fn require_identity(requester: Requester, request: Request, next: Next) -> Response {
    if requester.is_anonymous() {
        return LecternError::Unauthorized.into_response();
    }

    next.run(request).await
}
