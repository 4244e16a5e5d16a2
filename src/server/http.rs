//! HTTP server implementation
//!
//! One axum router: `/api` carries the article endpoints behind the identity
//! middleware, everything else is the built front end with `index.html` as
//! the catch-all for client-side routes.

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::{require_identity, resolve_identity, IdentityVerifier};
use crate::db::ArticleStore;
use crate::routes::{self, articles};
use crate::types::{LecternError, Result};

/// Default bound on a single verifier or store call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state, built once at startup and injected into the router
pub struct AppState {
    /// Article documents
    pub articles: Arc<dyn ArticleStore>,
    /// Resolves `authtoken` headers into identities
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Upper bound on each verifier and store call
    pub request_timeout: Duration,
    /// Directory with the built front end
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(articles: Arc<dyn ArticleStore>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            articles,
            verifier,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            static_dir: PathBuf::from("../build"),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.static_dir = static_dir.into();
        self
    }

    /// Run a call to an external collaborator under the request timeout
    pub async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.request_timeout.as_millis() as u64, "Call timed out");
                Err(LecternError::Timeout(op))
            }
        }
    }
}

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/article/:name/upvote", put(articles::upvote_article))
        .route("/article/:name/comment", post(articles::comment_on_article))
        .route_layer(middleware::from_fn(require_identity));

    let api = Router::new()
        .route("/article/:name", get(articles::get_article))
        .merge(gated)
        .fallback(routes::api_not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            resolve_identity,
        ));

    Router::new()
        .nest("/api", api)
        .fallback_service(spa_service(&state.static_dir))
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

/// Static files, falling back to `index.html` for client-side routes
fn spa_service(static_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")))
}

/// Wrap each request in a span carrying a fresh request id
async fn trace_request(request: Request, next: Next) -> Response {
    let span = info_span!(
        "http.request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path()
    );

    async move {
        let response = next.run(request).await;
        info!(status = response.status().as_u16(), "Handled request");
        response
    }
    .instrument(span)
    .await
}

/// Start the HTTP server and serve until Ctrl+C or SIGTERM
pub async fn run(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;

    info!("Lectern listening on {}", addr);
    info!("Serving front end from {}", state.static_dir.display());

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
