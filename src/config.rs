//! Configuration for Lectern
//!
//! CLI arguments and environment variable handling using clap.
//! A `.env` file in the working directory is loaded first (see `main.rs`).

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::db::schemas::ARTICLE_COLLECTION;

/// Secret used by the HS256 verifier when dev mode runs without `JWT_SECRET`
pub const DEV_JWT_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// Lectern - article backend for a single-page blog
#[derive(Parser, Debug, Clone)]
#[command(name = "lectern")]
#[command(about = "Serves the blog front end and its article API")]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "react-blog-db")]
    pub mongodb_db: String,

    /// Collection holding article documents
    #[arg(long, env = "ARTICLES_COLLECTION", default_value = ARTICLE_COLLECTION)]
    pub articles_collection: String,

    /// Firebase service account credentials (JSON)
    #[arg(long, env = "CREDENTIALS_FILE", default_value = "./credentials.json")]
    pub credentials_file: PathBuf,

    /// Firebase project id (overrides the one in the credentials file)
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    pub firebase_project_id: Option<String>,

    /// Directory holding the built front end
    #[arg(long, env = "STATIC_DIR", default_value = "../build")]
    pub static_dir: PathBuf,

    /// Upper bound on each identity provider and database call, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "5000")]
    pub request_timeout_ms: u64,

    /// Enable development mode (in-memory store, shared-secret tokens)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Shared secret for HS256 tokens in dev mode
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JSON array of articles loaded into the in-memory store (dev mode only)
    #[arg(long, env = "SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Socket address the server binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        self.jwt_secret
            .clone()
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.seed_file.is_some() && !self.dev_mode {
            return Err("SEED_FILE is only supported in dev mode".to_string());
        }

        if !self.dev_mode
            && self.firebase_project_id.is_none()
            && !self.credentials_file.exists()
        {
            return Err(format!(
                "Credentials file {} not found and FIREBASE_PROJECT_ID not set",
                self.credentials_file.display()
            ));
        }

        Ok(())
    }
}
