//! Lectern - article backend for a single-page blog

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern::{
    auth::{project_id_from_credentials, FirebaseConfig, FirebaseVerifier, IdentityVerifier, JwtVerifier},
    config::Args,
    db::{ArticleStore, MemoryArticleStore, MongoClient},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lectern={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Lectern");
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Static dir: {}", args.static_dir.display());
    info!("Request timeout: {}ms", args.request_timeout_ms);
    info!("======================================");

    let (articles, verifier) = if args.dev_mode {
        dev_services(&args)?
    } else {
        production_services(&args).await?
    };

    let state = AppState::new(articles, verifier)
        .with_request_timeout(args.request_timeout())
        .with_static_dir(args.static_dir.clone());

    if let Err(e) = server::run(Arc::new(state), args.listen_addr()).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

type Services = (Arc<dyn ArticleStore>, Arc<dyn IdentityVerifier>);

/// MongoDB articles and Firebase identities
async fn production_services(args: &Args) -> anyhow::Result<Services> {
    let mongo = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    let articles = mongo.articles(&args.articles_collection).await?;
    info!(
        "Using collection '{}' in database '{}'",
        args.articles_collection,
        mongo.db_name()
    );

    let project_id = match &args.firebase_project_id {
        Some(project_id) => project_id.clone(),
        None => project_id_from_credentials(&args.credentials_file)?,
    };
    let verifier = FirebaseVerifier::new(FirebaseConfig::new(project_id))?;

    Ok((Arc::new(articles), Arc::new(verifier)))
}

/// In-memory articles and shared-secret identities
fn dev_services(args: &Args) -> anyhow::Result<Services> {
    warn!("Development mode enabled - articles are not persisted");

    let articles = match &args.seed_file {
        Some(path) => MemoryArticleStore::from_json_file(path)?,
        None => {
            warn!("No SEED_FILE given, starting with no articles");
            MemoryArticleStore::new()
        }
    };

    let verifier = JwtVerifier::new(args.jwt_secret(), 3600)?;

    Ok((Arc::new(articles), Arc::new(verifier)))
}
