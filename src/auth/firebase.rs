//! Firebase ID token verification
//!
//! Firebase ID tokens are RS256 JWTs signed with rotating Google keys
//! published as a JWKS. A token is accepted when:
//! - its header names a current signing key (`kid`),
//! - the signature verifies with that key,
//! - `aud` is the project id and `iss` is `https://securetoken.google.com/<project id>`,
//! - it has not expired and carries a non-empty `sub` (the uid).
//!
//! Keys are cached for the `max-age` Google sends with them.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::{Identity, IdentityVerifier};
use crate::types::{LecternError, Result};

/// Public signing keys for Firebase ID tokens
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Configuration for the Firebase verifier
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub jwks_url: String,
    /// Key cache lifetime when the response carries no `max-age` (default: 1 hour)
    pub default_key_ttl: Duration,
    /// Minimum spacing between refetches triggered by an unknown `kid` (default: 1 minute)
    pub min_refresh_interval: Duration,
    /// Timeout for the JWKS request (default: 5 seconds)
    pub request_timeout: Duration,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            default_key_ttl: Duration::from_secs(3600),
            min_refresh_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
        }
    }

    fn issuer(&self) -> String {
        format!("{}{}", ISSUER_PREFIX, self.project_id)
    }
}

/// The parts of a service account file we need
#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

/// Read the project id from a Firebase service account credentials file
pub fn project_id_from_credentials(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LecternError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let account: ServiceAccount = serde_json::from_str(&content)?;

    if account.project_id.is_empty() {
        return Err(LecternError::Config(format!(
            "{} has an empty project_id",
            path.display()
        )));
    }

    Ok(account.project_id)
}

/// Claims carried by a Firebase ID token
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Verifies Firebase ID tokens against Google's published keys
pub struct FirebaseVerifier {
    config: FirebaseConfig,
    keys: RwLock<Option<CachedKeys>>,
    http_client: reqwest::Client,
}

impl FirebaseVerifier {
    pub fn new(config: FirebaseConfig) -> Result<Self> {
        if config.project_id.is_empty() {
            return Err(LecternError::Config(
                "Firebase project id must not be empty".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LecternError::Config(format!("Failed to build JWKS client: {}", e)))?;

        info!(project_id = %config.project_id, "Firebase token verification enabled");

        Ok(Self {
            config,
            keys: RwLock::new(None),
            http_client,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.project_id]);
        validation.set_issuer(&[self.config.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation
    }

    /// Find the decoding key for `kid`, refetching the key set when needed
    async fn signing_key(&self, kid: &str) -> Result<DecodingKey> {
        let now = Instant::now();

        {
            let cache = self.keys.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > now {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return Ok(DecodingKey::from_jwk(jwk)?);
                    }
                    // Unknown kid on a fresh cache: only refetch occasionally
                    if now.duration_since(cached.fetched_at) < self.config.min_refresh_interval {
                        return Err(LecternError::InvalidToken(format!(
                            "Unknown signing key {}",
                            kid
                        )));
                    }
                }
            }
        }

        let mut cache = self.keys.write().await;

        // Another request may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at > now {
                if let Some(jwk) = cached.keys.find(kid) {
                    return Ok(DecodingKey::from_jwk(jwk)?);
                }
            }
        }

        match self.fetch_keys().await {
            Ok(fetched) => {
                let key = fetched
                    .keys
                    .find(kid)
                    .map(DecodingKey::from_jwk)
                    .transpose()?;
                *cache = Some(fetched);

                key.ok_or_else(|| {
                    LecternError::InvalidToken(format!("Unknown signing key {}", kid))
                })
            }
            Err(e) => match cache.as_ref().and_then(|cached| cached.keys.find(kid)) {
                Some(jwk) => {
                    warn!(error = %e, "Key refresh failed, using expired signing key");
                    Ok(DecodingKey::from_jwk(jwk)?)
                }
                None => Err(e),
            },
        }
    }

    async fn fetch_keys(&self) -> Result<CachedKeys> {
        debug!(url = %self.config.jwks_url, "Fetching Firebase signing keys");

        let response = self
            .http_client
            .get(&self.config.jwks_url)
            .send()
            .await?
            .error_for_status()?;

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(self.config.default_key_ttl);

        let keys: JwkSet = response.json().await?;
        if keys.keys.is_empty() {
            warn!("Firebase key set is empty");
        }

        let now = Instant::now();
        Ok(CachedKeys {
            keys,
            fetched_at: now,
            expires_at: now + ttl,
        })
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let header = decode_header(token)?;

        if header.alg != Algorithm::RS256 {
            return Err(LecternError::InvalidToken(format!(
                "Unexpected algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| LecternError::InvalidToken("Token has no key id".into()))?;
        let key = self.signing_key(&kid).await?;

        let claims = decode::<FirebaseClaims>(token, &key, &self.validation())?.claims;

        if claims.sub.is_empty() {
            return Err(LecternError::InvalidToken("Token has no subject".into()));
        }

        Ok(Identity {
            uid: claims.sub,
            email: claims.email.unwrap_or_default(),
        })
    }
}

/// Extract `max-age` from a Cache-Control header value
fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
