//! Authentication and authorization for Lectern
//!
//! Provides:
//! - The `IdentityVerifier` seam and the per-request `Requester`
//! - Firebase ID token verification (production)
//! - Shared-secret JWT verification (dev mode and tests)
//! - Middleware that resolves identity and gates mutating routes

pub mod firebase;
pub mod identity;
pub mod jwt;
pub mod middleware;

pub use firebase::{project_id_from_credentials, FirebaseConfig, FirebaseVerifier};
pub use identity::{Identity, IdentityVerifier, Requester};
pub use jwt::{Claims, JwtVerifier};
pub use middleware::{require_identity, resolve_identity, AUTH_TOKEN_HEADER};
