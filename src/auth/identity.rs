//! Verified identities and the verifier seam

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::types::Result;

/// A user identity decoded from a verified token. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    /// Empty when the provider token carries no email
    pub email: String,
}

/// Resolves an opaque token into an identity.
///
/// Implementations return `LecternError::InvalidToken` for tokens that are
/// malformed, expired or badly signed, and `LecternError::Verifier` when the
/// provider itself cannot be reached.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity>;
}

/// Who is making the current request.
///
/// Written once by the identity middleware into request extensions and read
/// by everything downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Requester {
    #[default]
    Anonymous,
    Identified(Identity),
}

impl Requester {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Identified(identity) => Some(identity),
        }
    }

    /// Uid of the requester, `None` when anonymous
    pub fn uid(&self) -> Option<&str> {
        self.identity()
            .map(|identity| identity.uid.as_str())
            .filter(|uid| !uid.is_empty())
    }

    pub fn is_anonymous(&self) -> bool {
        self.uid().is_none()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        // Routes mounted without the identity middleware see everyone as anonymous
        Ok(parts.extensions.get::<Requester>().cloned().unwrap_or_default())
    }
}
