//! Session tokens and request identity.
//!
//! Logins issue opaque bearer tokens backed by a server-side table, so
//! a token carries no claims of its own and revocation is immediate.
//! Handlers opt into a gate by taking [`StaffSession`] or
//! [`CustomerSession`] as an extractor; an unauthenticated request is
//! redirected to the matching login route instead of hitting the
//! handler.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use common::CustomerId;
use dashmap::DashMap;
use store::Store;
use uuid::Uuid;

use crate::AppState;

/// Who a request is acting as. Absence of a token means anonymous.
#[derive(Debug, Clone)]
pub enum Identity {
    Staff,
    Customer { id: CustomerId, username: String },
}

/// Server-side table of live session tokens.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<Uuid, Identity>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh token for `identity`.
    pub fn issue(&self, identity: Identity) -> Uuid {
        let token = Uuid::new_v4();
        self.inner.insert(token, identity);
        token
    }

    pub fn get(&self, token: &Uuid) -> Option<Identity> {
        self.inner.get(token).map(|entry| entry.value().clone())
    }

    /// Forgets a token. Revoking an unknown token is a no-op.
    pub fn revoke(&self, token: &Uuid) {
        self.inner.remove(token);
    }
}

/// Rejection that sends the caller to a login route (303 See Other).
#[derive(Debug)]
pub struct AuthRedirect(&'static str);

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to(self.0).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<Uuid> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .and_then(|token| Uuid::parse_str(token.trim()).ok())
}

/// Proof that the request carries a live staff token.
#[derive(Debug, Clone)]
pub struct StaffSession {
    pub token: Uuid,
}

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for StaffSession {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(AuthRedirect("/store_login"));
        };
        match state.sessions.get(&token) {
            Some(Identity::Staff) => Ok(StaffSession { token }),
            _ => {
                tracing::debug!(uri = %parts.uri, "staff gate rejected request");
                Err(AuthRedirect("/store_login"))
            }
        }
    }
}

/// Proof that the request carries a live customer token.
#[derive(Debug, Clone)]
pub struct CustomerSession {
    pub token: Uuid,
    pub customer_id: CustomerId,
    pub username: String,
}

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for CustomerSession {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(AuthRedirect("/customer_login"));
        };
        match state.sessions.get(&token) {
            Some(Identity::Customer { id, username }) => Ok(CustomerSession {
                token,
                customer_id: id,
                username,
            }),
            _ => {
                tracing::debug!(uri = %parts.uri, "customer gate rejected request");
                Err(AuthRedirect("/customer_login"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_resolves_until_revoked() {
        let sessions = SessionStore::new();
        let token = sessions.issue(Identity::Staff);

        assert!(matches!(sessions.get(&token), Some(Identity::Staff)));

        sessions.revoke(&token);
        assert!(sessions.get(&token).is_none());
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let sessions = SessionStore::new();
        let a = sessions.issue(Identity::Staff);
        let b = sessions.issue(Identity::Staff);
        assert_ne!(a, b);
    }
}
