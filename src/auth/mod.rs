//! Authentication for the single configured account, plus the session layer.
//!
//! Passwords are never kept in memory: the configured password is digested
//! with SHA-256 at startup and every login attempt is digested and compared
//! in constant time to mitigate timing attacks.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use crate::errors::{codes, ErrorDetails, ErrorResponse};

/// Header name for the session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// The single configured account: username plus password digest.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password_digest: [u8; 32],
}

impl Credentials {
    /// Build credentials from the configured username and plaintext password.
    pub fn new(username: String, password: &str) -> Self {
        Self {
            username,
            password_digest: Sha256::digest(password.as_bytes()).into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Verify a submitted username/password pair.
    ///
    /// Both the username and the password digest are compared in constant
    /// time; `ct_eq` on slices of different lengths short-circuits to false
    /// without leaking contents.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(password.as_bytes()).into();

        let username_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let password_ok = digest.ct_eq(&self.password_digest);

        (username_ok & password_ok).into()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the digest
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// In-memory session store mapping bearer tokens to usernames.
///
/// Sessions live for the lifetime of the process; restarting the server
/// logs everyone out.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session for `username` and return its token.
    pub async fn create(&self, username: &str) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), username.to_string());
        token
    }

    /// Resolve a token to the username it was issued for.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Revoke a session. Returns whether the token existed.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

/// The authenticated identity attached to a request by the session layer.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub username: String,
    pub token: String,
}

/// Session middleware: resolves the token from the `x-session-token` header
/// (or an `Authorization: Bearer` header) and injects a [`SessionUser`]
/// extension, or rejects the request with 401.
pub async fn session_auth_layer(
    sessions: Arc<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(&request);

    let Some(token) = token else {
        return unauthorized_response("Missing session token");
    };

    match sessions.resolve(&token).await {
        Some(username) => {
            request
                .extensions_mut()
                .insert(SessionUser { username, token });
            next.run(request).await
        }
        None => unauthorized_response("Invalid or expired session"),
    }
}

fn extract_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    from_header.or_else(|| {
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    })
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
        },
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
