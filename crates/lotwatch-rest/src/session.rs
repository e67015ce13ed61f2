//! Bearer-token session.
//!
//! Holds the token pair obtained at login. Tokens are wiped from memory when
//! the session ends or the pair is dropped, and never appear in `Debug`
//! output.

use parking_lot::RwLock;
use serde::Deserialize;
use std::fmt;
use zeroize::Zeroizing;

/// Access and refresh tokens.
pub struct TokenPair {
    access: Zeroizing<String>,
    refresh: Zeroizing<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Zeroizing::new(access.into()),
            refresh: Zeroizing::new(refresh.into()),
        }
    }

    pub fn access(&self) -> &str {
        &self.access
    }

    pub fn refresh(&self) -> &str {
        &self.refresh
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// `/api/token/` response body.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access: String,
    refresh: String,
}

impl From<TokenResponse> for TokenPair {
    fn from(r: TokenResponse) -> Self {
        TokenPair::new(r.access, r.refresh)
    }
}

/// Login state shared by every caller of the REST client.
#[derive(Default)]
pub struct Session {
    tokens: RwLock<Option<TokenPair>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, replacing any previous one.
    pub fn begin(&self, tokens: TokenPair) {
        *self.tokens.write() = Some(tokens);
    }

    /// End the session. Dropping the pair zeroizes it.
    pub fn end(&self) {
        self.tokens.write().take();
    }

    pub fn is_active(&self) -> bool {
        self.tokens.read().is_some()
    }

    /// Copy of the current access token.
    pub fn access_token(&self) -> Option<Zeroizing<String>> {
        self.tokens
            .read()
            .as_ref()
            .map(|t| Zeroizing::new(t.access().to_string()))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("active", &self.is_active())
            .finish()
    }
}
