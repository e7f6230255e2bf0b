//! Opaque bearer token adapter.
//!
//! Tokens are 32 random bytes, hex-encoded, handed to the client once.
//! Only their SHA-256 digest is kept server-side, together with the
//! principal and an expiry. Expired entries are dropped lazily on lookup.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::ports::{TokenError, TokenPair, TokenService};
use crate::domain::Principal;

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone)]
struct IssuedToken {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct TokenStore {
    by_digest: HashMap<String, IssuedToken>,
}

impl TokenStore {
    fn put(&mut self, token: &str, principal: Principal, expires_at: DateTime<Utc>) {
        self.by_digest.insert(
            digest(token),
            IssuedToken {
                principal,
                expires_at,
            },
        );
    }

    fn resolve(&mut self, token: &str, now: DateTime<Utc>) -> Option<Principal> {
        let key = digest(token);
        match self.by_digest.get(&key) {
            Some(issued) if issued.expires_at > now => Some(issued.principal),
            Some(_) => {
                self.by_digest.remove(&key);
                None
            }
            None => None,
        }
    }
}

/// In-memory token issuer with separate access and refresh lifetimes.
pub struct InMemoryTokenService {
    access: Mutex<TokenStore>,
    refresh: Mutex<TokenStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl InMemoryTokenService {
    /// Create a token service with the given lifetimes.
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            access: Mutex::new(TokenStore::default()),
            refresh: Mutex::new(TokenStore::default()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn guard<'a>(
        store: &'a Mutex<TokenStore>,
    ) -> Result<MutexGuard<'a, TokenStore>, TokenError> {
        store
            .lock()
            .map_err(|_| TokenError::unavailable("token store poisoned"))
    }

    fn mint_access(&self, principal: Principal) -> Result<String, TokenError> {
        let token = mint();
        let mut access = Self::guard(&self.access)?;
        access.put(&token, principal, Utc::now() + self.access_ttl);
        Ok(token)
    }
}

impl Default for InMemoryTokenService {
    /// Lifetimes matching the portal defaults: 15 minute access tokens,
    /// 7 day refresh tokens.
    fn default() -> Self {
        Self::new(Duration::minutes(15), Duration::days(7))
    }
}

#[async_trait]
impl TokenService for InMemoryTokenService {
    async fn issue(&self, principal: Principal) -> Result<TokenPair, TokenError> {
        let access = self.mint_access(principal)?;
        let refresh = mint();
        let mut refresh_store = Self::guard(&self.refresh)?;
        refresh_store.put(&refresh, principal, Utc::now() + self.refresh_ttl);
        Ok(TokenPair { access, refresh })
    }

    async fn verify_access(&self, token: &str) -> Result<Principal, TokenError> {
        let mut access = Self::guard(&self.access)?;
        access.resolve(token, Utc::now()).ok_or(TokenError::Invalid)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let principal = {
            let mut refresh_store = Self::guard(&self.refresh)?;
            refresh_store
                .resolve(refresh_token, Utc::now())
                .ok_or(TokenError::Invalid)?
        };
        self.mint_access(principal)
    }
}

fn mint() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
