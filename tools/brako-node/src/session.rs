//! Admin login sessions.
//!
//! There is a single admin account. Its password is configured as a SHA-256
//! digest; a successful login mints a random bearer token that stays valid
//! for the configured TTL.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{ShipmentError, ShipmentResult};

/// Proof that the caller holds a live admin session. Only
/// [`SessionStore::authorize`] can mint one.
#[derive(Debug, Clone)]
pub struct AdminCapability {
    username: String,
}

impl AdminCapability {
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("password digest is not hex: {0}")]
    NotHex(#[from] hex::FromHexError),
    #[error("password digest must be 32 bytes, got {0}")]
    WrongLength(usize),
}

#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_sha256: [u8; 32],
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AdminCredentials {
    /// `digest_hex` is the hex SHA-256 of the admin password.
    pub fn new(username: impl Into<String>, digest_hex: &str) -> Result<Self, CredentialsError> {
        let bytes = hex::decode(digest_hex.trim())?;
        let password_sha256: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CredentialsError::WrongLength(bytes.len()))?;
        Ok(Self {
            username: username.into(),
            password_sha256,
        })
    }

    pub fn from_password(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_sha256: Sha256::digest(password.as_bytes()).into(),
        }
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(password.as_bytes()).into();
        // Constant time over the whole digest.
        let diff = digest
            .iter()
            .zip(self.password_sha256.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0 && username == self.username
    }
}

#[derive(Debug, Clone)]
struct Session {
    username: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SessionStore {
    credentials: AdminCredentials,
    ttl: Duration,
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new(credentials: AdminCredentials, ttl: Duration) -> Self {
        Self {
            credentials,
            ttl,
            sessions: DashMap::new(),
        }
    }

    /// Check credentials and return a fresh bearer token.
    pub fn login(&self, username: &str, password: &str) -> ShipmentResult<String> {
        if !self.credentials.matches(username, password) {
            warn!(username, "rejected admin login");
            return Err(ShipmentError::Unauthorized);
        }
        self.purge_expired();

        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        self.sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        info!(username, "admin logged in");
        Ok(token)
    }

    /// Revoke a token. Returns whether it was live.
    pub fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).is_some();
        if removed {
            info!("admin logged out");
        }
        removed
    }

    pub fn authorize(&self, token: &str) -> ShipmentResult<AdminCapability> {
        let now = Utc::now();
        let session = self.sessions.get(token).map(|entry| entry.value().clone());
        let username = match session {
            Some(session) if session.expires_at > now => session.username,
            Some(_) => {
                self.sessions.remove(token);
                debug!("session expired");
                return Err(ShipmentError::Unauthorized);
            }
            None => return Err(ShipmentError::Unauthorized),
        };
        Ok(AdminCapability { username })
    }

    pub fn is_authenticated(&self, token: &str) -> bool {
        self.authorize(token).is_ok()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires_at > now);
    }
}
