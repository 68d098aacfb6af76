//! Admin login and in-memory session tracking.

use std::time::Duration;

use dashmap::DashMap;
use metrics::counter;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::infra::telemetry::LOGIN_REJECTED_TOTAL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("password rejected")]
    InvalidPassword,
    #[error("admin password is not configured")]
    NotConfigured,
    #[error("session missing or expired")]
    InvalidSession,
}

/// A freshly issued session; `token` is only ever handed to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Sessions keyed by the SHA-256 of their token.
#[derive(Debug)]
pub struct AdminSessions {
    password_sha256: Option<[u8; 32]>,
    ttl: Duration,
    sessions: DashMap<[u8; 32], OffsetDateTime>,
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0_u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

impl AdminSessions {
    pub fn new(password_sha256: Option<[u8; 32]>, ttl: Duration) -> Self {
        if password_sha256.is_none() {
            warn!(
                target = "tavola::auth",
                "admin.password_sha256 is not set; every login will be refused"
            );
        }
        Self {
            password_sha256,
            ttl,
            sessions: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn login(&self, password: &str) -> Result<IssuedSession, AuthError> {
        self.login_at(password, OffsetDateTime::now_utc())
    }

    pub fn validate(&self, token: &str) -> Result<OffsetDateTime, AuthError> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    pub fn logout(&self, token: &str) {
        self.sessions.remove(&digest(token));
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn login_at(&self, password: &str, now: OffsetDateTime) -> Result<IssuedSession, AuthError> {
        let expected = self.password_sha256.ok_or(AuthError::NotConfigured)?;
        let supplied = digest(password);
        if !bool::from(supplied.as_slice().ct_eq(expected.as_slice())) {
            counter!(LOGIN_REJECTED_TOTAL).increment(1);
            warn!(target = "tavola::auth", "admin login rejected");
            return Err(AuthError::InvalidPassword);
        }

        self.sessions.retain(|_, expires_at| *expires_at > now);

        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let expires_at = now + self.ttl;
        self.sessions.insert(digest(&token), expires_at);
        info!(target = "tavola::auth", expires_at = %expires_at, "admin session opened");

        Ok(IssuedSession { token, expires_at })
    }

    fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<OffsetDateTime, AuthError> {
        let key = digest(token);
        let expires_at = self
            .sessions
            .get(&key)
            .map(|entry| *entry.value())
            .ok_or(AuthError::InvalidSession)?;

        if expires_at <= now {
            self.sessions.remove(&key);
            return Err(AuthError::InvalidSession);
        }
        Ok(expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> AdminSessions {
        let expected = digest("open sesame");
        AdminSessions::new(Some(expected), Duration::from_secs(60))
    }

    #[test]
    fn hash_password_matches_known_digest() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn correct_password_opens_a_session() {
        let sessions = sessions();
        let issued = sessions.login("open sesame").expect("login");
        assert_eq!(issued.token.len(), 64);
        assert_eq!(sessions.validate(&issued.token), Ok(issued.expires_at));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let sessions = sessions();
        assert_eq!(
            sessions.login("guess").map(|_| ()),
            Err(AuthError::InvalidPassword)
        );
        assert_eq!(sessions.active_sessions(), 0);
    }

    #[test]
    fn unconfigured_password_refuses_everyone() {
        let sessions = AdminSessions::new(None, Duration::from_secs(60));
        assert_eq!(
            sessions.login("").map(|_| ()),
            Err(AuthError::NotConfigured)
        );
    }

    #[test]
    fn expired_sessions_are_evicted() {
        let sessions = sessions();
        let start = OffsetDateTime::now_utc();
        let issued = sessions.login_at("open sesame", start).expect("login");

        let later = start + Duration::from_secs(61);
        assert_eq!(
            sessions.validate_at(&issued.token, later),
            Err(AuthError::InvalidSession)
        );
        assert_eq!(sessions.active_sessions(), 0);
    }

    #[test]
    fn logout_forgets_the_session() {
        let sessions = sessions();
        let issued = sessions.login("open sesame").expect("login");
        sessions.logout(&issued.token);
        assert_eq!(
            sessions.validate(&issued.token),
            Err(AuthError::InvalidSession)
        );
    }
}
