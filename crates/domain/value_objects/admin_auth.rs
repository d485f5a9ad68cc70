use anyhow::{Result, anyhow, bail};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

pub const MAX_FAILED_LOGIN_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 30;
pub const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    // Verified against when the username does not resolve, so an unknown
    // account costs the same as a wrong password.
    static ref DUMMY_PASSWORD_HASH: String =
        hash_password("timing-equalizer-password").unwrap_or_default();
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: i64,
    pub username: String,
}

/// Result of one credential check against the stored login state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(AdminIdentity),
    InvalidCredentials { failed_attempts: i32 },
    Locked { until: DateTime<Utc> },
    UnknownAccount,
}

/// Persisted brute-force protection counters of an admin account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoginAttemptState {
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl LoginAttemptState {
    /// Lock expiry if the account is still locked at `now`.
    pub fn active_lock(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.locked_until.filter(|until| now < *until)
    }

    /// State after a password comparison made while unlocked.
    pub fn record_attempt(self, now: DateTime<Utc>, password_matches: bool) -> Self {
        if password_matches {
            return Self {
                failed_attempts: 0,
                locked_until: None,
                last_login_at: Some(now),
            };
        }

        let failed_attempts = self.failed_attempts.saturating_add(1);
        let locked_until = if failed_attempts >= MAX_FAILED_LOGIN_ATTEMPTS {
            Some(now + Duration::minutes(LOCKOUT_MINUTES))
        } else {
            self.locked_until
        };

        Self {
            failed_attempts,
            locked_until,
            last_login_at: self.last_login_at,
        }
    }
}

/// Everything a login check needs to know about a stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAccount {
    pub identity: AdminIdentity,
    pub password_hash: String,
    pub state: LoginAttemptState,
}

/// What to report for one check, and the state to persist when it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDecision {
    pub outcome: LoginOutcome,
    pub next_state: Option<LoginAttemptState>,
}

/// Runs one credential check. `verify` receives the stored hash, or `None`
/// for an unknown account, in which case its result is ignored. A locked
/// account is never verified and its state is left untouched.
pub fn decide_login<V>(account: Option<&LoginAccount>, now: DateTime<Utc>, verify: V) -> LoginDecision
where
    V: FnOnce(Option<&str>) -> bool,
{
    let Some(account) = account else {
        verify(None);
        return LoginDecision {
            outcome: LoginOutcome::UnknownAccount,
            next_state: None,
        };
    };

    if let Some(until) = account.state.active_lock(now) {
        return LoginDecision {
            outcome: LoginOutcome::Locked { until },
            next_state: None,
        };
    }

    let password_matches = verify(Some(&account.password_hash));
    let next_state = account.state.record_attempt(now, password_matches);
    let outcome = if password_matches {
        LoginOutcome::Authenticated(account.identity.clone())
    } else {
        LoginOutcome::InvalidCredentials {
            failed_attempts: next_state.failed_attempts,
        }
    };

    LoginDecision {
        outcome,
        next_state: Some(next_state),
    }
}

pub fn hash_password(plain: &str) -> Result<String> {
    if plain.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("password must be at least {MIN_PASSWORD_LENGTH} characters");
    }

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| anyhow!("failed to encode password salt: {err}"))?;

    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;

    Ok(hash.to_string())
}

/// Constant-time verification of `plain` against a PHC-formatted hash.
pub fn verify_password(stored_hash: &str, plain: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Burns one full hash verification; the result is always discarded.
pub fn verify_against_dummy(plain: &str) {
    let _ = verify_password(&DUMMY_PASSWORD_HASH, plain);
}
