use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::admin_users::InsertAdminUserEntity,
    repositories::admin_users::AdminUserRepository,
    value_objects::{
        admin_auth::{AdminIdentity, LoginOutcome, hash_password},
        html_sanitizer::clean_text_field,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Account temporarily locked. Try again after {} UTC.", .until.format("%H:%M"))]
    AccountLocked { until: DateTime<Utc> },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AdminAuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AdminAuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AdminAuthError::AccountLocked { .. } => StatusCode::FORBIDDEN,
            AdminAuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AdminAuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AdminAuthError>;

pub struct AdminAuthUseCase<A>
where
    A: AdminUserRepository + Send + Sync + 'static,
{
    admin_user_repository: Arc<A>,
}

impl<A> AdminAuthUseCase<A>
where
    A: AdminUserRepository + Send + Sync + 'static,
{
    pub fn new(admin_user_repository: Arc<A>) -> Self {
        Self {
            admin_user_repository,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> UseCaseResult<AdminIdentity> {
        let username = clean_text_field(username.trim());
        if username.is_empty() || password.is_empty() {
            return Err(AdminAuthError::InvalidCredentials);
        }

        let outcome = self
            .admin_user_repository
            .attempt_login(username.clone(), password.to_string(), Utc::now())
            .await
            .map_err(|err| {
                error!(username, db_error = ?err, "admin_auth: login check failed");
                AdminAuthError::Internal(err)
            })?;

        match outcome {
            LoginOutcome::Authenticated(identity) => {
                info!(admin_id = identity.id, username, "admin_auth: login succeeded");
                Ok(identity)
            }
            LoginOutcome::InvalidCredentials { failed_attempts } => {
                warn!(username, failed_attempts, "admin_auth: wrong password");
                Err(AdminAuthError::InvalidCredentials)
            }
            LoginOutcome::Locked { until } => {
                warn!(username, %until, "admin_auth: login attempt on locked account");
                Err(AdminAuthError::AccountLocked { until })
            }
            LoginOutcome::UnknownAccount => {
                warn!(username, "admin_auth: unknown or inactive account");
                Err(AdminAuthError::InvalidCredentials)
            }
        }
    }

    /// Creates the first admin account; does nothing once any admin exists.
    pub async fn ensure_bootstrap_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> UseCaseResult<bool> {
        let existing = self
            .admin_user_repository
            .count_admins()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "admin_auth: failed to count admins");
                AdminAuthError::Internal(err)
            })?;

        if existing > 0 {
            info!(existing, "admin_auth: admin accounts present, bootstrap skipped");
            return Ok(false);
        }

        let username = clean_text_field(username.trim());
        let email = clean_text_field(email.trim());
        if username.is_empty() || email.is_empty() {
            return Err(AdminAuthError::Validation(
                "Bootstrap admin needs a username and an email.".to_string(),
            ));
        }

        let password_hash =
            hash_password(password).map_err(|err| AdminAuthError::Validation(err.to_string()))?;

        let admin_id = self
            .admin_user_repository
            .insert(InsertAdminUserEntity {
                username: username.clone(),
                email,
                password_hash,
                is_active: true,
                failed_login_attempts: 0,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(username, db_error = ?err, "admin_auth: failed to create bootstrap admin");
                AdminAuthError::Internal(err)
            })?;

        info!(admin_id, username, "admin_auth: bootstrap admin created");
        Ok(true)
    }
}
