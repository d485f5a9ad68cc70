use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use crates::domain::value_objects::admin_auth::AdminIdentity;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SESSION_COOKIE: &str = "netfyber_admin_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSessionClaims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signing material and cookie policy of the admin session.
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    secure_cookie: bool,
    admin_prefix: String,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_minutes: i64, secure_cookie: bool, admin_prefix: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
            secure_cookie,
            admin_prefix: admin_prefix.to_string(),
        }
    }

    pub fn admin_prefix(&self) -> &str {
        &self.admin_prefix
    }

    pub fn login_path(&self) -> String {
        format!("{}/login", self.admin_prefix)
    }

    pub fn issue_token(&self, identity: &AdminIdentity, now: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = AdminSessionClaims {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("failed to sign session token: {}", e))?;

        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.leeway = 0;

        let token_data = decode::<AdminSessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("session validation failed: {}", e))?;

        let id = token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("invalid admin id in session"))?;

        Ok(AdminIdentity {
            id,
            username: token_data.claims.username,
        })
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(cookie::time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }
}

/// An authenticated admin, taken from the session cookie.
///
/// Requests without a valid session are redirected to the login page.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(keys) = parts.extensions.get::<Arc<SessionKeys>>().cloned() else {
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        };

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Err(Redirect::to(&keys.login_path()).into_response());
        };

        match keys.validate_token(&token) {
            Ok(identity) => Ok(AdminSession(identity)),
            Err(err) => {
                debug!(error = %err, path = %parts.uri.path(), "auth: rejected admin session");
                Err(Redirect::to(&keys.login_path()).into_response())
            }
        }
    }
}
