use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{
    domain::value_objects::admin_auth::{AdminIdentity, LoginAccount, LoginAttemptState},
    infra::db::postgres::schema::admin_users,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq, Eq)]
#[diesel(table_name = admin_users)]
pub struct AdminUserEntity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub is_active: bool,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AdminUserEntity {
    pub fn login_state(&self) -> LoginAttemptState {
        LoginAttemptState {
            failed_attempts: self.failed_login_attempts,
            locked_until: self.locked_until,
            last_login_at: self.last_login_at,
        }
    }

    pub fn identity(&self) -> AdminIdentity {
        AdminIdentity {
            id: self.id,
            username: self.username.clone(),
        }
    }

    pub fn login_account(&self) -> LoginAccount {
        LoginAccount {
            identity: self.identity(),
            password_hash: self.password_hash.clone(),
            state: self.login_state(),
        }
    }
}

#[derive(Debug, Clone, Insertable, PartialEq, Eq)]
#[diesel(table_name = admin_users)]
pub struct InsertAdminUserEntity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub failed_login_attempts: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, AsChangeset, PartialEq, Eq)]
#[diesel(table_name = admin_users, treat_none_as_null = true)]
pub struct AdminLoginStateChangeset {
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<LoginAttemptState> for AdminLoginStateChangeset {
    fn from(value: LoginAttemptState) -> Self {
        Self {
            failed_login_attempts: value.failed_attempts,
            locked_until: value.locked_until,
            last_login_at: value.last_login_at,
        }
    }
}
