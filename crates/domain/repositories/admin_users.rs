use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::{
    entities::admin_users::InsertAdminUserEntity, value_objects::admin_auth::LoginOutcome,
};

#[async_trait]
#[automock]
pub trait AdminUserRepository {
    /// Checks `password` for the active account `username` and persists the
    /// resulting counters, all inside one row-locked transaction.
    async fn attempt_login(
        &self,
        username: String,
        password: String,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome>;

    async fn count_admins(&self) -> Result<i64>;

    async fn insert(&self, insert_admin_user_entity: InsertAdminUserEntity) -> Result<i64>;
}
