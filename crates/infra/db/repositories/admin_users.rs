use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, dsl::count_star, prelude::*, update};
use std::sync::Arc;
use tokio::task;

use crate::{
    domain::{
        entities::admin_users::{
            AdminLoginStateChangeset, AdminUserEntity, InsertAdminUserEntity,
        },
        repositories::admin_users::AdminUserRepository,
        value_objects::admin_auth::{
            LoginOutcome, decide_login, verify_against_dummy, verify_password,
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::admin_users},
};

pub struct AdminUserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AdminUserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AdminUserRepository for AdminUserPostgres {
    async fn attempt_login(
        &self,
        username: String,
        password: String,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<LoginOutcome> {
            let mut conn = db_pool.get()?;

            let outcome = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let admin = admin_users::table
                    .filter(admin_users::username.eq(&username))
                    .filter(admin_users::is_active.eq(true))
                    .select(AdminUserEntity::as_select())
                    .for_update()
                    .first::<AdminUserEntity>(conn)
                    .optional()?;

                let account = admin.map(|admin| admin.login_account());
                let decision = decide_login(account.as_ref(), now, |stored_hash| match stored_hash {
                    Some(stored_hash) => verify_password(stored_hash, &password),
                    None => {
                        verify_against_dummy(&password);
                        false
                    }
                });

                if let (Some(account), Some(next_state)) = (&account, decision.next_state) {
                    update(admin_users::table.find(account.identity.id))
                        .set(&AdminLoginStateChangeset::from(next_state))
                        .execute(conn)?;
                }

                Ok(decision.outcome)
            })?;

            Ok(outcome)
        })
        .await?
    }

    async fn count_admins(&self) -> Result<i64> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<i64> {
            let mut conn = db_pool.get()?;

            let total = admin_users::table
                .select(count_star())
                .first::<i64>(&mut conn)?;

            Ok(total)
        })
        .await?
    }

    async fn insert(&self, insert_admin_user_entity: InsertAdminUserEntity) -> Result<i64> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<i64> {
            let mut conn = db_pool.get()?;

            let admin_id = diesel::insert_into(admin_users::table)
                .values(&insert_admin_user_entity)
                .returning(admin_users::id)
                .get_result::<i64>(&mut conn)?;

            Ok(admin_id)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::value_objects::admin_auth::{LOCKOUT_MINUTES, hash_password},
        infra::db::postgres::postgres_connection::establish_connection,
    };
    use chrono::Duration;

    #[tokio::test]
    #[ignore = "requires a migrated Postgres database"]
    async fn lockout_is_persisted_across_attempts() {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let repository = AdminUserPostgres::new(Arc::new(establish_connection(&database_url).unwrap()));

        let username = format!("lockout-{}", uuid::Uuid::new_v4().simple());
        repository
            .insert(InsertAdminUserEntity {
                username: username.clone(),
                email: format!("{username}@example.com"),
                password_hash: hash_password("correct-horse").unwrap(),
                is_active: true,
                failed_login_attempts: 0,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let now = Utc::now();
        for _ in 0..5 {
            let outcome = repository
                .attempt_login(username.clone(), "wrong-password".to_string(), now)
                .await
                .unwrap();
            assert!(matches!(outcome, LoginOutcome::InvalidCredentials { .. }));
        }

        let locked = repository
            .attempt_login(username.clone(), "correct-horse".to_string(), now)
            .await
            .unwrap();
        assert!(matches!(locked, LoginOutcome::Locked { .. }));

        let later = now + Duration::minutes(LOCKOUT_MINUTES + 1);
        let outcome = repository
            .attempt_login(username, "correct-horse".to_string(), later)
            .await
            .unwrap();
        assert!(matches!(outcome, LoginOutcome::Authenticated(_)));
    }
}
