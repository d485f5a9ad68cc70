use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use tokio::task;

use crate::{
    domain::{
        entities::posts::{EditPostEntity, InsertPostEntity, PostEntity},
        repositories::posts::PostRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::posts},
};

pub struct PostPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PostPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PostRepository for PostPostgres {
    async fn list_active(&self) -> Result<Vec<PostEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<PostEntity>> {
            let mut conn = db_pool.get()?;

            let result = posts::table
                .select(PostEntity::as_select())
                .filter(posts::is_active.eq(true))
                .order((posts::published_at.desc(), posts::id.desc()))
                .load::<PostEntity>(&mut conn)?;

            Ok(result)
        })
        .await?
    }

    async fn find_by_id(&self, post_id: i64) -> Result<Option<PostEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<PostEntity>> {
            let mut conn = db_pool.get()?;

            let result = posts::table
                .find(post_id)
                .select(PostEntity::as_select())
                .first::<PostEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await?
    }

    async fn insert(&self, insert_post_entity: InsertPostEntity) -> Result<i64> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<i64> {
            let mut conn = db_pool.get()?;

            let post_id = diesel::insert_into(posts::table)
                .values(&insert_post_entity)
                .returning(posts::id)
                .get_result::<i64>(&mut conn)?;

            Ok(post_id)
        })
        .await?
    }

    async fn update(
        &self,
        post_id: i64,
        edit_post_entity: EditPostEntity,
    ) -> Result<Option<PostEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<PostEntity>> {
            let mut conn = db_pool.get()?;

            let previous = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let previous = posts::table
                    .find(post_id)
                    .select(PostEntity::as_select())
                    .for_update()
                    .first::<PostEntity>(conn)
                    .optional()?;

                if previous.is_some() {
                    update(posts::table.find(post_id))
                        .set(&edit_post_entity)
                        .execute(conn)?;
                }

                Ok(previous)
            })?;

            Ok(previous)
        })
        .await?
    }

    async fn deactivate(&self, post_id: i64) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let affected = update(posts::table.find(post_id))
                .set((posts::is_active.eq(false), posts::updated_at.eq(now)))
                .execute(&mut conn)?;

            Ok(affected > 0)
        })
        .await?
    }
}
