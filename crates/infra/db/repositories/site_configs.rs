use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*, upsert::excluded};
use std::sync::Arc;
use tokio::task;

use crate::{
    domain::{
        entities::site_configs::{SiteConfigEntity, UpsertSiteConfigEntity},
        repositories::site_configs::SiteConfigRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::site_configs},
};

pub struct SiteConfigPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SiteConfigPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SiteConfigRepository for SiteConfigPostgres {
    async fn list_all(&self) -> Result<Vec<SiteConfigEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<SiteConfigEntity>> {
            let mut conn = db_pool.get()?;

            let rows = site_configs::table
                .select(SiteConfigEntity::as_select())
                .order(site_configs::config_key.asc())
                .load::<SiteConfigEntity>(&mut conn)?;

            Ok(rows)
        })
        .await?
    }

    async fn upsert_many(&self, entries: Vec<UpsertSiteConfigEntity>) -> Result<usize> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db_pool.get()?;

            let written = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let mut written = 0;
                for entry in &entries {
                    written += diesel::insert_into(site_configs::table)
                        .values(entry)
                        .on_conflict(site_configs::config_key)
                        .do_update()
                        .set((
                            site_configs::config_value.eq(excluded(site_configs::config_value)),
                            site_configs::updated_at.eq(excluded(site_configs::updated_at)),
                        ))
                        .execute(conn)?;
                }
                Ok(written)
            })?;

            Ok(written)
        })
        .await?
    }

    async fn insert_missing(&self, entries: Vec<UpsertSiteConfigEntity>) -> Result<usize> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db_pool.get()?;

            let inserted = diesel::insert_into(site_configs::table)
                .values(&entries)
                .on_conflict(site_configs::config_key)
                .do_nothing()
                .execute(&mut conn)?;

            Ok(inserted)
        })
        .await?
    }
}
