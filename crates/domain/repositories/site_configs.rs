use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::site_configs::{SiteConfigEntity, UpsertSiteConfigEntity};

#[async_trait]
#[automock]
pub trait SiteConfigRepository {
    async fn list_all(&self) -> Result<Vec<SiteConfigEntity>>;

    /// Inserts or overwrites every entry in one transaction.
    async fn upsert_many(&self, entries: Vec<UpsertSiteConfigEntity>) -> Result<usize>;

    /// Inserts the entries whose key does not exist yet, leaving others untouched.
    async fn insert_missing(&self, entries: Vec<UpsertSiteConfigEntity>) -> Result<usize>;
}
