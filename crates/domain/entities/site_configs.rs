use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::site_configs;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq, Eq)]
#[diesel(table_name = site_configs)]
pub struct SiteConfigEntity {
    pub id: i64,
    pub config_key: String,
    pub config_value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq, Eq)]
#[diesel(table_name = site_configs)]
pub struct UpsertSiteConfigEntity {
    pub config_key: String,
    pub config_value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UpsertSiteConfigEntity {
    pub fn new(config_key: impl Into<String>, config_value: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            config_key: config_key.into(),
            config_value: config_value.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}
