use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::posts;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq, Eq)]
#[diesel(table_name = posts)]
pub struct PostEntity {
    pub id: i64,
    pub title: String,
    pub content: String, // markdown-lite source, rendered on read
    pub summary: String,
    pub category: String,
    pub image: String, // stored filename or the `default.jpg` sentinel
    pub external_url: String,
    pub published_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq, Eq)]
#[diesel(table_name = posts)]
pub struct InsertPostEntity {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: String,
    pub image: String,
    pub external_url: String,
    pub published_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `None` fields keep the stored value.
#[derive(Debug, Clone, AsChangeset, PartialEq, Eq)]
#[diesel(table_name = posts)]
pub struct EditPostEntity {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: String,
    pub image: Option<String>,
    pub external_url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
