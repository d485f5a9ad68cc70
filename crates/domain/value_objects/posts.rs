use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{
    entities::posts::PostEntity,
    value_objects::{html_sanitizer::render_post_content, uploads::resolve_post_image_url},
};

pub const PUBLICATION_DATE_FORMAT: &str = "%d/%m/%Y";

/// Public shape of an active post (`GET /api/blog/posts`, blog page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostDto {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub category: String,
    pub image_url: String,
    pub external_url: String,
    pub published_at: String,
    pub content_html: String,
}

impl From<PostEntity> for PostDto {
    fn from(value: PostEntity) -> Self {
        Self {
            id: value.id,
            image_url: resolve_post_image_url(&value.image),
            published_at: format_publication_date(value.published_at),
            content_html: render_post_content(&value.content),
            title: value.title,
            summary: value.summary,
            category: value.category,
            external_url: value.external_url,
        }
    }
}

/// Admin form payload for creating or editing a post. `published_at` is the
/// raw `DD/MM/YYYY` string typed by the admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostFormModel {
    pub title: String,
    pub content: String,
    pub category: String,
    pub external_url: String,
    pub published_at: String,
}

impl PostFormModel {
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            category: self.category.trim().to_string(),
            external_url: self.external_url.trim().to_string(),
            published_at: self.published_at.trim().to_string(),
        }
    }

    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("content", &self.content),
            ("category", &self.category),
            ("external_url", &self.external_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Only absolute http(s) URLs with a host are accepted as article links.
pub fn is_valid_external_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

pub fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), PUBLICATION_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn format_publication_date(published_at: DateTime<Utc>) -> String {
    published_at.format(PUBLICATION_DATE_FORMAT).to_string()
}
