use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crates::domain::{
    entities::site_configs::UpsertSiteConfigEntity,
    repositories::site_configs::SiteConfigRepository,
    value_objects::{
        html_sanitizer::clean_text_field,
        site_configs::{
            DEFAULT_SITE_CONFIGS, SiteConfigDto, SiteConfigMap, fallback_site_configs,
            is_reserved_form_key,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SiteConfigError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SiteConfigError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            SiteConfigError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SiteConfigError>;

/// Read side of the configuration table used by every rendered page.
#[async_trait]
pub trait SiteConfigSource: Send + Sync {
    /// Cleaned key/value map; never fails, falls back to built-in values.
    async fn all_values(&self) -> SiteConfigMap;
}

pub type SharedSiteConfigs = Arc<dyn SiteConfigSource>;

pub struct SiteConfigUseCase<C>
where
    C: SiteConfigRepository + Send + Sync + 'static,
{
    site_config_repository: Arc<C>,
}

impl<C> SiteConfigUseCase<C>
where
    C: SiteConfigRepository + Send + Sync + 'static,
{
    pub fn new(site_config_repository: Arc<C>) -> Self {
        Self {
            site_config_repository,
        }
    }

    pub async fn list_entries(&self) -> UseCaseResult<Vec<SiteConfigDto>> {
        let entries = self
            .site_config_repository
            .list_all()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "site_configs: failed to list entries");
                SiteConfigError::Internal(err)
            })?;

        Ok(entries.into_iter().map(SiteConfigDto::from).collect())
    }

    /// Saves every submitted non-blank value in one transaction and returns
    /// how many entries were written.
    pub async fn update_values(&self, submitted: Vec<(String, String)>) -> UseCaseResult<usize> {
        let now = Utc::now();

        let entries: Vec<UpsertSiteConfigEntity> = submitted
            .into_iter()
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, value)| {
                !key.is_empty() && !value.is_empty() && !is_reserved_form_key(key)
            })
            .map(|(key, value)| UpsertSiteConfigEntity::new(key, clean_text_field(&value), now))
            .collect();

        if entries.is_empty() {
            info!("site_configs: nothing to update");
            return Ok(0);
        }

        let key_count = entries.len();
        let written = self
            .site_config_repository
            .upsert_many(entries)
            .await
            .map_err(|err| {
                error!(key_count, db_error = ?err, "site_configs: failed to save entries");
                SiteConfigError::Internal(err)
            })?;

        info!(written, "site_configs: entries saved");
        Ok(written)
    }

    /// Inserts the default entries whose key is missing.
    pub async fn seed_defaults(&self) -> UseCaseResult<usize> {
        let now = Utc::now();
        let defaults = DEFAULT_SITE_CONFIGS
            .iter()
            .map(|(key, value)| UpsertSiteConfigEntity::new(*key, *value, now))
            .collect();

        let inserted = self
            .site_config_repository
            .insert_missing(defaults)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "site_configs: failed to seed defaults");
                SiteConfigError::Internal(err)
            })?;

        info!(inserted, "site_configs: default entries ensured");
        Ok(inserted)
    }
}

#[async_trait]
impl<C> SiteConfigSource for SiteConfigUseCase<C>
where
    C: SiteConfigRepository + Send + Sync + 'static,
{
    async fn all_values(&self) -> SiteConfigMap {
        match self.site_config_repository.list_all().await {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| (entry.config_key, clean_text_field(&entry.config_value)))
                .collect(),
            Err(err) => {
                warn!(db_error = ?err, "site_configs: store unavailable, using fallback values");
                fallback_site_configs()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::{
        entities::site_configs::SiteConfigEntity,
        repositories::site_configs::MockSiteConfigRepository,
    };

    fn entry(key: &str, value: &str) -> SiteConfigEntity {
        let now = Utc::now();
        SiteConfigEntity {
            id: 1,
            config_key: key.to_string(),
            config_value: value.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn all_values_cleans_stored_markup() {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_list_all().returning(|| {
            Box::pin(async {
                Ok(vec![
                    entry("hero_title", "Internet <script>alert(1)</script>rapida"),
                    entry("address", "Rua A<br>Centro"),
                ])
            })
        });

        let values = SiteConfigUseCase::new(Arc::new(repo)).all_values().await;

        assert_eq!(values["hero_title"], "Internet rapida");
        assert_eq!(values["address"], "Rua A<br>Centro");
    }

    #[tokio::test]
    async fn all_values_falls_back_when_store_fails() {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_list_all()
            .returning(|| Box::pin(async { Err(anyhow::anyhow!("connection refused")) }));

        let values = SiteConfigUseCase::new(Arc::new(repo)).all_values().await;

        assert_eq!(values, fallback_site_configs());
    }

    #[tokio::test]
    async fn update_skips_reserved_and_blank_values() {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_upsert_many()
            .withf(|entries| {
                entries.len() == 2
                    && entries[0].config_key == "contact_phone"
                    && entries[0].config_value == "(63) 9999-0000"
                    && entries[1].config_key == "hero_title"
                    && entries[1].config_value == "<b>Nova</b>"
            })
            .times(1)
            .returning(|entries| {
                let written = entries.len();
                Box::pin(async move { Ok(written) })
            });

        let written = SiteConfigUseCase::new(Arc::new(repo))
            .update_values(vec![
                ("csrf_token".to_string(), "abc".to_string()),
                ("contact_phone".to_string(), "  (63) 9999-0000 ".to_string()),
                ("contact_email".to_string(), "   ".to_string()),
                ("hero_title".to_string(), "<b onclick=\"x()\">Nova</b>".to_string()),
            ])
            .await
            .unwrap();

        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn update_with_nothing_to_save_does_not_touch_the_store() {
        let repo = MockSiteConfigRepository::new();

        let written = SiteConfigUseCase::new(Arc::new(repo))
            .update_values(vec![("csrf_token".to_string(), "abc".to_string())])
            .await
            .unwrap();

        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn update_failure_is_internal_error() {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_upsert_many()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("deadlock")) }));

        let err = SiteConfigUseCase::new(Arc::new(repo))
            .update_values(vec![("hero_title".to_string(), "x".to_string())])
            .await
            .unwrap_err();

        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn seed_defaults_offers_every_default_key() {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_insert_missing()
            .withf(|entries| {
                entries.len() == DEFAULT_SITE_CONFIGS.len()
                    && entries.iter().any(|entry| entry.config_key == "whatsapp_number")
            })
            .returning(|_| Box::pin(async { Ok(3) }));

        let inserted = SiteConfigUseCase::new(Arc::new(repo))
            .seed_defaults()
            .await
            .unwrap();

        assert_eq!(inserted, 3);
    }
}
