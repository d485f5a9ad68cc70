use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::posts::{EditPostEntity, InsertPostEntity, PostEntity},
    repositories::{image_storage::ImageStorage, posts::PostRepository},
    value_objects::{
        html_sanitizer::clean_text_field,
        post_summary::derive_summary,
        posts::{PostDto, PostFormModel, is_valid_external_url, parse_publication_date},
        uploads::{DEFAULT_POST_IMAGE, UploadedImage},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

pub const INVALID_DATE_ON_CREATE: &str = "Invalid publication date. Using the current date.";
pub const INVALID_DATE_ON_UPDATE: &str = "Invalid publication date. Keeping the original date.";
pub const IMAGE_NOT_SAVED: &str = "The image could not be saved and was ignored.";

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0}")]
    Validation(String),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PostError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PostError::Validation(_) => StatusCode::BAD_REQUEST,
            PostError::NotFound => StatusCode::NOT_FOUND,
            PostError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PostError>;

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWriteOutcome {
    pub post_id: i64,
    pub title: String,
    /// Non-fatal notices to show the admin (date fallback, dropped image).
    pub warnings: Vec<String>,
}

fn validate_form(form: PostFormModel) -> UseCaseResult<PostFormModel> {
    let form = form.trimmed();

    let missing = form.missing_required_fields();
    if !missing.is_empty() {
        return Err(PostError::Validation(format!(
            "All required fields must be filled in: {}",
            missing.join(", ")
        )));
    }

    if !is_valid_external_url(&form.external_url) {
        return Err(PostError::Validation("Invalid article URL.".to_string()));
    }

    Ok(form)
}

pub struct PostUseCase<R, S>
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    post_repository: Arc<R>,
    image_storage: Arc<S>,
}

impl<R, S> PostUseCase<R, S>
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    pub fn new(post_repository: Arc<R>, image_storage: Arc<S>) -> Self {
        Self {
            post_repository,
            image_storage,
        }
    }

    /// Active posts, newest first, ready for public rendering.
    pub async fn list_published(&self) -> UseCaseResult<Vec<PostDto>> {
        let posts = self.post_repository.list_active().await.map_err(|err| {
            error!(db_error = ?err, "posts: failed to list active posts");
            PostError::Internal(err)
        })?;

        info!(post_count = posts.len(), "posts: active posts loaded");
        Ok(posts.into_iter().map(PostDto::from).collect())
    }

    pub async fn find_by_id(&self, post_id: i64) -> UseCaseResult<PostEntity> {
        self.post_repository
            .find_by_id(post_id)
            .await
            .map_err(|err| {
                error!(post_id, db_error = ?err, "posts: failed to load post");
                PostError::Internal(err)
            })?
            .ok_or(PostError::NotFound)
    }

    pub async fn create(
        &self,
        form: PostFormModel,
        image: Option<UploadedImage>,
    ) -> UseCaseResult<PostWriteOutcome> {
        let form = validate_form(form)?;
        let now = Utc::now();
        let mut warnings = Vec::new();

        let published_at = parse_publication_date(&form.published_at).unwrap_or_else(|| {
            warn!(raw = %form.published_at, "posts: invalid publication date, using now");
            warnings.push(INVALID_DATE_ON_CREATE.to_string());
            now
        });

        let stored_image = self.store_image(image, &mut warnings).await;
        let title = clean_text_field(&form.title);

        let insert_post_entity = InsertPostEntity {
            title: title.clone(),
            summary: clean_text_field(&derive_summary(&form.content)),
            content: form.content,
            category: clean_text_field(&form.category),
            image: stored_image
                .clone()
                .unwrap_or_else(|| DEFAULT_POST_IMAGE.to_string()),
            external_url: form.external_url,
            published_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let post_id = match self.post_repository.insert(insert_post_entity).await {
            Ok(post_id) => post_id,
            Err(err) => {
                error!(db_error = ?err, "posts: failed to insert post");
                self.discard_image(stored_image).await;
                return Err(PostError::Internal(err));
            }
        };

        info!(post_id, "posts: post created");
        Ok(PostWriteOutcome {
            post_id,
            title,
            warnings,
        })
    }

    /// Replaces the post fields. A new image supersedes the old one, which is
    /// deleted only after the row was updated.
    pub async fn update(
        &self,
        post_id: i64,
        form: PostFormModel,
        image: Option<UploadedImage>,
    ) -> UseCaseResult<PostWriteOutcome> {
        let form = validate_form(form)?;
        let mut warnings = Vec::new();

        let published_at = parse_publication_date(&form.published_at);
        if published_at.is_none() {
            warn!(post_id, raw = %form.published_at, "posts: invalid publication date, keeping stored date");
            warnings.push(INVALID_DATE_ON_UPDATE.to_string());
        }

        let stored_image = self.store_image(image, &mut warnings).await;
        let title = clean_text_field(&form.title);

        let edit_post_entity = EditPostEntity {
            title: title.clone(),
            summary: clean_text_field(&derive_summary(&form.content)),
            content: form.content,
            category: clean_text_field(&form.category),
            image: stored_image.clone(),
            external_url: form.external_url,
            published_at,
            updated_at: Utc::now(),
        };

        let previous = match self.post_repository.update(post_id, edit_post_entity).await {
            Ok(Some(previous)) => previous,
            Ok(None) => {
                warn!(post_id, "posts: update target not found");
                self.discard_image(stored_image).await;
                return Err(PostError::NotFound);
            }
            Err(err) => {
                error!(post_id, db_error = ?err, "posts: failed to update post");
                self.discard_image(stored_image).await;
                return Err(PostError::Internal(err));
            }
        };

        if stored_image.is_some() {
            self.discard_image(Some(previous.image)).await;
        }

        info!(post_id, "posts: post updated");
        Ok(PostWriteOutcome {
            post_id,
            title,
            warnings,
        })
    }

    /// Soft delete. The row stays retrievable by id, so its image stays on disk.
    pub async fn deactivate(&self, post_id: i64) -> UseCaseResult<String> {
        let post = self.find_by_id(post_id).await?;

        let deactivated = self
            .post_repository
            .deactivate(post_id)
            .await
            .map_err(|err| {
                error!(post_id, db_error = ?err, "posts: failed to deactivate post");
                PostError::Internal(err)
            })?;

        if !deactivated {
            return Err(PostError::NotFound);
        }

        info!(post_id, "posts: post deactivated");
        Ok(post.title)
    }

    async fn store_image(
        &self,
        image: Option<UploadedImage>,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        let image = image.filter(|image| !image.original_filename.trim().is_empty())?;

        let stored = self
            .image_storage
            .save(image.original_filename, image.bytes)
            .await;

        if stored.is_none() {
            warnings.push(IMAGE_NOT_SAVED.to_string());
        }
        stored
    }

    async fn discard_image(&self, stored_image: Option<String>) {
        let Some(stored_image) = stored_image else {
            return;
        };
        if stored_image == DEFAULT_POST_IMAGE {
            return;
        }

        if !self.image_storage.delete(stored_image.clone()).await {
            warn!(stored_image, "posts: image could not be removed");
        }
    }
}
