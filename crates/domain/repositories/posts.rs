use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::posts::{EditPostEntity, InsertPostEntity, PostEntity};

#[async_trait]
#[automock]
pub trait PostRepository {
    /// Active posts, newest publication first.
    async fn list_active(&self) -> Result<Vec<PostEntity>>;

    /// Looks a post up regardless of its active flag.
    async fn find_by_id(&self, post_id: i64) -> Result<Option<PostEntity>>;

    async fn insert(&self, insert_post_entity: InsertPostEntity) -> Result<i64>;

    /// Returns the row as it was before the update, `None` when the id is unknown.
    async fn update(
        &self,
        post_id: i64,
        edit_post_entity: EditPostEntity,
    ) -> Result<Option<PostEntity>>;

    /// Soft delete. Returns `false` when the id is unknown.
    async fn deactivate(&self, post_id: i64) -> Result<bool>;
}
