use async_trait::async_trait;
use mockall::automock;

/// Destination of post images uploaded through the admin forms.
///
/// Implementations never surface errors: a failed save is `None` and leaves
/// nothing behind, a refused or failed delete is `false`.
#[async_trait]
#[automock]
pub trait ImageStorage {
    /// Validates and stores the image, returning the generated stored filename.
    async fn save(&self, original_filename: String, bytes: Vec<u8>) -> Option<String>;

    async fn delete(&self, stored_filename: String) -> bool;
}
