//! Container-platform protocol trait and types.

use async_trait::async_trait;
use derive_getters::Getters;
use syndica_error::PublishError;

/// Result type for container API operations.
pub type ContainerResult<T> = Result<T, PublishError>;

/// Platform-reported readiness of a staged container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    /// The container is ready to publish.
    Ready,
    /// The platform is still processing the container.
    Pending,
    /// The platform failed to process the container.
    Error,
}

/// A published item with its permanent public URL.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PublishedPost {
    /// Platform-side identifier of the published item.
    id: String,
    /// Permanent public URL.
    permalink: String,
}

impl PublishedPost {
    /// Create a published-post record.
    pub fn new(id: impl Into<String>, permalink: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            permalink: permalink.into(),
        }
    }
}

/// Protocol against a platform that stages media in containers.
///
/// A container represents one media item pending publish and must reach
/// [`ContainerStatus::Ready`] before use. Multiple ready containers are
/// grouped into a carousel container and published as one post.
#[async_trait]
pub trait ContainerApi: Send + Sync {
    /// Create a container for one media item.
    ///
    /// # Errors
    ///
    /// Returns error if the platform rejects the media.
    async fn create_container(
        &self,
        media_url: &str,
        caption: &str,
        tags: &[String],
    ) -> ContainerResult<String>;

    /// Query the readiness of a container.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    async fn container_status(&self, container_id: &str) -> ContainerResult<ContainerStatus>;

    /// Group ready containers into a carousel container.
    ///
    /// # Errors
    ///
    /// Returns error if any referenced container is unusable.
    async fn create_carousel(
        &self,
        container_ids: &[String],
        caption: &str,
    ) -> ContainerResult<String>;

    /// Publish a ready (possibly carousel) container.
    ///
    /// # Errors
    ///
    /// Returns error if the publish call fails.
    async fn publish(&self, container_id: &str) -> ContainerResult<String>;

    /// Fetch the permanent public URL for a published item.
    ///
    /// # Errors
    ///
    /// Returns error if the permalink cannot be retrieved.
    async fn permalink(&self, published_id: &str) -> ContainerResult<String>;
}
