//! Multi-step container publish protocol.

use crate::{ContainerApi, ContainerResult, ContainerStatus, PublishedPost};
use std::sync::Arc;
use std::time::Duration;
use syndica_error::{PublishError, PublishErrorKind};

/// Default delay between container readiness polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Executes the container publish protocol against a platform API:
/// create container(s), poll each to readiness, group into a carousel
/// when there are multiple items, publish, and fetch the permalink.
#[derive(Clone)]
pub struct ContainerPublisher {
    api: Arc<dyn ContainerApi>,
    poll_interval: Duration,
    /// Bound on the readiness wait per container. `None` polls forever,
    /// matching platforms that report readiness eventually or never.
    poll_timeout: Option<Duration>,
}

impl ContainerPublisher {
    /// Create a publisher with the default poll cadence and no timeout.
    pub fn new(api: Arc<dyn ContainerApi>) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
        }
    }

    /// Set the delay between readiness polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the readiness wait per container.
    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Publish the given media as one post with the given caption.
    ///
    /// # Errors
    ///
    /// An empty media list is fatal ([`PublishErrorKind::NoMedia`]) and
    /// not retryable. All other failures are transient from the
    /// scheduler's point of view.
    #[tracing::instrument(skip(self, media_urls, caption), fields(media_count = media_urls.len()))]
    pub async fn publish(
        &self,
        media_urls: &[String],
        caption: &str,
        tags: &[String],
    ) -> ContainerResult<PublishedPost> {
        if media_urls.is_empty() {
            return Err(PublishError::new(PublishErrorKind::NoMedia));
        }

        let target = if media_urls.len() == 1 {
            let id = self
                .api
                .create_container(&media_urls[0], caption, tags)
                .await?;
            tracing::debug!(container_id = %id, "Created single media container");
            self.wait_ready(&id).await?;
            id
        } else {
            let mut children = Vec::with_capacity(media_urls.len());
            for url in media_urls {
                let id = self.api.create_container(url, caption, tags).await?;
                tracing::debug!(container_id = %id, url = %url, "Created carousel child container");
                self.wait_ready(&id).await?;
                children.push(id);
            }
            let carousel = self.api.create_carousel(&children, caption).await?;
            tracing::debug!(container_id = %carousel, children = children.len(), "Created carousel container");
            self.wait_ready(&carousel).await?;
            carousel
        };

        let published_id = self.api.publish(&target).await?;
        let permalink = self.api.permalink(&published_id).await?;
        tracing::info!(published_id = %published_id, permalink = %permalink, "Published container");

        Ok(PublishedPost::new(published_id, permalink))
    }

    /// Poll a container until the platform reports it ready.
    async fn wait_ready(&self, container_id: &str) -> ContainerResult<()> {
        let mut waited = Duration::ZERO;
        loop {
            match self.api.container_status(container_id).await? {
                ContainerStatus::Ready => return Ok(()),
                ContainerStatus::Error => {
                    return Err(PublishError::new(PublishErrorKind::ContainerFailed {
                        container_id: container_id.to_string(),
                    }));
                }
                ContainerStatus::Pending => {
                    if let Some(timeout) = self.poll_timeout {
                        if waited >= timeout {
                            tracing::warn!(container_id = %container_id, "Container readiness poll timed out");
                            return Err(PublishError::new(
                                PublishErrorKind::ContainerTimedOut {
                                    container_id: container_id.to_string(),
                                    waited_secs: waited.as_secs(),
                                },
                            ));
                        }
                    }
                    tokio::time::sleep(self.poll_interval).await;
                    waited += self.poll_interval;
                }
            }
        }
    }
}
