//! HTTP-backed container API client.

use crate::{ContainerApi, ContainerResult, ContainerStatus};
use async_trait::async_trait;
use syndica_error::{PublishError, PublishErrorKind};

/// Container API client for a Graph-style media endpoint.
///
/// Stages media through `POST {base}/media`, polls readiness through
/// `GET {base}/{id}?fields=status_code`, and publishes through
/// `POST {base}/media_publish`.
pub struct GraphContainerApi {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphContainerApi {
    /// Create a client for the given endpoint and credential.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL or access token is empty.
    #[tracing::instrument(skip(access_token))]
    pub fn new(
        base_url: impl Into<String> + std::fmt::Debug,
        access_token: impl Into<String>,
    ) -> Result<Self, PublishError> {
        let base_url = base_url.into();
        let access_token = access_token.into();
        if base_url.is_empty() {
            return Err(PublishError::new(PublishErrorKind::Api(
                "Container API base URL cannot be empty".to_string(),
            )));
        }
        if access_token.is_empty() {
            return Err(PublishError::new(PublishErrorKind::Api(
                "Container API access token cannot be empty".to_string(),
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> ContainerResult<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::new(PublishErrorKind::Http(e.to_string())))?;
        Self::into_json(response).await
    }

    async fn get_json(&self, path_and_query: &str) -> ContainerResult<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path_and_query))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| PublishError::new(PublishErrorKind::Http(e.to_string())))?;
        Self::into_json(response).await
    }

    async fn into_json(response: reqwest::Response) -> ContainerResult<serde_json::Value> {
        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PublishError::new(PublishErrorKind::Http(e.to_string())))?;
        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown platform error")
                .to_string();
            return Err(PublishError::new(PublishErrorKind::Api(message)));
        }
        Ok(body)
    }

    fn require_id(body: &serde_json::Value) -> ContainerResult<String> {
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                PublishError::new(PublishErrorKind::Api(
                    "Response missing 'id' field".to_string(),
                ))
            })
    }
}

#[async_trait]
impl ContainerApi for GraphContainerApi {
    #[tracing::instrument(skip(self, caption, tags))]
    async fn create_container(
        &self,
        media_url: &str,
        caption: &str,
        tags: &[String],
    ) -> ContainerResult<String> {
        let body = serde_json::json!({
            "image_url": media_url,
            "caption": caption,
            "user_tags": tags,
        });
        let response = self.post_json("media", body).await?;
        Self::require_id(&response)
    }

    async fn container_status(&self, container_id: &str) -> ContainerResult<ContainerStatus> {
        let response = self
            .get_json(&format!("{container_id}?fields=status_code"))
            .await?;
        match response["status_code"].as_str() {
            Some("FINISHED") => Ok(ContainerStatus::Ready),
            Some("ERROR") | Some("EXPIRED") => Ok(ContainerStatus::Error),
            _ => Ok(ContainerStatus::Pending),
        }
    }

    #[tracing::instrument(skip(self, caption))]
    async fn create_carousel(
        &self,
        container_ids: &[String],
        caption: &str,
    ) -> ContainerResult<String> {
        let body = serde_json::json!({
            "media_type": "CAROUSEL",
            "children": container_ids.join(","),
            "caption": caption,
        });
        let response = self.post_json("media", body).await?;
        Self::require_id(&response)
    }

    #[tracing::instrument(skip(self))]
    async fn publish(&self, container_id: &str) -> ContainerResult<String> {
        let body = serde_json::json!({ "creation_id": container_id });
        let response = self.post_json("media_publish", body).await?;
        Self::require_id(&response)
    }

    async fn permalink(&self, published_id: &str) -> ContainerResult<String> {
        let response = self
            .get_json(&format!("{published_id}?fields=permalink"))
            .await?;
        response["permalink"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                PublishError::new(PublishErrorKind::MissingPermalink(
                    published_id.to_string(),
                ))
            })
    }
}
