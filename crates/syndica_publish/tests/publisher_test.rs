//! Container publisher protocol tests against a scripted platform API.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use syndica_error::PublishErrorKind;
use syndica_publish::{ContainerApi, ContainerPublisher, ContainerResult, ContainerStatus};
use tokio::sync::Mutex;

/// Scripted API: containers become ready after a configured number of
/// status polls; one container id can be scripted to fail or stall.
struct ScriptedApi {
    polls_until_ready: usize,
    failing_container: Option<String>,
    stalled_container: Option<String>,
    created: Mutex<Vec<String>>,
    carousels: Mutex<Vec<Vec<String>>>,
    status_polls: AtomicUsize,
    next_id: AtomicUsize,
}

impl ScriptedApi {
    fn new(polls_until_ready: usize) -> Self {
        Self {
            polls_until_ready,
            failing_container: None,
            stalled_container: None,
            created: Mutex::new(Vec::new()),
            carousels: Mutex::new(Vec::new()),
            status_polls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }
}

#[async_trait]
impl ContainerApi for ScriptedApi {
    async fn create_container(
        &self,
        media_url: &str,
        _caption: &str,
        _tags: &[String],
    ) -> ContainerResult<String> {
        let id = format!("container-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.created.lock().await.push(media_url.to_string());
        Ok(id)
    }

    async fn container_status(&self, container_id: &str) -> ContainerResult<ContainerStatus> {
        if self.failing_container.as_deref() == Some(container_id) {
            return Ok(ContainerStatus::Error);
        }
        if self.stalled_container.as_deref() == Some(container_id) {
            return Ok(ContainerStatus::Pending);
        }
        let polls = self.status_polls.fetch_add(1, Ordering::SeqCst);
        if polls < self.polls_until_ready {
            Ok(ContainerStatus::Pending)
        } else {
            Ok(ContainerStatus::Ready)
        }
    }

    async fn create_carousel(
        &self,
        container_ids: &[String],
        _caption: &str,
    ) -> ContainerResult<String> {
        self.carousels.lock().await.push(container_ids.to_vec());
        Ok(format!(
            "carousel-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ))
    }

    async fn publish(&self, container_id: &str) -> ContainerResult<String> {
        Ok(format!("published-from-{container_id}"))
    }

    async fn permalink(&self, published_id: &str) -> ContainerResult<String> {
        Ok(format!("https://platform.example/p/{published_id}"))
    }
}

fn publisher(api: ScriptedApi) -> ContainerPublisher {
    ContainerPublisher::new(Arc::new(api)).with_poll_interval(Duration::from_millis(1))
}

#[tokio::test]
async fn single_media_publishes_without_carousel() {
    let api = ScriptedApi::new(2);
    let publisher = publisher(api);
    let posted = publisher
        .publish(
            &["https://cdn.example/a.png".to_string()],
            "caption",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(posted.id(), "published-from-container-1");
    assert_eq!(
        posted.permalink(),
        "https://platform.example/p/published-from-container-1"
    );
}

#[tokio::test]
async fn multiple_media_group_into_a_carousel() {
    let api = Arc::new(ScriptedApi::new(0));
    let publisher =
        ContainerPublisher::new(api.clone()).with_poll_interval(Duration::from_millis(1));
    let urls: Vec<String> = (1..=3)
        .map(|i| format!("https://cdn.example/{i}.png"))
        .collect();
    let posted = publisher.publish(&urls, "caption", &[]).await.unwrap();

    assert_eq!(api.created.lock().await.len(), 3);
    let carousels = api.carousels.lock().await;
    assert_eq!(carousels.len(), 1);
    assert_eq!(
        carousels[0],
        vec![
            "container-1".to_string(),
            "container-2".to_string(),
            "container-3".to_string()
        ]
    );
    assert_eq!(posted.id(), "published-from-carousel-4");
}

#[tokio::test]
async fn empty_media_is_fatal() {
    let publisher = publisher(ScriptedApi::new(0));
    let err = publisher.publish(&[], "caption", &[]).await.unwrap_err();
    assert_eq!(*err.kind(), PublishErrorKind::NoMedia);
    assert!(err.is_fatal());
}

#[tokio::test]
async fn container_error_state_fails_the_attempt() {
    let mut api = ScriptedApi::new(0);
    api.failing_container = Some("container-1".to_string());
    let publisher = publisher(api);
    let err = publisher
        .publish(&["https://cdn.example/a.png".to_string()], "caption", &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        PublishErrorKind::ContainerFailed { container_id } if container_id == "container-1"
    ));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn never_ready_container_times_out_when_bounded() {
    let mut api = ScriptedApi::new(0);
    api.stalled_container = Some("container-1".to_string());
    let publisher = ContainerPublisher::new(Arc::new(api))
        .with_poll_interval(Duration::from_millis(1))
        .with_poll_timeout(Some(Duration::from_millis(5)));
    let err = publisher
        .publish(&["https://cdn.example/a.png".to_string()], "caption", &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        PublishErrorKind::ContainerTimedOut { .. }
    ));
}
