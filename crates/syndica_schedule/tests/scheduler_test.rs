//! Scheduler state machine tests over the in-memory document store.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use syndica_core::{
    MediaItem, Platform, Post, PostBuilder, PostId, PostVariantBuilder, VariantStatus,
};
use syndica_publish::{
    ContainerApi, ContainerPublisher, ContainerResult, ContainerStatus,
};
use syndica_resolve::{EmptyBinaryStore, MediaResolver, OptionsMapper, VariantResolver};
use syndica_schedule::{DocumentStore, MemoryDocumentStore, PostScheduler, SchedulerTiming};

/// Platform API that publishes instantly and counts attempts.
struct InstantApi {
    publishes: AtomicUsize,
    fail: bool,
}

impl InstantApi {
    fn new(fail: bool) -> Self {
        Self {
            publishes: AtomicUsize::new(0),
            fail,
        }
    }
}

#[async_trait]
impl ContainerApi for InstantApi {
    async fn create_container(
        &self,
        _media_url: &str,
        _caption: &str,
        _tags: &[String],
    ) -> ContainerResult<String> {
        if self.fail {
            return Err(syndica_error::PublishError::new(
                syndica_error::PublishErrorKind::Api("rate limited".to_string()),
            ));
        }
        Ok("container-1".to_string())
    }

    async fn container_status(&self, _container_id: &str) -> ContainerResult<ContainerStatus> {
        Ok(ContainerStatus::Ready)
    }

    async fn create_carousel(
        &self,
        _container_ids: &[String],
        _caption: &str,
    ) -> ContainerResult<String> {
        Ok("carousel-1".to_string())
    }

    async fn publish(&self, _container_id: &str) -> ContainerResult<String> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        Ok("published-1".to_string())
    }

    async fn permalink(&self, _published_id: &str) -> ContainerResult<String> {
        Ok("https://platform.example/p/published-1".to_string())
    }
}

fn post_with_desired_schedule(id: &str, media: Vec<MediaItem>, minutes_ago: i64) -> Post {
    let mut base = PostVariantBuilder::default()
        .text(Some("caption".to_string()))
        .media(media)
        .build()
        .unwrap();
    base.desire_schedule(Utc::now() - ChronoDuration::minutes(minutes_ago));
    PostBuilder::default()
        .id(PostId::from(id))
        .base(base)
        .build()
        .unwrap()
}

fn image(url: &str) -> MediaItem {
    MediaItem::UrlImage {
        url: url.to_string(),
        source_url: None,
    }
}

fn scheduler_over(
    store: Arc<MemoryDocumentStore>,
    api: Arc<InstantApi>,
) -> PostScheduler {
    let media = MediaResolver::new(
        Arc::new(EmptyBinaryStore),
        "https://proxy.example/convert",
        Vec::new(),
    );
    let resolver = VariantResolver::new(media, OptionsMapper::default());
    let publisher =
        ContainerPublisher::new(api).with_poll_interval(Duration::from_millis(1));
    PostScheduler::new(
        store,
        publisher,
        resolver,
        Platform::Instagram,
        SchedulerTiming::default().with_tick_interval(Duration::from_millis(10)),
    )
}

/// Poll the store until the predicate holds or two seconds elapse.
async fn wait_for(
    store: &MemoryDocumentStore,
    post_id: &PostId,
    predicate: impl Fn(&Post) -> bool,
) -> Post {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let snapshot = store.load(post_id).await.unwrap();
        if predicate(snapshot.post()) {
            return snapshot.post().clone();
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for post state"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn due_post_commits_and_publishes() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(false));
    let post_id = PostId::from("p1");
    store
        .insert(post_with_desired_schedule(
            "p1",
            vec![image("https://cdn.example/a.png")],
            2,
        ))
        .await;

    let scheduler = scheduler_over(store.clone(), api.clone());
    scheduler.watch(post_id.clone()).await.unwrap();

    let published = wait_for(&store, &post_id, |post| {
        *post.base().status() == VariantStatus::Published
    })
    .await;
    assert_eq!(
        published.base().external_post_id().as_deref(),
        Some("published-1")
    );
    assert_eq!(
        published.base().permalink().as_deref(),
        Some("https://platform.example/p/published-1")
    );
    scheduler.shutdown().await;
}

#[tokio::test]
async fn published_post_is_terminal() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(false));
    let post_id = PostId::from("p1");
    store
        .insert(post_with_desired_schedule(
            "p1",
            vec![image("https://cdn.example/a.png")],
            2,
        ))
        .await;

    let scheduler = scheduler_over(store.clone(), api.clone());
    scheduler.watch(post_id.clone()).await.unwrap();
    wait_for(&store, &post_id, |post| {
        *post.base().status() == VariantStatus::Published
    })
    .await;

    // Let several more ticks elapse; no further attempt may start.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.publishes.load(Ordering::SeqCst), 1);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn failed_publish_demotes_with_reason_and_retries() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(true));
    let post_id = PostId::from("p1");
    store
        .insert(post_with_desired_schedule(
            "p1",
            vec![image("https://cdn.example/a.png")],
            2,
        ))
        .await;

    let scheduler = scheduler_over(store.clone(), api.clone());
    scheduler.watch(post_id.clone()).await.unwrap();

    let demoted = wait_for(&store, &post_id, |post| {
        *post.base().attempt_count() >= 2
    })
    .await;
    // Retry-by-demotion: back to the desired state, reason recorded,
    // attempts keep accruing with no cutoff.
    assert_eq!(*demoted.base().status(), VariantStatus::ScheduleDesired);
    assert!(
        demoted
            .base()
            .not_scheduled_reason()
            .as_deref()
            .unwrap()
            .contains("rate limited")
    );
    scheduler.shutdown().await;
}

#[tokio::test]
async fn unsynced_snapshots_are_ignored() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(false));
    let post_id = PostId::from("p1");
    store
        .insert(post_with_desired_schedule(
            "p1",
            vec![image("https://cdn.example/a.png")],
            2,
        ))
        .await;
    store.set_synced(&post_id, false).await.unwrap();

    let scheduler = scheduler_over(store.clone(), api.clone());
    scheduler.watch(post_id.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = store.load(&post_id).await.unwrap();
    assert_eq!(
        *snapshot.post().base().status(),
        VariantStatus::ScheduleDesired
    );
    assert_eq!(api.publishes.load(Ordering::SeqCst), 0);

    // Once the document syncs, the machine proceeds.
    store.set_synced(&post_id, true).await.unwrap();
    wait_for(&store, &post_id, |post| {
        *post.base().status() == VariantStatus::Published
    })
    .await;
    scheduler.shutdown().await;
}

#[tokio::test]
async fn empty_media_blocks_commit_without_attempt() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(false));
    let post_id = PostId::from("p1");
    store
        .insert(post_with_desired_schedule("p1", Vec::new(), 2))
        .await;

    let scheduler = scheduler_over(store.clone(), api.clone());
    scheduler.watch(post_id.clone()).await.unwrap();

    let blocked = wait_for(&store, &post_id, |post| {
        post.base().not_scheduled_reason().is_some()
    })
    .await;
    assert_eq!(*blocked.base().status(), VariantStatus::ScheduleDesired);
    assert_eq!(
        blocked.base().not_scheduled_reason().as_deref(),
        Some("no media available")
    );
    assert_eq!(*blocked.base().attempt_count(), 0);
    assert_eq!(api.publishes.load(Ordering::SeqCst), 0);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn far_past_schedule_never_fires() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(false));
    let post_id = PostId::from("p1");
    store
        .insert(post_with_desired_schedule(
            "p1",
            vec![image("https://cdn.example/a.png")],
            10,
        ))
        .await;

    let scheduler = scheduler_over(store.clone(), api.clone());
    scheduler.watch(post_id.clone()).await.unwrap();

    let blocked = wait_for(&store, &post_id, |post| {
        post.base().not_scheduled_reason().is_some()
    })
    .await;
    assert_eq!(*blocked.base().status(), VariantStatus::ScheduleDesired);
    assert_eq!(
        blocked.base().not_scheduled_reason().as_deref(),
        Some("scheduled time has passed")
    );
    assert_eq!(api.publishes.load(Ordering::SeqCst), 0);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn unwatch_cancels_the_ticking_task() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(false));
    let post_id = PostId::from("p1");
    store
        .insert(post_with_desired_schedule(
            "p1",
            vec![image("https://cdn.example/a.png")],
            2,
        ))
        .await;

    let scheduler = scheduler_over(store.clone(), api.clone());
    scheduler.watch(post_id.clone()).await.unwrap();
    assert!(scheduler.is_watched(&post_id).await);

    scheduler.unwatch(&post_id).await;
    assert!(!scheduler.is_watched(&post_id).await);
}

#[tokio::test]
async fn watching_a_missing_post_errors() {
    let store = Arc::new(MemoryDocumentStore::new());
    let api = Arc::new(InstantApi::new(false));
    let scheduler = scheduler_over(store, api);
    assert!(scheduler.watch(PostId::from("missing")).await.is_err());
}
