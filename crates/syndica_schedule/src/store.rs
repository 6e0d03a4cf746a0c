//! Document store abstraction over the live post document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use std::collections::HashMap;
use std::sync::Arc;
use syndica_core::{Platform, Post, PostId, PostVariant};
use syndica_error::{ScheduleError, ScheduleErrorKind};
use tokio::sync::{RwLock, watch};

/// Immutable snapshot of a post document.
///
/// `synced` reflects whether the underlying replicated document was
/// fully consistent when the snapshot was taken; consumers must skip
/// unsynced snapshots.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct PostSnapshot {
    /// The post at snapshot time.
    post: Post,
    /// Whether the document was fully synced.
    synced: bool,
}

impl PostSnapshot {
    /// Create a snapshot with the given sync state.
    pub fn new(post: Post, synced: bool) -> Self {
        Self { post, synced }
    }
}

/// A scheduling-field mutation applied to one variant.
///
/// The scheduler only ever mutates scheduling fields, never content
/// fields, to minimize the conflict surface with concurrent authoring
/// edits.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantMutation {
    /// Commit the desired schedule.
    MarkScheduled {
        /// Committed publish time
        at: DateTime<Utc>,
    },
    /// Record a successful publish. Terminal.
    MarkPublished {
        /// Correlation id from the publishing API
        external_post_id: String,
        /// Permanent public URL
        permalink: Option<String>,
        /// When the publish completed
        at: DateTime<Utc>,
    },
    /// Demote a failed attempt back to a retryable desired state.
    Demote {
        /// Human-readable failure reason
        reason: String,
    },
    /// Record a blocking reason without counting an attempt.
    Block {
        /// Human-readable blocking reason
        reason: String,
    },
}

impl VariantMutation {
    /// Apply this mutation to a variant.
    pub fn apply(&self, variant: &mut PostVariant) {
        match self {
            VariantMutation::MarkScheduled { at } => variant.mark_scheduled(*at),
            VariantMutation::MarkPublished {
                external_post_id,
                permalink,
                at,
            } => variant.mark_published(external_post_id.clone(), permalink.clone(), *at),
            VariantMutation::Demote { reason } => variant.demote(reason.clone()),
            VariantMutation::Block { reason } => variant.block(reason.clone()),
        }
    }
}

/// The live, subscribable post document store.
///
/// Implementations deliver fully-synced snapshots through a watch
/// channel; dropping the receiver unsubscribes. Writes go through
/// [`DocumentStore::apply`] as read-modify-write against the latest
/// snapshot, restricted to scheduling fields.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to snapshots of a post.
    ///
    /// # Errors
    ///
    /// Returns error if the post does not exist.
    async fn subscribe(
        &self,
        post_id: &PostId,
    ) -> Result<watch::Receiver<PostSnapshot>, ScheduleError>;

    /// Load the latest snapshot of a post.
    ///
    /// # Errors
    ///
    /// Returns error if the post does not exist.
    async fn load(&self, post_id: &PostId) -> Result<PostSnapshot, ScheduleError>;

    /// Apply a scheduling mutation to a platform's variant.
    ///
    /// The mutation lands on the platform's saved variant, or on the
    /// base variant when no saved variant exists.
    ///
    /// # Errors
    ///
    /// Returns error if the post does not exist.
    async fn apply(
        &self,
        post_id: &PostId,
        platform: &Platform,
        mutation: VariantMutation,
    ) -> Result<PostSnapshot, ScheduleError>;
}

/// In-memory document store backed by watch channels.
///
/// An explicit repository with a swappable backend, standing in for the
/// replicated document store in tests and single-process deployments.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    posts: Arc<RwLock<HashMap<PostId, watch::Sender<PostSnapshot>>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a post, publishing a synced snapshot.
    pub async fn insert(&self, post: Post) {
        let id = post.id().clone();
        let snapshot = PostSnapshot::new(post, true);
        let mut posts = self.posts.write().await;
        match posts.get(&id) {
            Some(tx) => {
                tx.send_replace(snapshot);
            }
            None => {
                let (tx, _rx) = watch::channel(snapshot);
                posts.insert(id, tx);
            }
        }
    }

    /// Publish the current post content with the given sync flag.
    ///
    /// Lets tests emulate partially-synced intermediate states.
    pub async fn set_synced(&self, post_id: &PostId, synced: bool) -> Result<(), ScheduleError> {
        let posts = self.posts.read().await;
        let tx = posts.get(post_id).ok_or_else(|| {
            ScheduleError::new(ScheduleErrorKind::PostNotFound(post_id.to_string()))
        })?;
        let post = tx.borrow().post().clone();
        tx.send_replace(PostSnapshot::new(post, synced));
        Ok(())
    }

    /// Remove a post, closing its subscriptions.
    pub async fn remove(&self, post_id: &PostId) {
        self.posts.write().await.remove(post_id);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn subscribe(
        &self,
        post_id: &PostId,
    ) -> Result<watch::Receiver<PostSnapshot>, ScheduleError> {
        let posts = self.posts.read().await;
        let tx = posts.get(post_id).ok_or_else(|| {
            ScheduleError::new(ScheduleErrorKind::PostNotFound(post_id.to_string()))
        })?;
        Ok(tx.subscribe())
    }

    async fn load(&self, post_id: &PostId) -> Result<PostSnapshot, ScheduleError> {
        let posts = self.posts.read().await;
        let tx = posts.get(post_id).ok_or_else(|| {
            ScheduleError::new(ScheduleErrorKind::PostNotFound(post_id.to_string()))
        })?;
        Ok(tx.borrow().clone())
    }

    #[tracing::instrument(skip(self, mutation), fields(post_id = %post_id, platform = %platform))]
    async fn apply(
        &self,
        post_id: &PostId,
        platform: &Platform,
        mutation: VariantMutation,
    ) -> Result<PostSnapshot, ScheduleError> {
        // The write lock makes the read-modify-write atomic: two
        // concurrent applies for one post must both land.
        let posts = self.posts.write().await;
        let tx = posts.get(post_id).ok_or_else(|| {
            ScheduleError::new(ScheduleErrorKind::PostNotFound(post_id.to_string()))
        })?;

        let mut snapshot = tx.borrow().clone();
        let variant = match snapshot.post.saved_variant_mut(platform) {
            Some(saved) => saved,
            None => snapshot.post.base_mut(),
        };
        mutation.apply(variant);
        tracing::debug!("Applied scheduling mutation");
        tx.send_replace(snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndica_core::{PostBuilder, PostVariantBuilder, VariantStatus};

    fn post(id: &str) -> Post {
        PostBuilder::default()
            .id(PostId::from(id))
            .base(PostVariantBuilder::default().build().unwrap())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn subscribe_to_missing_post_errors() {
        let store = MemoryDocumentStore::new();
        let err = store.subscribe(&PostId::from("nope")).await.unwrap_err();
        assert!(matches!(err.kind(), ScheduleErrorKind::PostNotFound(_)));
    }

    #[tokio::test]
    async fn apply_lands_on_base_when_no_saved_variant() {
        let store = MemoryDocumentStore::new();
        store.insert(post("p1")).await;
        let snapshot = store
            .apply(
                &PostId::from("p1"),
                &syndica_core::Platform::Instagram,
                VariantMutation::MarkScheduled { at: Utc::now() },
            )
            .await
            .unwrap();
        assert_eq!(
            *snapshot.post().base().status(),
            VariantStatus::Scheduled
        );
    }

    #[tokio::test]
    async fn subscribers_observe_applied_mutations() {
        let store = MemoryDocumentStore::new();
        store.insert(post("p1")).await;
        let mut rx = store.subscribe(&PostId::from("p1")).await.unwrap();

        store
            .apply(
                &PostId::from("p1"),
                &syndica_core::Platform::Instagram,
                VariantMutation::Block {
                    reason: "no media available".to_string(),
                },
            )
            .await
            .unwrap();

        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(
            snapshot.post().base().not_scheduled_reason().as_deref(),
            Some("no media available")
        );
    }

    #[tokio::test]
    async fn concurrent_applies_all_land() {
        let store = MemoryDocumentStore::new();
        store.insert(post("p1")).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .apply(
                        &PostId::from("p1"),
                        &syndica_core::Platform::Instagram,
                        VariantMutation::Demote {
                            reason: "transient failure".to_string(),
                        },
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every demotion increments the attempt count; a lost
        // read-modify-write would leave it short.
        let snapshot = store.load(&PostId::from("p1")).await.unwrap();
        assert_eq!(*snapshot.post().base().attempt_count(), 10);
    }

    #[tokio::test]
    async fn unsynced_snapshots_carry_the_flag() {
        let store = MemoryDocumentStore::new();
        store.insert(post("p1")).await;
        store
            .set_synced(&PostId::from("p1"), false)
            .await
            .unwrap();
        let snapshot = store.load(&PostId::from("p1")).await.unwrap();
        assert!(!snapshot.synced());
    }
}
