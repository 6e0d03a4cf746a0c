//! Per-post scheduling state machine.

use crate::{DocumentStore, PostSnapshot, VariantMutation};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use syndica_core::{Platform, PostId, VariantStatus};
use syndica_error::ScheduleError;
use syndica_publish::ContainerPublisher;
use syndica_resolve::{ResolveRequestBuilder, VariantResolver};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

/// Timing parameters of the scheduling state machine.
#[derive(Debug, Clone, Copy, Getters)]
pub struct SchedulerTiming {
    /// Interval between evaluation ticks.
    tick_interval: Duration,
    /// Tolerance past the scheduled time within which a post still fires.
    grace_window: chrono::Duration,
    /// Minimum lead time a future schedule must have to commit.
    min_lead: chrono::Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            grace_window: chrono::Duration::minutes(5),
            min_lead: chrono::Duration::minutes(5),
        }
    }
}

impl SchedulerTiming {
    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the grace window.
    pub fn with_grace_window(mut self, grace: chrono::Duration) -> Self {
        self.grace_window = grace;
        self
    }

    /// Set the minimum lead time.
    pub fn with_min_lead(mut self, lead: chrono::Duration) -> Self {
        self.min_lead = lead;
        self
    }
}

/// Position of "now" relative to a committed schedule time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    /// The scheduled time has not arrived.
    NotYet,
    /// Within the window: at or past the scheduled time, inside grace.
    Due,
    /// Past the scheduled time by more than the grace window.
    Expired,
}

/// Where `now` falls relative to `scheduled_for` given the grace window.
pub fn due_state(
    scheduled_for: DateTime<Utc>,
    now: DateTime<Utc>,
    grace: chrono::Duration,
) -> DueState {
    if now < scheduled_for {
        DueState::NotYet
    } else if now - scheduled_for <= grace {
        DueState::Due
    } else {
        DueState::Expired
    }
}

/// Whether a desired schedule time may commit.
///
/// A future time must satisfy the minimum lead; a past time is only
/// committable while still inside the grace window. This cutoff is
/// fixed, not configurable per call.
pub fn commit_eligible(
    at: DateTime<Utc>,
    now: DateTime<Utc>,
    min_lead: chrono::Duration,
    grace: chrono::Duration,
) -> bool {
    if at > now {
        at - now >= min_lead
    } else {
        due_state(at, now, grace) == DueState::Due
    }
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvalOutcome {
    Continue,
    Terminal,
}

/// Watches live posts and drives each one's variant for a single
/// container-based platform through the scheduling state machine:
/// desired, committed, then published or demoted back to desired with a
/// failure reason.
///
/// One ticking task runs per watched post. Ticks across posts are
/// independent; within a post an in-flight guard keeps publish attempts
/// from overlapping.
pub struct PostScheduler {
    store: Arc<dyn DocumentStore>,
    publisher: ContainerPublisher,
    resolver: VariantResolver,
    platform: Platform,
    timing: SchedulerTiming,
    tasks: Arc<RwLock<HashMap<PostId, JoinHandle<()>>>>,
}

impl PostScheduler {
    /// Create a scheduler publishing to the given platform.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        publisher: ContainerPublisher,
        resolver: VariantResolver,
        platform: Platform,
        timing: SchedulerTiming,
    ) -> Self {
        Self {
            store,
            publisher,
            resolver,
            platform,
            timing,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start watching a post, replacing any existing watch for it.
    ///
    /// # Errors
    ///
    /// Returns error if the post does not exist in the store.
    #[instrument(skip(self), fields(post_id = %post_id, platform = %self.platform))]
    pub async fn watch(&self, post_id: PostId) -> Result<(), ScheduleError> {
        let mut rx = self.store.subscribe(&post_id).await?;

        let ctx = WatchContext {
            store: Arc::clone(&self.store),
            publisher: self.publisher.clone(),
            resolver: self.resolver.clone(),
            platform: self.platform.clone(),
            timing: self.timing,
            post_id: post_id.clone(),
            in_flight: AtomicBool::new(false),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ctx.timing.tick_interval);
            // A slow publish must not cause a burst of catch-up ticks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            debug!(post_id = %ctx.post_id, "Post removed, stopping watch");
                            break;
                        }
                        // Snapshot refreshed; evaluation stays on the tick cadence.
                        let _ = rx.borrow_and_update();
                    }
                    _ = ticker.tick() => {
                        let snapshot = rx.borrow().clone();
                        if ctx.evaluate(snapshot).await == EvalOutcome::Terminal {
                            info!(post_id = %ctx.post_id, "Post published, stopping ticks");
                            break;
                        }
                    }
                }
            }
        });

        let mut tasks = self.tasks.write().await;
        if let Some(old) = tasks.insert(post_id.clone(), handle) {
            debug!("Canceling existing watch for post");
            old.abort();
        }
        info!("Watching post for scheduling");
        Ok(())
    }

    /// Stop watching a post, canceling its ticking task.
    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn unwatch(&self, post_id: &PostId) {
        let mut tasks = self.tasks.write().await;
        if let Some(handle) = tasks.remove(post_id) {
            handle.abort();
            info!("Stopped watching post");
        }
    }

    /// Whether a post currently has a watch task.
    pub async fn is_watched(&self, post_id: &PostId) -> bool {
        self.tasks.read().await.contains_key(post_id)
    }

    /// Post ids with active watch tasks.
    pub async fn watched_posts(&self) -> Vec<PostId> {
        self.tasks.read().await.keys().cloned().collect()
    }

    /// Cancel every watch task.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.write().await;
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
        info!("Scheduler shut down");
    }
}

/// Everything one watch task needs, detached from the scheduler.
struct WatchContext {
    store: Arc<dyn DocumentStore>,
    publisher: ContainerPublisher,
    resolver: VariantResolver,
    platform: Platform,
    timing: SchedulerTiming,
    post_id: PostId,
    in_flight: AtomicBool,
}

impl WatchContext {
    /// Evaluate one snapshot against the state machine.
    async fn evaluate(&self, snapshot: PostSnapshot) -> EvalOutcome {
        // Partially-synced intermediate states must be ignored.
        if !snapshot.synced() {
            return EvalOutcome::Continue;
        }

        let variant = snapshot.post().variant_for(&self.platform);
        let status = *variant.status();
        let scheduled_for = *variant.scheduled_for();
        let current_reason = variant.not_scheduled_reason().clone();
        let now = Utc::now();

        match status {
            VariantStatus::Published => EvalOutcome::Terminal,
            VariantStatus::ScheduleDesired => {
                let Some(at) = scheduled_for else {
                    return EvalOutcome::Continue;
                };
                self.try_commit(&snapshot, at, now, current_reason).await;
                EvalOutcome::Continue
            }
            VariantStatus::Scheduled => {
                let Some(at) = scheduled_for else {
                    return EvalOutcome::Continue;
                };
                if due_state(at, now, self.timing.grace_window) == DueState::Due {
                    return self.try_publish(&snapshot).await;
                }
                EvalOutcome::Continue
            }
            VariantStatus::Draft | VariantStatus::Failed => EvalOutcome::Continue,
        }
    }

    /// Attempt the desired -> scheduled commit.
    async fn try_commit(
        &self,
        snapshot: &PostSnapshot,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
        current_reason: Option<String>,
    ) {
        let resolved = self.resolve_content(snapshot);
        let block = |reason: &str| {
            // Re-applying an identical reason every tick is just churn.
            current_reason.as_deref() != Some(reason)
        };

        if resolved.media_urls().is_empty() {
            let reason = "no media available";
            if block(reason) {
                warn!(post_id = %self.post_id, "Cannot commit schedule without media");
                self.apply(VariantMutation::Block {
                    reason: reason.to_string(),
                })
                .await;
            }
            return;
        }

        if commit_eligible(at, now, self.timing.min_lead, self.timing.grace_window) {
            debug!(post_id = %self.post_id, scheduled_for = %at, "Committing schedule");
            self.apply(VariantMutation::MarkScheduled { at }).await;
        } else if due_state(at, now, self.timing.grace_window) == DueState::Expired {
            let reason = "scheduled time has passed";
            if block(reason) {
                self.apply(VariantMutation::Block {
                    reason: reason.to_string(),
                })
                .await;
            }
        }
    }

    /// Run one publish attempt, guarded against reentry.
    async fn try_publish(&self, snapshot: &PostSnapshot) -> EvalOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(post_id = %self.post_id, "Publish already in flight, skipping tick");
            return EvalOutcome::Continue;
        }

        let resolved = self.resolve_content(snapshot);
        info!(
            post_id = %self.post_id,
            platform = %self.platform,
            media_count = resolved.media_urls().len(),
            "Publishing scheduled post"
        );
        let result = self
            .publisher
            .publish(resolved.media_urls(), resolved.text(), &[])
            .await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(posted) => {
                info!(post_id = %self.post_id, permalink = %posted.permalink(), "Publish succeeded");
                self.apply(VariantMutation::MarkPublished {
                    external_post_id: posted.id().clone(),
                    permalink: Some(posted.permalink().clone()),
                    at: Utc::now(),
                })
                .await;
                EvalOutcome::Terminal
            }
            Err(err) if err.is_fatal() => {
                error!(post_id = %self.post_id, error = %err, "Publish failed fatally");
                self.apply(VariantMutation::Block {
                    reason: err.kind().to_string(),
                })
                .await;
                EvalOutcome::Continue
            }
            Err(err) => {
                // Demotion makes the post eligible for a retry on a
                // later tick; the reason is the only audit trail.
                warn!(post_id = %self.post_id, error = %err, "Publish failed, demoting to retry");
                self.apply(VariantMutation::Demote {
                    reason: err.kind().to_string(),
                })
                .await;
                EvalOutcome::Continue
            }
        }
    }

    /// Effective text and media for this platform, per the resolver.
    fn resolve_content(&self, snapshot: &PostSnapshot) -> syndica_resolve::ResolvedVariant {
        let request = ResolveRequestBuilder::default()
            .platforms(vec![self.platform.to_string()])
            .build()
            .expect("ResolveRequest with a platform list");
        self.resolver
            .resolve(snapshot.post(), &request)
            .into_iter()
            .next()
            .expect("one resolved variant per requested platform")
    }

    async fn apply(&self, mutation: VariantMutation) {
        if let Err(err) = self
            .store
            .apply(&self.post_id, &self.platform, mutation)
            .await
        {
            error!(post_id = %self.post_id, error = %err, "Failed to write scheduling state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn grace() -> ChronoDuration {
        ChronoDuration::minutes(5)
    }

    fn lead() -> ChronoDuration {
        ChronoDuration::minutes(5)
    }

    #[test]
    fn ten_minutes_past_due_is_expired() {
        let now = Utc::now();
        let at = now - ChronoDuration::minutes(10);
        assert_eq!(due_state(at, now, grace()), DueState::Expired);
    }

    #[test]
    fn two_minutes_past_due_fires() {
        let now = Utc::now();
        let at = now - ChronoDuration::minutes(2);
        assert_eq!(due_state(at, now, grace()), DueState::Due);
    }

    #[test]
    fn one_minute_ahead_does_not_fire_yet() {
        let now = Utc::now();
        let at = now + ChronoDuration::minutes(1);
        assert_eq!(due_state(at, now, grace()), DueState::NotYet);
    }

    #[test]
    fn exactly_due_fires() {
        let now = Utc::now();
        assert_eq!(due_state(now, now, grace()), DueState::Due);
    }

    #[test]
    fn future_commit_requires_minimum_lead() {
        let now = Utc::now();
        assert!(!commit_eligible(
            now + ChronoDuration::minutes(1),
            now,
            lead(),
            grace()
        ));
        assert!(commit_eligible(
            now + ChronoDuration::minutes(10),
            now,
            lead(),
            grace()
        ));
    }

    #[test]
    fn past_commit_allowed_only_within_grace() {
        let now = Utc::now();
        assert!(commit_eligible(
            now - ChronoDuration::minutes(2),
            now,
            lead(),
            grace()
        ));
        assert!(!commit_eligible(
            now - ChronoDuration::minutes(10),
            now,
            lead(),
            grace()
        ));
    }
}
