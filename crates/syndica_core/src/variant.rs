//! Post variants and their scheduling lifecycle.

use crate::MediaItem;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a variant's publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase")]
pub enum VariantStatus {
    /// Authored but not submitted for scheduling.
    #[display("draft")]
    Draft,
    /// User intent to schedule, not yet committed by the scheduler.
    #[display("scheduleDesired")]
    ScheduleDesired,
    /// Committed with a concrete publish time.
    #[display("scheduled")]
    Scheduled,
    /// Terminal success; the variant carries the external post id.
    #[display("published")]
    Published,
    /// A publish attempt failed; the scheduler immediately demotes this
    /// back to [`VariantStatus::ScheduleDesired`] with a reason.
    #[display("failed")]
    Failed,
}

/// Per-platform content and scheduling state of a post.
///
/// The distinguished `base` variant holds the default content every
/// platform falls back to. Scheduling fields are mutated only by the
/// scheduler; content edits from the authoring side reset the status
/// to draft.
#[derive(
    Debug, Clone, PartialEq, Getters, Serialize, Deserialize, derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct PostVariant {
    /// Text content, possibly rich-text serialized.
    #[builder(default)]
    #[serde(default)]
    text: Option<String>,

    /// Ordered media attachments.
    #[builder(default)]
    #[serde(default)]
    media: Vec<MediaItem>,

    /// Raw per-platform option bag, keyed as authored.
    #[builder(default)]
    #[serde(default)]
    options: serde_json::Map<String, serde_json::Value>,

    /// Current lifecycle status.
    #[builder(default = "VariantStatus::Draft")]
    #[serde(default = "default_status")]
    status: VariantStatus,

    /// Desired or committed publish time.
    #[builder(default)]
    #[serde(default)]
    scheduled_for: Option<DateTime<Utc>>,

    /// Correlation id assigned by the publishing API once submitted.
    #[builder(default)]
    #[serde(default)]
    external_post_id: Option<String>,

    /// Permanent public URL of the published item.
    #[builder(default)]
    #[serde(default)]
    permalink: Option<String>,

    /// When the variant was published.
    #[builder(default)]
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,

    /// Human-readable reason the variant is not currently scheduled.
    #[builder(default)]
    #[serde(default)]
    not_scheduled_reason: Option<String>,

    /// Number of publish attempts so far. Informational only; retry is
    /// never gated on it.
    #[builder(default)]
    #[serde(default)]
    attempt_count: u32,

    /// Last content or status modification.
    #[builder(default)]
    #[serde(default)]
    last_modified: Option<DateTime<Utc>>,
}

fn default_status() -> VariantStatus {
    VariantStatus::Draft
}

impl PostVariant {
    /// Whether the variant explicitly supplies its own media list.
    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }

    /// Express user intent to publish at `at`.
    pub fn desire_schedule(&mut self, at: DateTime<Utc>) {
        self.status = VariantStatus::ScheduleDesired;
        self.scheduled_for = Some(at);
        self.touch();
    }

    /// Commit the desired schedule. Clears any prior blocking reason.
    pub fn mark_scheduled(&mut self, at: DateTime<Utc>) {
        self.status = VariantStatus::Scheduled;
        self.scheduled_for = Some(at);
        self.not_scheduled_reason = None;
        self.touch();
    }

    /// Record a successful publish. Terminal.
    pub fn mark_published(
        &mut self,
        external_post_id: impl Into<String>,
        permalink: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.status = VariantStatus::Published;
        self.external_post_id = Some(external_post_id.into());
        self.permalink = permalink;
        self.published_at = Some(at);
        self.not_scheduled_reason = None;
        self.touch();
    }

    /// Demote a failed attempt back to a retryable desired state.
    pub fn demote(&mut self, reason: impl Into<String>) {
        self.status = VariantStatus::ScheduleDesired;
        self.not_scheduled_reason = Some(reason.into());
        self.attempt_count += 1;
        self.touch();
    }

    /// Record a blocking reason while staying in the desired state.
    ///
    /// Unlike [`PostVariant::demote`], this does not count an attempt:
    /// nothing was tried, the schedule just cannot commit yet.
    pub fn block(&mut self, reason: impl Into<String>) {
        self.status = VariantStatus::ScheduleDesired;
        self.not_scheduled_reason = Some(reason.into());
        self.touch();
    }

    /// Reset to draft after a content edit from the authoring side.
    pub fn reset_to_draft(&mut self) {
        self.status = VariantStatus::Draft;
        self.scheduled_for = None;
        self.not_scheduled_reason = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_modified = Some(Utc::now());
    }
}
