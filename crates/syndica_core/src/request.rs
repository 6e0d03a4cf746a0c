//! Wire types for the publishing API.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Payload of a publish request.
///
/// `media_urls` must already respect per-platform caps when this object
/// is constructed; the builder in `syndica_resolve` enforces that.
/// Platform option bags flatten into the object as `{platform}Options`
/// keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct PostData {
    /// Resolved post text.
    post: String,

    /// Resolved, ordered, capped media URLs.
    #[builder(default)]
    #[serde(default)]
    media_urls: Vec<String>,

    /// Publish time, if scheduled rather than immediate.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schedule_date: Option<DateTime<Utc>>,

    /// Canonically-keyed platform option bags.
    #[builder(default)]
    #[serde(flatten)]
    options: serde_json::Map<String, serde_json::Value>,
}

/// One publish request descriptor, ready to send to the publishing API.
///
/// Built fresh for every publish attempt and never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct PublishRequest {
    /// Target platform aliases sharing this payload.
    platforms: Vec<String>,

    /// Resolved payload.
    post_data: PostData,
}
