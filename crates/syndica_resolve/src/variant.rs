//! Per-platform variant resolution: effective text, media, and options.

use crate::{MediaResolver, OptionsMapper};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use syndica_core::{MediaItem, Platform, Post};

/// Per-platform override supplied with a publish request.
///
/// Distinct from a saved variant: this travels with the request and
/// wins over anything stored on the post. Supplying `media` is total:
/// the list replaces the saved and base media outright, even when it
/// resolves to nothing.
#[derive(
    Debug, Clone, PartialEq, Default, Getters, Serialize, Deserialize, derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into), default)]
pub struct VariantOverride {
    /// Override text.
    #[serde(default)]
    text: Option<String>,

    /// Override media; `Some` replaces saved and base media entirely.
    #[serde(default)]
    media: Option<Vec<MediaItem>>,

    /// Override option bag, possibly with bare alias keys.
    #[serde(default)]
    options: Map<String, Value>,
}

/// A publish request as received, before resolution.
#[derive(
    Debug, Clone, PartialEq, Getters, Serialize, Deserialize, derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct ResolveRequest {
    /// Target platform aliases, in the order they should publish.
    platforms: Vec<String>,

    /// Opaque credential selecting the connected social account set.
    #[builder(default)]
    #[serde(default)]
    profile_key: String,

    /// Requested publish time.
    #[builder(default)]
    #[serde(default)]
    schedule_date: Option<DateTime<Utc>>,

    /// Request-level option bag, possibly with bare alias keys.
    #[builder(default)]
    #[serde(default)]
    options: Map<String, Value>,

    /// Per-platform overrides keyed by platform alias.
    #[builder(default)]
    #[serde(default)]
    variants: BTreeMap<String, VariantOverride>,
}

/// The resolved, validated content for one platform.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ResolvedVariant {
    /// Platform alias as requested.
    alias: String,
    /// Canonical platform.
    platform: Platform,
    /// Effective text.
    text: String,
    /// Effective, capped, ordered media URLs.
    media_urls: Vec<String>,
    /// Effective options object, if any layer supplied one.
    options: Option<Value>,
}

/// Computes effective per-platform content from a post snapshot and a
/// publish request.
#[derive(Clone)]
pub struct VariantResolver {
    media: MediaResolver,
    options: OptionsMapper,
}

impl VariantResolver {
    /// Create a resolver from its media and options collaborators.
    pub fn new(media: MediaResolver, options: OptionsMapper) -> Self {
        Self { media, options }
    }

    /// Resolve every requested platform against the post snapshot.
    ///
    /// A platform named only in the request, with neither an override
    /// nor a saved variant, still resolves from pure base content.
    #[tracing::instrument(skip_all, fields(post_id = %post.id()))]
    pub fn resolve(&self, post: &Post, request: &ResolveRequest) -> Vec<ResolvedVariant> {
        let mut request_bag = request.options().clone();
        OptionsMapper::normalize_bag(&mut request_bag);

        request
            .platforms()
            .iter()
            .map(|alias| self.resolve_platform(post, request, &request_bag, alias))
            .collect()
    }

    fn resolve_platform(
        &self,
        post: &Post,
        request: &ResolveRequest,
        request_bag: &Map<String, Value>,
        alias: &str,
    ) -> ResolvedVariant {
        let platform = Platform::from_alias(alias);
        let override_ = request
            .variants()
            .iter()
            .find(|(key, _)| Platform::from_alias(key) == platform)
            .map(|(_, v)| v);
        let saved = post.saved_variant(&platform);

        let text = override_
            .and_then(|o| o.text().clone())
            .or_else(|| saved.and_then(|v| v.text().clone()))
            .or_else(|| post.base().text().clone())
            .unwrap_or_default();

        let mut media_urls = match override_.and_then(|o| o.media().as_deref()) {
            // Overriding is total: exactly this list, no base merge.
            Some(items) => self.media.resolve_items(items),
            None => {
                let resolved = self.media.resolve(saved);
                if resolved.is_empty() {
                    self.media.resolve(Some(post.base()))
                } else {
                    resolved
                }
            }
        };
        if let Some(cap) = platform.media_cap() {
            if media_urls.len() > cap {
                tracing::debug!(
                    platform = %platform,
                    dropped = media_urls.len() - cap,
                    "Truncating media to platform cap"
                );
                media_urls.truncate(cap);
            }
        }

        let mut variant_bag = override_
            .map(|o| o.options().clone())
            .or_else(|| saved.map(|v| v.options().clone()))
            .unwrap_or_default();
        OptionsMapper::normalize_bag(&mut variant_bag);
        let options = self.options.effective(&platform, &variant_bag, request_bag);

        ResolvedVariant {
            alias: alias.to_string(),
            platform,
            text,
            media_urls,
            options,
        }
    }
}
