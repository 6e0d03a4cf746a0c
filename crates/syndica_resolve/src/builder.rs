//! Assembly of resolved variants into publish request descriptors.

use crate::{ResolveRequest, ResolvedVariant, VariantResolver};
use serde_json::Map;
use syndica_core::{Post, PostDataBuilder, PublishRequest};
use syndica_error::{ResolveError, ResolveErrorKind};

/// Builds the final ordered list of publish requests for a post.
///
/// Pure given (request, post snapshot); it only shapes data and never
/// contacts the network. Platforms with identical resolved payloads are
/// grouped into one request, preserving first-seen platform order.
#[derive(Clone)]
pub struct RequestBuilder {
    resolver: VariantResolver,
}

impl RequestBuilder {
    /// Create a builder over the given variant resolver.
    pub fn new(resolver: VariantResolver) -> Self {
        Self { resolver }
    }

    /// Resolve and assemble publish requests.
    ///
    /// # Errors
    ///
    /// Returns a typed error when the platform list is empty or the
    /// profile key is missing.
    #[tracing::instrument(skip_all, fields(post_id = %post.id()))]
    pub fn build(
        &self,
        post: &Post,
        request: &ResolveRequest,
    ) -> Result<Vec<PublishRequest>, ResolveError> {
        if request.platforms().is_empty() {
            return Err(ResolveError::new(ResolveErrorKind::EmptyPlatforms));
        }
        if request.profile_key().trim().is_empty() {
            return Err(ResolveError::new(ResolveErrorKind::MissingProfileKey));
        }

        let resolved = self.resolver.resolve(post, request);
        let grouped = group_identical(resolved);

        let mut requests = Vec::with_capacity(grouped.len());
        for group in grouped {
            let first = &group[0];
            let mut options = Map::new();
            for variant in &group {
                if let Some(value) = variant.options() {
                    options
                        .entry(variant.platform().options_key())
                        .or_insert_with(|| value.clone());
                }
            }
            let post_data = PostDataBuilder::default()
                .post(first.text().clone())
                .media_urls(first.media_urls().clone())
                .schedule_date(*request.schedule_date())
                .options(options)
                .build()
                .expect("PostData with resolved fields");
            let platforms: Vec<String> =
                group.iter().map(|v| v.alias().clone()).collect();
            requests.push(
                syndica_core::PublishRequestBuilder::default()
                    .platforms(platforms)
                    .post_data(post_data)
                    .build()
                    .expect("PublishRequest with resolved fields"),
            );
        }

        tracing::debug!(requests = requests.len(), "Assembled publish requests");
        Ok(requests)
    }
}

/// Group variants sharing identical text and media, keeping order.
///
/// Option bags are namespaced per platform inside the payload, so they
/// never conflict within a group.
fn group_identical(resolved: Vec<ResolvedVariant>) -> Vec<Vec<ResolvedVariant>> {
    let mut groups: Vec<Vec<ResolvedVariant>> = Vec::new();
    for variant in resolved {
        match groups.iter_mut().find(|group| {
            let head = &group[0];
            head.text() == variant.text() && head.media_urls() == variant.media_urls()
        }) {
            Some(group) => group.push(variant),
            None => groups.push(vec![variant]),
        }
    }
    groups
}
