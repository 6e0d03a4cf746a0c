//! Media URL resolution: item shapes to fetchable URLs.

use std::sync::Arc;
use syndica_core::{MediaItem, PostVariant};
use url::Url;

/// Collaborator serving stored binaries by their opaque reference.
///
/// Opaque `file` references on media items resolve through this at
/// publish time. Implementations must not block.
pub trait BinaryStore: Send + Sync {
    /// Fetchable URL for a stored binary, or `None` if unresolvable.
    fn url_for(&self, file_id: &str) -> Option<String>;
}

/// A binary store with no entries. Items relying on it fall back to
/// their `sourceUrl` or are dropped.
#[derive(Debug, Clone, Default)]
pub struct EmptyBinaryStore;

impl BinaryStore for EmptyBinaryStore {
    fn url_for(&self, _file_id: &str) -> Option<String> {
        None
    }
}

/// Resolves a variant's media items to an ordered list of usable URLs.
///
/// Unresolvable items are dropped silently; this never errors. Callers
/// fall back to the base variant's media when the result is empty.
#[derive(Clone)]
pub struct MediaResolver {
    store: Arc<dyn BinaryStore>,
    /// Base URL of the media conversion proxy.
    proxy_base: String,
    /// Hosts whose URLs must be served through the proxy because some
    /// platform APIs cannot fetch from them directly.
    proxied_hosts: Vec<String>,
}

impl MediaResolver {
    /// Create a resolver over the given binary store and proxy config.
    pub fn new(
        store: Arc<dyn BinaryStore>,
        proxy_base: impl Into<String>,
        proxied_hosts: Vec<String>,
    ) -> Self {
        Self {
            store,
            proxy_base: proxy_base.into(),
            proxied_hosts,
        }
    }

    /// Resolve a variant (or nothing) to an ordered media URL list.
    #[tracing::instrument(skip_all)]
    pub fn resolve(&self, variant: Option<&PostVariant>) -> Vec<String> {
        let Some(variant) = variant else {
            return Vec::new();
        };
        self.resolve_items(variant.media())
    }

    /// Resolve an explicit item list to an ordered media URL list.
    pub fn resolve_items(&self, items: &[MediaItem]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| self.resolve_item(item))
            .map(|url| self.rewrite_proxied(url))
            .collect()
    }

    fn resolve_item(&self, item: &MediaItem) -> Option<String> {
        match item {
            MediaItem::UrlImage { url, .. } | MediaItem::UrlVideo { url, .. } => {
                if is_fetchable(url) {
                    Some(url.clone())
                } else {
                    tracing::debug!(url = %url, "Dropping media item with unfetchable URL");
                    None
                }
            }
            MediaItem::Image { file, .. } | MediaItem::Video { file, .. } => {
                if let Some(url) = self.store.url_for(file) {
                    return Some(url);
                }
                match item.source_url() {
                    Some(fallback) if is_fetchable(fallback) => {
                        tracing::debug!(file = %file, "Binary unresolvable, using sourceUrl fallback");
                        Some(fallback.to_string())
                    }
                    _ => {
                        tracing::warn!(file = %file, "Dropping unresolvable file-backed media item");
                        None
                    }
                }
            }
        }
    }

    /// Rewrite URLs on proxied hosts through the conversion proxy.
    fn rewrite_proxied(&self, url: String) -> String {
        let Some(host) = Url::parse(&url).ok().and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return url;
        };
        if self
            .proxied_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(&host))
        {
            format!("{}?url={}", self.proxy_base, urlencoding::encode(&url))
        } else {
            url
        }
    }
}

/// Whether a URL is http(s) and fetchable by platform APIs.
fn is_fetchable(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
