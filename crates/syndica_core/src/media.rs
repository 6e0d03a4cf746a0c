//! Media attachment shapes stored on post variants.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

/// One media attachment on a variant.
///
/// Items arrive in four shapes: direct-URL image/video, and file-backed
/// image/video whose opaque reference is resolved to a fetchable URL at
/// publish time. Every shape may carry a `sourceUrl` fallback. A legacy
/// shape with a bare `url` field and no `type` tag deserializes as a
/// direct-URL image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum MediaItem {
    /// Image fetched from a direct URL.
    UrlImage {
        /// Direct URL to the image bytes
        url: String,
        /// Fallback URL if the primary is unusable
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_url: Option<String>,
    },
    /// Video fetched from a direct URL.
    UrlVideo {
        /// Direct URL to the video bytes
        url: String,
        /// Fallback URL if the primary is unusable
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_url: Option<String>,
    },
    /// Image backed by a stored binary, resolved to a URL at publish time.
    Image {
        /// Opaque reference to the binary-backed file resource
        file: String,
        /// Fallback URL if the reference cannot be resolved
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_url: Option<String>,
    },
    /// Video backed by a stored binary, resolved to a URL at publish time.
    Video {
        /// Opaque reference to the binary-backed file resource
        file: String,
        /// Fallback URL if the reference cannot be resolved
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_url: Option<String>,
    },
}

impl MediaItem {
    /// Fallback URL carried alongside the primary reference, if any.
    pub fn source_url(&self) -> Option<&str> {
        match self {
            MediaItem::UrlImage { source_url, .. }
            | MediaItem::UrlVideo { source_url, .. }
            | MediaItem::Image { source_url, .. }
            | MediaItem::Video { source_url, .. } => source_url.as_deref(),
        }
    }

    /// Whether the item must be resolved through the binary store.
    pub fn is_file_backed(&self) -> bool {
        matches!(self, MediaItem::Image { .. } | MediaItem::Video { .. })
    }
}

fn string_field(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

impl<'de> Deserialize<'de> for MediaItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let obj = value
            .as_object()
            .ok_or_else(|| D::Error::custom("media item must be an object"))?;
        let source_url = string_field(obj, "sourceUrl");

        let require = |key: &str| {
            string_field(obj, key)
                .ok_or_else(|| D::Error::custom(format!("media item missing '{key}' field")))
        };

        match obj.get("type").and_then(|v| v.as_str()) {
            Some("url-image") => Ok(MediaItem::UrlImage {
                url: require("url")?,
                source_url,
            }),
            Some("url-video") => Ok(MediaItem::UrlVideo {
                url: require("url")?,
                source_url,
            }),
            Some("image") => Ok(MediaItem::Image {
                file: require("file")?,
                source_url,
            }),
            Some("video") => Ok(MediaItem::Video {
                file: require("file")?,
                source_url,
            }),
            Some(other) => Err(D::Error::custom(format!(
                "unknown media item type '{other}'"
            ))),
            // Legacy shape: a bare direct-URL field with no type tag.
            None => Ok(MediaItem::UrlImage {
                url: require("url")?,
                source_url,
            }),
        }
    }
}
