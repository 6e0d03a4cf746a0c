//! Target platform identities, aliases, and per-platform constraints.

use std::str::FromStr;

/// Maximum media attachments for platforms with a four-item limit.
const FOUR_ITEM_MEDIA_CAP: usize = 4;

/// A social platform a post can be published to.
///
/// Aliases are case-insensitive; `"x"` resolves to [`Platform::Twitter`].
/// Unrecognized names are preserved as [`Platform::Other`] so a platform
/// this library has no table entry for still resolves and publishes.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    /// Instagram (container-based publishing).
    Instagram,
    /// X, formerly Twitter. The options key stays `twitterOptions`.
    #[strum(serialize = "twitter", serialize = "x")]
    Twitter,
    /// Bluesky.
    Bluesky,
    /// Reddit.
    Reddit,
    /// Pinterest.
    Pinterest,
    /// Facebook.
    Facebook,
    /// TikTok.
    Tiktok,
    /// LinkedIn.
    Linkedin,
    /// YouTube.
    Youtube,
    /// Telegram.
    Telegram,
    /// Any platform without a dedicated table entry.
    #[strum(default)]
    Other(String),
}

impl Platform {
    /// Resolve a platform name or alias to its canonical platform.
    pub fn from_alias(alias: &str) -> Self {
        // The `default` variant makes parsing infallible.
        Self::from_str(alias.trim().to_lowercase().as_str())
            .unwrap_or_else(|_| Self::Other(alias.trim().to_lowercase()))
    }

    /// Canonical key for this platform's option bag, e.g. `twitterOptions`.
    pub fn options_key(&self) -> String {
        format!("{}Options", self)
    }

    /// Maximum media attachments per post, if the platform caps them.
    pub fn media_cap(&self) -> Option<usize> {
        match self {
            Platform::Twitter | Platform::Bluesky => Some(FOUR_ITEM_MEDIA_CAP),
            _ => None,
        }
    }
}

/// Normalize a bare alias into the canonical options key.
///
/// # Examples
///
/// ```
/// use syndica_core::canonical_options_key;
///
/// assert_eq!(canonical_options_key("x"), "twitterOptions");
/// assert_eq!(canonical_options_key("reddit"), "redditOptions");
/// assert_eq!(canonical_options_key("mastodon"), "mastodonOptions");
/// ```
pub fn canonical_options_key(alias: &str) -> String {
    Platform::from_alias(alias).options_key()
}
