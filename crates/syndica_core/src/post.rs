//! The post document: a base variant plus per-platform overrides.

use crate::{Platform, PostVariant};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a post document.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{}", _0)]
pub struct PostId(pub String);

impl PostId {
    /// Generate a fresh random post id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One logical social post with per-platform variants.
///
/// The `base` variant always exists; a platform without an explicit
/// variant falls back to it. Variants are keyed by platform name as
/// authored, so `"x"` and `"twitter"` both address the Twitter variant.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct Post {
    /// Post identity.
    id: PostId,

    /// Human-facing title.
    #[builder(default)]
    #[serde(default)]
    title: String,

    /// Default content every platform falls back to.
    base: PostVariant,

    /// Per-platform overrides, keyed by platform alias.
    #[builder(default)]
    #[serde(default)]
    variants: BTreeMap<String, PostVariant>,
}

impl Post {
    /// Look up the saved variant for a platform, if one exists.
    ///
    /// Keys are compared through alias normalization, so a variant saved
    /// under `"x"` is found when asked for [`Platform::Twitter`].
    pub fn saved_variant(&self, platform: &Platform) -> Option<&PostVariant> {
        self.variants
            .iter()
            .find(|(alias, _)| Platform::from_alias(alias) == *platform)
            .map(|(_, variant)| variant)
    }

    /// The effective variant for a platform: saved override or base.
    pub fn variant_for(&self, platform: &Platform) -> &PostVariant {
        self.saved_variant(platform).unwrap_or(&self.base)
    }

    /// Mutable access to a platform's saved variant.
    pub fn saved_variant_mut(&mut self, platform: &Platform) -> Option<&mut PostVariant> {
        self.variants
            .iter_mut()
            .find(|(alias, _)| Platform::from_alias(alias) == *platform)
            .map(|(_, variant)| variant)
    }

    /// Insert or replace the saved variant for a platform alias.
    pub fn set_variant(&mut self, alias: impl Into<String>, variant: PostVariant) {
        self.variants.insert(alias.into(), variant);
    }

    /// Mutable access to the base variant.
    pub fn base_mut(&mut self) -> &mut PostVariant {
        &mut self.base
    }
}
