//! Platform option-bag normalization and precedence merging.

use serde_json::{Map, Value};
use syndica_core::Platform;

/// Merges per-platform option bags across three precedence layers:
/// variant override, request-level base, environment-supplied default.
/// The merge is object-level; a higher layer wins outright, fields are
/// never combined across layers.
#[derive(Debug, Clone, Default)]
pub struct OptionsMapper {
    /// Environment-supplied defaults, canonically keyed.
    defaults: Map<String, Value>,
}

impl OptionsMapper {
    /// Create a mapper with environment defaults. Bare alias keys in the
    /// defaults are normalized on construction.
    pub fn new(mut defaults: Map<String, Value>) -> Self {
        Self::normalize_bag(&mut defaults);
        Self { defaults }
    }

    /// Rewrite bare platform-alias keys into canonical `{platform}Options`
    /// keys, removing the bare key.
    ///
    /// A key qualifies when it already ends in `Options`, or when it is a
    /// known platform alias carrying an object value. Unrelated scalar
    /// settings keep their keys. Alias stems also normalize, so
    /// `xOptions` becomes `twitterOptions`. When both a bare key and its
    /// canonical key are present, the canonical entry wins.
    pub fn normalize_bag(bag: &mut Map<String, Value>) {
        let keys: Vec<String> = bag.keys().cloned().collect();
        for key in keys {
            let stem = key.strip_suffix("Options").unwrap_or(&key);
            let platform = Platform::from_alias(stem);
            let is_bare_alias = !key.ends_with("Options")
                && !matches!(platform, Platform::Other(_))
                && bag.get(&key).is_some_and(Value::is_object);
            if !is_bare_alias && !key.ends_with("Options") {
                continue;
            }
            let canonical = platform.options_key();
            if canonical == key {
                continue;
            }
            let value = bag.remove(&key).unwrap_or(Value::Null);
            bag.entry(canonical).or_insert(value);
        }
    }

    /// Effective options object for a platform.
    ///
    /// Both bags are expected pre-normalized via [`Self::normalize_bag`].
    pub fn effective(
        &self,
        platform: &Platform,
        variant_bag: &Map<String, Value>,
        request_bag: &Map<String, Value>,
    ) -> Option<Value> {
        let key = platform.options_key();
        variant_bag
            .get(&key)
            .or_else(|| request_bag.get(&key))
            .or_else(|| self.defaults.get(&key))
            .cloned()
    }
}
