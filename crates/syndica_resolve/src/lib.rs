//! Publish-request resolution for syndica.
//!
//! Turns a post snapshot plus a publish request (base payload and
//! optional per-platform overrides) into concrete, validated,
//! per-platform publish descriptors: effective text, a resolved and
//! capped media URL list, and canonically-keyed option bags merged with
//! override > request > default precedence.

#![warn(missing_docs)]

mod builder;
mod media;
mod options;
mod variant;

pub use builder::RequestBuilder;
pub use media::{BinaryStore, EmptyBinaryStore, MediaResolver};
pub use options::OptionsMapper;
pub use variant::{
    ResolveRequest, ResolveRequestBuilder, ResolvedVariant, VariantOverride,
    VariantOverrideBuilder, VariantResolver,
};
