//! Core post, variant, and platform types for syndica.
//!
//! This crate defines the data model shared by the resolution,
//! publishing, and scheduling crates: the [`Post`] document with its
//! `base` variant and per-platform overrides, the [`MediaItem`] union,
//! the [`Platform`] alias table with per-platform constraints, and the
//! [`PublishRequest`] wire shape.

#![warn(missing_docs)]

mod media;
mod platform;
mod post;
mod request;
mod variant;

pub use media::MediaItem;
pub use platform::{Platform, canonical_options_key};
pub use post::{Post, PostBuilder, PostId};
pub use request::{PostData, PostDataBuilder, PublishRequest, PublishRequestBuilder};
pub use variant::{PostVariant, PostVariantBuilder, VariantStatus};
