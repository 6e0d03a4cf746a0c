//! Cross-platform social post syndication.
//!
//! One post document with per-platform variants resolves into concrete
//! publish requests, publishes through the multi-step container
//! protocol, and moves through a scheduling state machine driven by a
//! per-post ticking task.
//!
//! The member crates are re-exported here so applications depend on
//! `syndica` alone.

#![warn(missing_docs)]

mod config;

pub use config::SyndicaConfig;

pub use syndica_core::{
    MediaItem, Platform, Post, PostBuilder, PostData, PostDataBuilder, PostId, PostVariant,
    PostVariantBuilder, PublishRequest, PublishRequestBuilder, VariantStatus,
    canonical_options_key,
};
pub use syndica_error::{
    ConfigError, PublishError, PublishErrorKind, ResolveError, ResolveErrorKind, ScheduleError,
    ScheduleErrorKind, SyndicaError, SyndicaResult,
};
pub use syndica_publish::{
    ContainerApi, ContainerPublisher, ContainerResult, ContainerStatus, GraphContainerApi,
    PublishedPost,
};
pub use syndica_resolve::{
    BinaryStore, EmptyBinaryStore, MediaResolver, OptionsMapper, RequestBuilder, ResolveRequest,
    ResolveRequestBuilder, ResolvedVariant, VariantOverride, VariantOverrideBuilder,
    VariantResolver,
};
pub use syndica_schedule::{
    DocumentStore, MemoryDocumentStore, PostScheduler, PostSnapshot, SchedulerTiming,
    VariantMutation,
};

/// Initialize tracing with an env-filter subscriber.
///
/// Reads `.env` first so `RUST_LOG` set there applies; defaults to
/// `info` when no filter is configured.
pub fn init_tracing() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
