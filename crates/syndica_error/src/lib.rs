//! Error types for the syndica publishing library.
//!
//! Each domain gets a `Kind` enum describing the specific condition and
//! an error struct that captures the source location of the failure via
//! `#[track_caller]`. The [`SyndicaError`] umbrella converts from every
//! domain error for callers that cross crate boundaries.

#![warn(missing_docs)]

mod config;
mod publish;
mod resolve;
mod schedule;

pub use config::ConfigError;
pub use publish::{PublishError, PublishErrorKind};
pub use resolve::{ResolveError, ResolveErrorKind};
pub use schedule::{ScheduleError, ScheduleErrorKind};

/// Umbrella error for operations that span domains.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SyndicaError {
    /// Publish-request resolution failure.
    Resolve(ResolveError),
    /// Container publishing failure.
    Publish(PublishError),
    /// Scheduling failure.
    Schedule(ScheduleError),
    /// Configuration failure.
    Config(ConfigError),
}

/// Result alias for fallible syndica operations.
pub type SyndicaResult<T> = Result<T, SyndicaError>;
