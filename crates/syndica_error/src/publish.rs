//! Publish protocol error types.

/// Specific error conditions for container publishing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PublishErrorKind {
    /// No media URLs were available for a media-required platform.
    #[display("No images available for publishing")]
    NoMedia,
    /// The platform API rejected a request.
    #[display("Platform API error: {_0}")]
    Api(String),
    /// A container entered the error state while staging.
    #[display("Container '{container_id}' failed to become ready")]
    ContainerFailed {
        /// Platform-side container identifier
        container_id: String,
    },
    /// A container did not become ready within the configured bound.
    #[display("Container '{container_id}' timed out after {waited_secs}s")]
    ContainerTimedOut {
        /// Platform-side container identifier
        container_id: String,
        /// Seconds spent polling before giving up
        waited_secs: u64,
    },
    /// Transport-level HTTP failure.
    #[display("HTTP error: {_0}")]
    Http(String),
    /// The published item has no retrievable permalink.
    #[display("No permalink returned for published item '{_0}'")]
    MissingPermalink(String),
}

/// Error type for container publishing operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Publish Error: {} at line {} in {}", kind, line, file)]
pub struct PublishError {
    kind: PublishErrorKind,
    line: u32,
    file: &'static str,
}

impl PublishError {
    /// Create a new PublishError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PublishErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PublishErrorKind {
        &self.kind
    }

    /// Whether the failure is fatal for the attempt rather than transient.
    ///
    /// Fatal errors are reported to the caller and never retried
    /// automatically; transient errors demote the post back to a
    /// retryable state.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, PublishErrorKind::NoMedia)
    }
}

impl<T> From<T> for PublishError
where
    T: Into<PublishErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
