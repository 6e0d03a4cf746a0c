//! Scheduling error types.

/// Specific error conditions for post scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ScheduleErrorKind {
    /// The post does not exist in the document store.
    #[display("Post '{_0}' not found in document store")]
    PostNotFound(String),
    /// The named platform has no variant on the post.
    #[display("Post '{post_id}' has no variant for platform '{platform}'")]
    VariantNotFound {
        /// Owning post identifier
        post_id: String,
        /// Platform alias
        platform: String,
    },
    /// The document store subscription has closed.
    #[display("Document store subscription closed for post '{_0}'")]
    SubscriptionClosed(String),
    /// A status write raced with a concurrent edit and was rejected.
    #[display("Concurrent edit rejected status write for post '{_0}'")]
    WriteConflict(String),
}

/// Error type for scheduling operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Schedule Error: {} at line {} in {}", kind, line, file)]
pub struct ScheduleError {
    kind: ScheduleErrorKind,
    line: u32,
    file: &'static str,
}

impl ScheduleError {
    /// Create a new ScheduleError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ScheduleErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ScheduleErrorKind {
        &self.kind
    }
}

impl<T> From<T> for ScheduleError
where
    T: Into<ScheduleErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
