//! Resolution error types.

/// Specific error conditions for publish-request resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ResolveErrorKind {
    /// No target platforms were supplied.
    #[display("No platforms specified for publish request")]
    EmptyPlatforms,
    /// The profile key selecting the connected account set is missing.
    #[display("Missing profile key for publish request")]
    MissingProfileKey,
    /// A platform-specific option bag failed to deserialize.
    #[display("Invalid options for platform '{platform}': {message}")]
    InvalidOptions {
        /// Platform alias as requested
        platform: String,
        /// Deserialization failure message
        message: String,
    },
    /// The post has no base variant content to fall back to.
    #[display("Post '{_0}' has no publishable content")]
    EmptyPost(String),
}

/// Error type for resolution operations.
///
/// # Examples
///
/// ```
/// use syndica_error::{ResolveError, ResolveErrorKind};
///
/// let err = ResolveError::new(ResolveErrorKind::EmptyPlatforms);
/// assert!(format!("{}", err).contains("No platforms"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Resolve Error: {} at line {} in {}", kind, line, file)]
pub struct ResolveError {
    kind: ResolveErrorKind,
    line: u32,
    file: &'static str,
}

impl ResolveError {
    /// Create a new ResolveError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ResolveErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ResolveErrorKind {
        &self.kind
    }
}

impl<T> From<T> for ResolveError
where
    T: Into<ResolveErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
