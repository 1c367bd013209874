use thiserror::Error;

/// Call-level error for conversion operations.
///
/// Malformed elements never surface here; they become nulls in the output column.
/// A `ConvertError` means the whole call failed before any column was produced.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Arrow errors from array construction
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// The input or target data type is not handled by the operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid argument errors (empty literals, empty patterns, bad configuration)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed timestamp format pattern
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// The allocator refused an output buffer
    #[error("Allocation of {requested} bytes exceeds the remaining budget of {remaining} bytes")]
    AllocationExhausted { requested: usize, remaining: usize },

    /// Execution substrate failures (thread pool construction, disconnected streams)
    #[error("Execution error: {0}")]
    Execution(String),

    /// Array downcast errors
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create a new unsupported operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        ConvertError::Unsupported(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ConvertError::InvalidArgument(msg.into())
    }

    /// Create a new pattern error
    pub fn pattern<S: Into<String>>(msg: S) -> Self {
        ConvertError::Pattern(msg.into())
    }

    /// Create a new execution error
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        ConvertError::Execution(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        ConvertError::Conversion(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ConvertError::Internal(msg.into())
    }
}

impl From<rayon::ThreadPoolBuildError> for ConvertError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ConvertError::Execution(err.to_string())
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ConvertError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            ConvertError::Internal(format!("{}: {}", ctx.into(), base_error))
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            ConvertError::Internal(format!("{}: {}", f().into(), base_error))
        })
    }
}
