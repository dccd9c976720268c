/// Error type produced by a backend while handling a record.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by adapters, builders and the front-end.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The backend declined the write at this severity. Routine filtering,
    /// not a failure.
    #[error("logging is disabled for this level")]
    Disabled,

    /// The backend's write entry point failed; the original error is kept.
    #[error(transparent)]
    Backend(BoxError),

    /// A builder was finished without its required backend handle.
    #[error("missing backend: {0}")]
    MissingBackend(&'static str),

    #[error("invalid level: {0:?}")]
    InvalidLevel(String),

    /// Installing the global subscriber failed.
    #[error("tracing init failed: {0}")]
    Init(String),
}

impl Error {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Backend(err.into())
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Error::Disabled)
    }
}
