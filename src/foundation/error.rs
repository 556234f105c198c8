use std::sync::Arc;

/// Convenience result type used across framesmith.
pub type MediaResult<T> = Result<T, MediaError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// Unreadable or unsupported input image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Font file missing or not loadable.
    #[error("font error: {0}")]
    Font(String),

    /// Content type outside an explicit allow-list.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Caller-supplied key does not match the computed content hash.
    #[error("key mismatch: expected {expected}, computed {actual}")]
    KeyMismatch {
        /// Key supplied by the caller.
        expected: String,
        /// Key computed from the request bytes.
        actual: String,
    },

    /// I/O failure inside the content store.
    #[error("storage error: {0}")]
    Storage(String),

    /// Compositor failure.
    #[error("render error: {0}")]
    Render(String),

    /// Requested artifact or tier is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed frame description, arguments or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// One failure observed by several waiters of the same render.
    #[error(transparent)]
    Shared(Arc<MediaError>),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Flat classification of [`MediaError`], looking through shared failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`MediaError::Decode`].
    Decode,
    /// See [`MediaError::Font`].
    Font,
    /// See [`MediaError::UnsupportedFormat`].
    UnsupportedFormat,
    /// See [`MediaError::KeyMismatch`].
    KeyMismatch,
    /// See [`MediaError::Storage`].
    Storage,
    /// See [`MediaError::Render`].
    Render,
    /// See [`MediaError::NotFound`].
    NotFound,
    /// See [`MediaError::Validation`].
    Validation,
    /// See [`MediaError::Serde`].
    Serde,
    /// See [`MediaError::Other`].
    Other,
}

impl MediaError {
    /// Build a [`MediaError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MediaError::Font`] value.
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Build a [`MediaError::UnsupportedFormat`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`MediaError::Storage`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build a [`MediaError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MediaError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`MediaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MediaError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Classify this error, unwrapping [`MediaError::Shared`] layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Font(_) => ErrorKind::Font,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::KeyMismatch { .. } => ErrorKind::KeyMismatch,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Render(_) => ErrorKind::Render,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Serde(_) => ErrorKind::Serde,
            Self::Shared(inner) => inner.kind(),
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
