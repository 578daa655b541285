/// Convenience result type used across the collage engine.
pub type CollageResult<T> = Result<T, CollageError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum CollageError {
    /// Invalid layout document, source image or user request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Upstream layout/background generator failure.
    #[error("generation error: {0}")]
    Generation(String),

    /// Rasterization or encoding failure while exporting.
    #[error("export error: {0}")]
    Export(String),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollageError {
    /// Build a [`CollageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CollageError::Generation`] value.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Build a [`CollageError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`CollageError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Re-tag any error raised inside an export as [`CollageError::Export`].
    pub(crate) fn into_export(self) -> Self {
        match self {
            Self::Export(_) => self,
            other => Self::Export(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CollageError {
    fn from(value: serde_json::Error) -> Self {
        Self::serde(value.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
