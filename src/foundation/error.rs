/// Convenience result type used across strata.
pub type StrataResult<T> = Result<T, StrataError>;

/// Top-level error taxonomy used by document and compositing APIs.
#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    /// Non-positive or mismatched dimensions, or non-finite placement.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A layer lookup by ID or name produced no match.
    #[error("not found: {0}")]
    NotFound(String),

    /// A blend-mode name outside the supported set.
    #[error("unsupported blend mode: {0}")]
    UnsupportedBlendMode(String),

    /// Layer image data that is absent or has the wrong shape.
    #[error("malformed layer image: {0}")]
    MalformedLayerImage(String),

    /// Invalid user-provided document or record data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrataError {
    /// Build a [`StrataError::InvalidGeometry`] value.
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Build a [`StrataError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`StrataError::UnsupportedBlendMode`] value.
    pub fn unsupported_blend_mode(msg: impl Into<String>) -> Self {
        Self::UnsupportedBlendMode(msg.into())
    }

    /// Build a [`StrataError::MalformedLayerImage`] value.
    pub fn malformed_image(msg: impl Into<String>) -> Self {
        Self::MalformedLayerImage(msg.into())
    }

    /// Build a [`StrataError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StrataError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
