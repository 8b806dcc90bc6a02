//! Error types for Kino DASH

use crate::types::MediaType;
use thiserror::Error;

/// Result type alias for representation controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Controller error types
#[derive(Error, Debug)]
pub enum Error {
    // Lifecycle errors
    #[error("Representation controller used before initialize")]
    NotInitialized,

    #[error("Representation controller already initialized")]
    AlreadyInitialized,

    #[error("Media type mismatch: controller handles {expected}, got {actual}")]
    MediaTypeMismatch { expected: MediaType, actual: MediaType },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Manifest errors
    #[error("Invalid manifest format: {0}")]
    InvalidManifest(String),

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error("Failed to resolve adaptation set: {0}")]
    Resolution(#[from] ResolutionError),
}

impl Error {
    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Resolution(_))
    }

    /// Returns the error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::NotInitialized => "NOT_INITIALIZED",
            Error::AlreadyInitialized => "ALREADY_INITIALIZED",
            Error::MediaTypeMismatch { .. } => "MEDIA_TYPE_MISMATCH",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidManifest(_) => "INVALID_MANIFEST",
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            Error::Resolution(e) => e.error_code(),
        }
    }
}

/// Failure to turn an adaptation set fragment into a representation set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No manifest loaded")]
    NoManifest,

    #[error("Period {0} not found in manifest")]
    UnknownPeriod(usize),

    #[error("Adaptation set {id:?} not found in period {period_index}")]
    AdaptationNotInManifest { id: Option<String>, period_index: usize },

    #[error("Adaptation set has no representations")]
    NoRepresentations,

    #[error("Representation {id} has no bandwidth")]
    MissingBandwidth { id: String },

    #[error("Invalid BaseURL for representation {id}: {reason}")]
    InvalidBaseUrl { id: String, reason: String },

    #[error("Adaptation set declares {declared} content, requested as {requested}")]
    MediaTypeMismatch { declared: MediaType, requested: MediaType },

    #[error("Invalid SegmentTemplate for representation {id}: {reason}")]
    InvalidSegmentTemplate { id: String, reason: String },

    #[error("Time source unavailable: {0}")]
    TimeSource(String),

    #[error("Adapter panicked: {0}")]
    AdapterPanicked(String),
}

impl ResolutionError {
    /// Returns the error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            ResolutionError::NoManifest => "NO_MANIFEST",
            ResolutionError::UnknownPeriod(_) => "UNKNOWN_PERIOD",
            ResolutionError::AdaptationNotInManifest { .. } => "ADAPTATION_NOT_FOUND",
            ResolutionError::NoRepresentations => "NO_REPRESENTATIONS",
            ResolutionError::MissingBandwidth { .. } => "MISSING_BANDWIDTH",
            ResolutionError::InvalidBaseUrl { .. } => "INVALID_BASE_URL",
            ResolutionError::MediaTypeMismatch { .. } => "CONTENT_TYPE_MISMATCH",
            ResolutionError::InvalidSegmentTemplate { .. } => "INVALID_SEGMENT_TEMPLATE",
            ResolutionError::TimeSource(_) => "TIME_SOURCE",
            ResolutionError::AdapterPanicked(_) => "ADAPTER_PANICKED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_errors_are_recoverable() {
        let err: Error = ResolutionError::NoRepresentations.into();
        assert!(err.is_recoverable());
        assert_eq!(err.error_code(), "NO_REPRESENTATIONS");
    }

    #[test]
    fn test_precondition_errors_are_fatal() {
        let err = Error::MediaTypeMismatch {
            expected: MediaType::Video,
            actual: MediaType::Audio,
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Media type mismatch: controller handles video, got audio");
        assert!(!Error::NotInitialized.is_recoverable());
    }
}
