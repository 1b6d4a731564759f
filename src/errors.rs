/*!
 * Error types for the course-localizer application.
 *
 * This module contains custom error types for the different parts of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 * Failures coming back from external services are classified as transient
 * (retried) or fatal (propagated immediately).
 */

use std::time::Duration;
use thiserror::Error;

/// Malformed input or missing directory structure. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Version folder name does not match `vNNN`
    #[error("Invalid version string: '{0}' (expected v followed by 3 digits)")]
    MalformedVersion(String),

    /// Version number would not fit in three digits
    #[error("Version {0} cannot be incremented past v999")]
    VersionOverflow(String),

    /// A directory the pipeline depends on does not exist
    #[error("Required directory not found: {0}")]
    MissingDirectory(String),

    /// Voice tag with no registered synthesis voice
    #[error("Unknown voice tag: '{0}'")]
    UnknownVoice(String),

    /// Language code not present in the registry
    #[error("Unknown language code: '{0}'")]
    UnknownLanguage(String),

    /// Artifact filename that does not follow the naming schema
    #[error("Malformed artifact filename: '{0}'")]
    MalformedArtifactName(String),

    /// Chapter with neither slide images nor narration to assemble
    #[error("Nothing to assemble in {0}")]
    EmptyChapter(String),
}

/// Kinds of failure worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// HTTP 429 or equivalent throttling
    RateLimit,
    /// Request timed out before a response arrived
    Timeout,
    /// Upstream 5xx or unreachable service
    UpstreamServer,
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "rate limited"),
            Self::Timeout => write!(f, "timeout"),
            Self::UpstreamServer => write!(f, "upstream server error"),
        }
    }
}

/// Errors returned by an external collaborator (translation, speech,
/// transcription, rasterizer, media tool)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Failure that may succeed on a later attempt
    #[error("Transient service error ({kind}): {message}")]
    Transient {
        /// Classification of the failure
        kind: TransientKind,
        /// Message from the service
        message: String,
    },

    /// Failure that will not go away by retrying
    #[error("Fatal service error: {0}")]
    Fatal(String),
}

impl ServiceError {
    /// Create a transient error
    pub fn transient(kind: TransientKind, message: impl Into<String>) -> Self {
        Self::Transient { kind, message: message.into() }
    }

    /// Create a fatal error
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Whether the retry loop should try again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classify an HTTP status code returned by a service
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => Self::transient(TransientKind::RateLimit, format!("{}: {}", status, body)),
            408 | 504 => Self::transient(TransientKind::Timeout, format!("{}: {}", status, body)),
            500..=599 => Self::transient(TransientKind::UpstreamServer, format!("{}: {}", status, body)),
            _ => Self::fatal(format!("{}: {}", status, body)),
        }
    }

    /// Classify a transport error from the HTTP client
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::transient(TransientKind::Timeout, error.to_string())
        } else if error.is_connect() {
            Self::transient(TransientKind::UpstreamServer, error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), &error.to_string())
        } else {
            Self::fatal(error.to_string())
        }
    }
}

/// All retry attempts failed with transient errors
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Service still failing after {attempts} attempts (waited {waited:?}): {last_cause}")]
pub struct ServiceExhaustedError {
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent sleeping between attempts
    pub waited: Duration,
    /// The error returned by the final attempt
    #[source]
    pub last_cause: ServiceError,
}

/// Outcome of a call that went through the retry loop
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetryError {
    /// A non-retryable failure, raised on the attempt that produced it
    #[error("{0}")]
    Fatal(ServiceError),

    /// Transient failures on every attempt
    #[error(transparent)]
    Exhausted(#[from] ServiceExhaustedError),
}

impl RetryError {
    /// The underlying service error
    pub fn cause(&self) -> &ServiceError {
        match self {
            Self::Fatal(e) => e,
            Self::Exhausted(e) => &e.last_cause,
        }
    }
}

/// Image/audio counts that neither pairing policy accepts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Mismatch between slide images ({images}) and narration audio files ({audio})")]
pub struct MismatchError {
    /// Number of image files found
    pub images: usize,
    /// Number of audio files found
    pub audio: usize,
}

/// Terminal translation failure
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The translation service gave up
    #[error("Translation failed: {0}")]
    Service(#[from] RetryError),

    /// The document could not be read or rewritten
    #[error("Document error: {0}")]
    Document(String),
}

/// Terminal transcription failure
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// The transcription service gave up
    #[error("Transcription failed: {0}")]
    Service(#[from] RetryError),

    /// Splitting an oversized recording failed
    #[error("Audio segmentation failed: {0}")]
    Segmentation(ServiceError),
}

/// Main pipeline error type that wraps all other errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed input or missing structure
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Direct collaborator failure (not retried)
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Collaborator failure after the retry loop
    #[error("Service call failed: {0}")]
    Retry(#[from] RetryError),

    /// Image/audio count mismatch while assembling a chapter
    #[error("Assembly error: {0}")]
    Mismatch(#[from] MismatchError),

    /// Translation failure
    #[error("{0}")]
    Translation(#[from] TranslationError),

    /// Transcription failure
    #[error("{0}")]
    Transcription(#[from] TranscriptionError),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ServiceExhaustedError> for PipelineError {
    fn from(error: ServiceExhaustedError) -> Self {
        Self::Retry(RetryError::Exhausted(error))
    }
}
