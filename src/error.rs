//! Error types for confluence-sync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=config, 3=identity, 4=content, 5=remote, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for confluence-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the exit code, JSON consumers on the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (exit 2)
    ConfigError,
    InvalidPath,

    // Identity resolution (exit 3)
    MissingParent,

    // Content (exit 4)
    InvalidLink,
    DiagramError,

    // Remote (exit 5)
    RemoteError,
    HttpError,

    // I/O (exit 6)
    IoError,
    JsonError,

    // Partial success (exit 7)
    PartialFailure,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::InvalidPath => "INVALID_PATH",
            Self::MissingParent => "MISSING_PARENT",
            Self::InvalidLink => "INVALID_LINK",
            Self::DiagramError => "DIAGRAM_ERROR",
            Self::RemoteError => "REMOTE_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::PartialFailure => "PARTIAL_FAILURE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-7).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::ConfigError | Self::InvalidPath => 2,
            Self::MissingParent => 3,
            Self::InvalidLink | Self::DiagramError => 4,
            Self::RemoteError | Self::HttpError => 5,
            Self::IoError | Self::JsonError => 6,
            Self::PartialFailure => 7,
        }
    }

    /// Whether re-running the same command may succeed without changes.
    ///
    /// True for transport-level failures. Page creation is idempotent by
    /// title, so a whole-run retry never duplicates pages.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::HttpError | Self::RemoteError | Self::PartialFailure)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur while publishing Markdown to Confluence.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Expected a valid file or directory path; got: {}", path.display())]
    InvalidPath { path: PathBuf },

    #[error("Expected a parent page ID for Markdown file with no linked page: {}", path.display())]
    MissingParent { path: PathBuf },

    #[error("Unresolved link `{link}` in {}", path.display())]
    InvalidLink { path: PathBuf, link: String },

    #[error("Confluence returned HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Diagram rendering failed: {0}")]
    Diagram(String),

    #[error("{failed} of {total} page(s) failed to synchronize")]
    PartialFailure { failed: usize, total: usize },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidPath { .. } => ErrorCode::InvalidPath,
            Self::MissingParent { .. } => ErrorCode::MissingParent,
            Self::InvalidLink { .. } => ErrorCode::InvalidLink,
            Self::Remote { .. } => ErrorCode::RemoteError,
            Self::Http(_) => ErrorCode::HttpError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Diagram(_) => ErrorCode::DiagramError,
            Self::PartialFailure { .. } => ErrorCode::PartialFailure,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingParent { .. } => Some(
                "Pass `--root-page <ID>`, add an index.md or README.md linked to a page \
                 in a parent directory, or embed `<!-- confluence-page-id: ID -->` in the file."
                    .to_string(),
            ),

            Self::InvalidLink { .. } => Some(
                "Links to Markdown files must point at documents inside the synchronized tree. \
                 Use `--ignore-invalid-url` to render them as plain text instead."
                    .to_string(),
            ),

            Self::Remote { status: 401 | 403, .. } => Some(
                "Check CONFLUENCE_USER_NAME and CONFLUENCE_API_KEY.".to_string(),
            ),

            Self::Remote { status: 404, .. } => Some(
                "A page ID embedded in a document may refer to a deleted page or another space."
                    .to_string(),
            ),

            Self::Config(_) => Some(
                "Set CONFLUENCE_DOMAIN, CONFLUENCE_SPACE_KEY and CONFLUENCE_API_KEY, \
                 or add them to the config file."
                    .to_string(),
            ),

            Self::PartialFailure { .. } => {
                Some("Re-run the same command; already linked pages are reused.".to_string())
            }

            Self::InvalidPath { .. }
            | Self::Remote { .. }
            | Self::Http(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Diagram(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
