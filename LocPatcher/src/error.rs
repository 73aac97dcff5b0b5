//! Error types for `LocPatcher`

use thiserror::Error;

/// The error type for `LocPatcher` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Patch Parsing Errors ====================
    /// A line of a text patch is malformed (missing `->` or `:`).
    #[error("parse error on line {line}: {reason}")]
    Parse {
        /// 1-based line number within the patch text.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The operation alias does not resolve to any term operation.
    #[error("unsupported term operation `{operation}`")]
    UnsupportedOperation {
        /// The alias as it appeared in the patch.
        operation: String,
    },

    /// A patch term was constructed with empty content.
    #[error("term `{key}` has empty content")]
    EmptyTermContent {
        /// Key of the rejected term.
        key: String,
    },

    /// An `OnFlag` patch was constructed without a flag name.
    #[error("missing flag for patch `{patch}` that must be triggered by a specific flag")]
    MissingFlag {
        /// Name of the patch.
        patch: String,
    },

    // ==================== Compile Errors ====================
    /// The term key is not part of the known key universe.
    #[error("term key `{key}` is invalid")]
    InvalidKey {
        /// The unknown key.
        key: String,
    },

    /// No registered patch has this name.
    #[error("patch `{patch}` not found")]
    PatchNotFound {
        /// The requested patch name.
        patch: String,
    },

    // ==================== Store Errors ====================
    /// The language is not present in the store.
    #[error("language `{language}` not found")]
    LanguageNotFound {
        /// The requested language name.
        language: String,
    },

    /// A language slot index is outside the store's language list.
    #[error("language index {index} out of range ({count} languages)")]
    LanguageIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of languages in the store.
        count: usize,
    },

    // ==================== Serialization Errors ====================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDir(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDir(err.to_string())
    }
}

/// A specialized Result type for `LocPatcher` operations.
pub type Result<T> = std::result::Result<T, Error>;
