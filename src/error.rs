//! Error types for the translation engine

use thiserror::Error;

/// Errors surfaced by the translation engine
///
/// Degraded rendering is never reported through this type; see
/// [`crate::recompose::RecomposeStatus::Invalid`] for that.
#[derive(Error, Debug)]
pub enum I18nError {
    /// A corrupt or incompatible interchange artifact (bad escape, unknown location version)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A catalog file that could not be parsed
    #[error("malformed catalog '{file}' at line {line}: {detail}")]
    MalformedCatalog {
        file: String,
        line: usize,
        detail: String,
    },

    /// An upload referencing more than one locale
    #[error("upload mixes several locales: {}", .0.join(", "))]
    MixedLocales(Vec<String>),

    /// An upload from which no locale could be determined
    #[error("upload does not reference any locale")]
    MissingLocale,

    /// A bundle key string that does not have the `type:id:locale` shape
    #[error("invalid bundle key: '{0}'")]
    InvalidBundleKey(String),

    /// A locale tag that does not parse
    #[error("invalid locale: '{0}'")]
    InvalidLocale(String),

    /// The decompose/recompose collaborator failed
    #[error("markup collaborator failed: {0}")]
    Collaborator(String),

    /// Invalid engine configuration
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Result type for engine operations
pub type I18nResult<T> = Result<T, I18nError>;
