//! Error types for code generation

use thiserror::Error;

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Fatal codegen errors.
///
/// Anything recoverable during resolution (missing response schema, extra
/// body parameters, dangling references) is reported through
/// [`crate::codegen::Diagnostics`] instead and never surfaces here.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Unsupported document version: {0} (only Swagger 2.x is resolved)")]
    UnsupportedVersion(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}
