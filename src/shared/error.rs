use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - a catalog was produced (possibly with analyzer warnings)
    Success = 0,
    /// Application error (source resolution, cataloging, encoding, file I/O, etc.)
    ApplicationError = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::ApplicationError => write!(f, "Application Error (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
        }
    }
}

/// Application-specific errors for cataloging and document handling.
///
/// Uses thiserror to derive Display and Error traits automatically,
/// while keeping user-friendly messages with a hint line.
#[derive(Debug, Error)]
pub enum CatalogerError {
    #[error("Source unavailable: {input}\nReason: {reason}\n\n💡 Hint: Specify an existing directory (dir:PATH) or an image archive (docker-archive:PATH)")]
    SourceUnavailable { input: String, reason: String },

    #[error("Invalid scope '{scope}' for {scheme} source\n\n💡 Hint: Image sources accept 'squashed' or 'all-layers'")]
    InvalidScope { scope: String, scheme: String },

    #[error("Analyzer '{analyzer}' failed: {details}")]
    AnalyzerFailure { analyzer: String, details: String },

    #[error("Failed to decode document field '{field}': {details}")]
    DecodeError { field: String, details: String },

    #[error("Unsupported {format} schema version: {version}\n\n💡 Hint: Re-generate the document with a supported version of the tool")]
    UnsupportedSchema { format: String, version: String },

    #[error("Package {id} observed with conflicting {field}: kept '{existing}', ignored '{incoming}'")]
    DuplicateIdentityConflict {
        id: String,
        field: String,
        existing: String,
        incoming: String,
    },

    #[error("Relationship {kind} references unknown entity: {endpoint}")]
    DanglingRelationship { kind: String, endpoint: String },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Security violation: {path}\nReason: {reason}\n\n💡 Hint: {hint}")]
    SecurityError {
        path: PathBuf,
        reason: String,
        hint: String,
    },

    #[error("Invalid configuration: {message}\n\n💡 Hint: {hint}")]
    InvalidConfig { message: String, hint: String },
}

impl CatalogerError {
    /// Shorthand for a decode failure on a named document field
    pub fn decode(field: impl Into<String>, details: impl Into<String>) -> Self {
        CatalogerError::DecodeError {
            field: field.into(),
            details: details.into(),
        }
    }
}
