//! Error types for raktkosh.
//!
//! This module defines all error types used throughout the raktkosh crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for raktkosh operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored slot held a value that could not be decoded.
    #[error("slot '{key}' holds malformed data: {source}")]
    SlotCorrupt {
        /// The slot key.
        key: &'static str,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Form Errors ===
    /// One or more required form fields were left empty.
    #[error("please fill all required fields: {}", fields.join(", "))]
    MissingFields {
        /// Names of the missing fields.
        fields: Vec<&'static str>,
    },

    /// A form field was present but malformed.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// Name of the field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The terms and conditions were not accepted.
    #[error("please agree to the terms and conditions")]
    TermsNotAccepted,

    /// A value could not be parsed from its text form.
    #[error("unrecognized {kind}: '{value}'")]
    Parse {
        /// What was being parsed.
        kind: &'static str,
        /// The offending input.
        value: String,
    },

    // === Session Errors ===
    /// An operation needs a stored profile and none exists.
    #[error("no donor profile found; register or sign in first")]
    NotRegistered,

    // === Directory and Ledger Errors ===
    /// No donor with the given id exists in the directory.
    #[error("donor not found: {0}")]
    DonorNotFound(String),

    /// The donor is not accepting requests.
    #[error("donor {0} is not available")]
    DonorUnavailable(String),

    /// The requester tried to ask their own directory entry.
    #[error("you cannot send a blood request to yourself")]
    SelfRequest,

    /// No blood request with the given id exists in the ledger.
    #[error("blood request not found: {0}")]
    RequestNotFound(u64),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for raktkosh operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid field error.
    #[must_use]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(kind: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            value: value.into(),
        }
    }

    /// Check if this error was caused by user input that can be corrected.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFields { .. }
                | Self::InvalidField { .. }
                | Self::TermsNotAccepted
                | Self::Parse { .. }
        )
    }

    /// Check if this error means no profile is stored.
    #[must_use]
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotRegistered;
        assert_eq!(
            err.to_string(),
            "no donor profile found; register or sign in first"
        );

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_missing_fields_display() {
        let err = Error::MissingFields {
            fields: vec!["full name", "email"],
        };
        assert_eq!(
            err.to_string(),
            "please fill all required fields: full name, email"
        );
    }

    #[test]
    fn test_invalid_field_display() {
        let err = Error::invalid_field("email", "missing '@'");
        let msg = err.to_string();
        assert!(msg.contains("email"));
        assert!(msg.contains("missing '@'"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("blood group", "Q+");
        assert_eq!(err.to_string(), "unrecognized blood group: 'Q+'");
    }

    #[test]
    fn test_is_validation_error() {
        assert!(Error::TermsNotAccepted.is_validation_error());
        assert!(Error::MissingFields { fields: vec![] }.is_validation_error());
        assert!(Error::parse("urgency", "x").is_validation_error());
        assert!(!Error::NotRegistered.is_validation_error());
        assert!(!Error::RequestNotFound(1).is_validation_error());
    }

    #[test]
    fn test_is_not_registered() {
        assert!(Error::NotRegistered.is_not_registered());
        assert!(!Error::TermsNotAccepted.is_not_registered());
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(
            Error::DonorNotFound("42".to_string()).to_string(),
            "donor not found: 42"
        );
        assert_eq!(
            Error::RequestNotFound(7).to_string(),
            "blood request not found: 7"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_self_request_display() {
        assert!(Error::SelfRequest.to_string().contains("yourself"));
        assert!(!Error::SelfRequest.is_validation_error());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_slot_corrupt_display() {
        let json_err = serde_json::from_str::<i32>("{").unwrap_err();
        let err = Error::SlotCorrupt {
            key: "user_profile",
            source: json_err,
        };
        assert!(err.to_string().contains("user_profile"));
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "donation_interval_days must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("donation_interval_days"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
