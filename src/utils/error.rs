use thiserror::Error;

/// Failures reported by a document-store adapter.
///
/// The repository never lets these escape unclassified: "no document" conditions become
/// [`BankError::NotFound`] and everything else is wrapped in [`BankError::DatabaseError`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key: swiftCode {key} already exists")]
    DuplicateKey { key: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("blocking store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("store backend error: {message}")]
    Backend { message: String },

    #[error("store call cancelled before it committed")]
    Cancelled,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Invalid {field} format: {value} ({reason})")]
    InvalidFormat {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    AlreadyExists { message: String },

    #[error("Database error during {operation}: {source}")]
    DatabaseError {
        operation: String,
        #[source]
        source: StoreError,
    },

    #[error("Database operation {operation} exceeded its deadline")]
    Timeout { operation: String },

    #[error("Response formatting error: {message}")]
    FormattingError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Spreadsheet request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Import failed: {message}")]
    ImportError { message: String },
}

/// Coarse classification used for HTTP status mapping and process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    NotFound,
    Conflict,
    Storage,
    Internal,
    Configuration,
}

impl BankError {
    pub fn invalid_format(field: &str, value: &str, reason: impl Into<String>) -> Self {
        BankError::InvalidFormat {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BankError::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        BankError::NotFound {
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        BankError::AlreadyExists {
            message: message.into(),
        }
    }

    pub fn database(operation: &str, source: StoreError) -> Self {
        BankError::DatabaseError {
            operation: operation.to_string(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BankError::InvalidFormat { .. } | BankError::ValidationError { .. } => {
                ErrorCategory::Client
            }
            BankError::NotFound { .. } => ErrorCategory::NotFound,
            BankError::AlreadyExists { .. } => ErrorCategory::Conflict,
            BankError::DatabaseError { .. } | BankError::Timeout { .. } => ErrorCategory::Storage,
            BankError::ConfigError { .. } | BankError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            BankError::FormattingError { .. }
            | BankError::ApiError(_)
            | BankError::CsvError(_)
            | BankError::IoError(_)
            | BankError::SerializationError(_)
            | BankError::ImportError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BankError::InvalidFormat { .. } => {
                "SWIFT codes must be 8 or 11 uppercase letters/digits and country codes 2 uppercase letters"
            }
            BankError::ValidationError { .. } => {
                "Make sure isHeadquarter agrees with the XXX suffix of the SWIFT code"
            }
            BankError::NotFound { .. } => "Check the SWIFT code or country code and try again",
            BankError::AlreadyExists { .. } => "Delete the existing entry first or use another code",
            BankError::DatabaseError { .. } => "Check that the database file is reachable and writable",
            BankError::Timeout { .. } => "Retry later or raise the configured timeout",
            BankError::ConfigError { .. } | BankError::InvalidConfigValueError { .. } => {
                "Review the configuration file and environment variables"
            }
            BankError::ApiError(_) => "Check network access and the spreadsheet identifier",
            BankError::CsvError(_) => "Make sure the source exports CSV with the expected columns",
            BankError::ImportError { .. } => "Fix the reported rows in the source data and re-run the import",
            _ => "Check the logs for more details",
        }
    }
}

pub type Result<T> = std::result::Result<T, BankError>;
