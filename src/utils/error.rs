use thiserror::Error;

#[derive(Error, Debug)]
pub enum GdtError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Spreadsheet export error: {message}")]
    SpreadsheetError { message: String },

    #[error("STEP parse error at statement {statement}: {message}")]
    ParseError { statement: usize, message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Parsing,
    Configuration,
    Output,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GdtError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GdtError::IoError(_) => ErrorCategory::Input,
            GdtError::ParseError { .. } => ErrorCategory::Parsing,
            GdtError::ConfigValidationError { .. }
            | GdtError::InvalidConfigValueError { .. }
            | GdtError::MissingConfigError { .. } => ErrorCategory::Configuration,
            GdtError::ZipError(_)
            | GdtError::CsvError(_)
            | GdtError::SerializationError(_)
            | GdtError::SpreadsheetError { .. } => ErrorCategory::Output,
            GdtError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GdtError::ParseError { .. } => ErrorSeverity::Medium,
            GdtError::ConfigValidationError { .. }
            | GdtError::InvalidConfigValueError { .. }
            | GdtError::MissingConfigError { .. }
            | GdtError::ProcessingError { .. } => ErrorSeverity::High,
            GdtError::IoError(_)
            | GdtError::ZipError(_)
            | GdtError::CsvError(_)
            | GdtError::SerializationError(_)
            | GdtError::SpreadsheetError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check that the input file exists and is readable",
            ErrorCategory::Parsing => {
                "Make sure the file is an ISO 10303-21 (STEP) exchange file with a DATA section"
            }
            ErrorCategory::Configuration => {
                "Review the command line flags and the TOML configuration file"
            }
            ErrorCategory::Output => {
                "Check that the output directory is writable and has free space"
            }
            ErrorCategory::Processing => "Re-run with --verbose to see which entity failed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GdtError::IoError(e) => format!("Could not read or write a file: {}", e),
            GdtError::ParseError { statement, message } => {
                format!("The STEP file could not be parsed (statement {}): {}", statement, message)
            }
            GdtError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            GdtError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GdtError>;
