use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to fetch {url}: {reason}")]
    FetchError { url: String, reason: String },

    #[error("Unexpected page structure: {message}")]
    StructureError { message: String },

    #[error("No records to write, cannot derive a CSV header")]
    EmptyDatasetError,

    #[error("Output directory does not exist: {path}")]
    PathError { path: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Parsing,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScrapeError {
    pub fn structure(message: impl Into<String>) -> Self {
        Self::StructureError {
            message: message.into(),
        }
    }

    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchError {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FetchError { .. } => ErrorCategory::Network,
            Self::StructureError { .. } => ErrorCategory::Parsing,
            Self::EmptyDatasetError
            | Self::PathError { .. }
            | Self::CsvError(_)
            | Self::IoError(_) => ErrorCategory::Output,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 空結果只是「沒有資料」，不是失敗
            Self::EmptyDatasetError => ErrorSeverity::Low,
            Self::FetchError { .. } => ErrorSeverity::Medium,
            Self::StructureError { .. }
            | Self::PathError { .. }
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::High,
            Self::CsvError(_) | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Errors a single municipality may raise without aborting the run.
    pub fn is_recoverable_per_town(&self) -> bool {
        matches!(
            self,
            Self::FetchError { .. } | Self::StructureError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::FetchError { url, .. } => format!("Could not download page {}", url),
            Self::StructureError { message } => {
                format!("The page does not have the expected layout ({})", message)
            }
            Self::EmptyDatasetError => "No election data was found, nothing was saved".to_string(),
            Self::PathError { path } => format!("Output directory '{}' does not exist", path),
            Self::CsvError(e) => format!("Failed to write CSV output: {}", e),
            Self::IoError(e) => format!("File system error: {}", e),
            Self::ConfigError { message } => format!("Invalid configuration: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid value for {}: {}", field, reason)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::FetchError { .. } => "Check your network connection and that the URL is reachable",
            Self::StructureError { .. } => {
                "Make sure the URL points to a volby.cz listing or municipality page"
            }
            Self::EmptyDatasetError => "Check that the listing URL contains municipality links",
            Self::PathError { .. } => "Create the output directory first or choose another path",
            Self::CsvError(_) | Self::IoError(_) => {
                "Check disk space and write permissions for the output path"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Review the command line arguments and the TOML settings file"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
