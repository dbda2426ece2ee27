use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

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

    #[error("Invalid term code: {code}")]
    InvalidTermCode { code: String },

    #[error("Term not found in catalog: {slug}")]
    UnknownTerm { slug: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

impl EnrollmentError {
    /// 傳輸層錯誤（網路、逾時）不在本地復原，直接回傳給呼叫端
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, EnrollmentError>;
