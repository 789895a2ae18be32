use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid date '{value}': expected ISO YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Unknown {field} label: '{value}'")]
    UnknownLabel { field: &'static str, value: String },

    #[error("Invoice {0} is marked paid but has no payment date")]
    MissingPaymentDate(String),

    #[error("A write to the data store is already in progress")]
    WriteInProgress,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
