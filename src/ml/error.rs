//! Error types for the prediction pipelines

use crate::error::AppError;

/// Result type for pipeline operations
pub type MlResult<T> = std::result::Result<T, MlError>;

/// Errors raised while building features, training or evaluating a model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MlError {
    /// Too few rows to split into training and evaluation sets
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Fit failure or non-finite predictions/metrics
    #[error("Model training failed: {0}")]
    ModelTraining(String),

    /// A required field is missing, non-numeric or non-finite
    #[error("Feature schema error: {0}")]
    FeatureSchema(String),

    /// Records that break the one-row-per-district contract
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Hyperparameters or pipeline settings out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<MlError> for AppError {
    fn from(err: MlError) -> Self {
        match err {
            MlError::InsufficientData(msg) => AppError::InsufficientData(msg),
            MlError::ModelTraining(msg) => AppError::ModelTraining(msg),
            MlError::FeatureSchema(msg) => AppError::FeatureSchema(msg),
            MlError::InvalidSnapshot(msg) => AppError::Dataset(msg),
            MlError::InvalidConfiguration(msg) => AppError::Configuration(msg),
        }
    }
}
